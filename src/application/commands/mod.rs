// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the CLI and Services
// - Commands accept plain arguments, return DTOs
// - Commands NEVER contain business logic

pub mod map_commands;
pub mod stream_commands;
pub mod token_commands;

#[cfg(test)]
mod fixture;

pub use map_commands::*;
pub use stream_commands::*;
pub use token_commands::*;

/// Negative limits mean "everything"
pub fn search_limit(limit: i64) -> Option<usize> {
    usize::try_from(limit).ok()
}
