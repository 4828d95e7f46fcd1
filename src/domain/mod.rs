// src/domain/mod.rs
//
// Domain Root
//
// Asset records and the text rules (title-cased names, lower-cased tags)
// every other layer relies on. No IO happens in here.

pub mod asset;

pub use asset::{
    ascii_clean, normalize_name, normalize_tag, resolve_path, tag_words, title_case, tokenize,
    validate_map_asset, validate_token_asset, MapAsset, MapEntry, TokenAsset, TokenEntry,
};

use thiserror::Error;

/// Domain-level errors
/// These represent violations of record invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Empty name")]
    EmptyName,
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
