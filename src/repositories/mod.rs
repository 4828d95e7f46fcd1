// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - Whole-snapshot writes only

pub mod catalog_store;

pub use catalog_store::{CatalogStore, JsonCatalogStore};

#[cfg(test)]
pub use catalog_store::MockCatalogStore;
