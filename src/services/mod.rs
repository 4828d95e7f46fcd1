// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod catalog_service;
pub mod import_service;
pub mod loader_service;
pub mod media_stream;
pub mod search;
pub mod token_service;


#[cfg(test)]
pub mod test_support;

// Re-export all services and their types
pub use catalog_service::{
    Catalog,
    CatalogOptions,
};

pub use token_service::TokenCatalog;

pub use media_stream::{
    MediaStream,
    StreamPull,
    StreamState,
};

pub use loader_service::{
    Loader,
    StreamHandle,
};

pub use import_service::{
    ImportRequest,
    MediaImporter,
};

pub use search::{
    close_matches,
    ratio,
    CorpusSource,
    ScoredMapStrategy,
    ScoredTokenStrategy,
    SearchCorpus,
    SearchStrategy,
    Searcher,
    TagCutoffStrategy,
};
