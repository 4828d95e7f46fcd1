// src/lib.rs
// MapVault - Local library of animated battle maps and overlay tokens
//
// Architecture:
// - Domain-centric: asset records and their text rules live in the domain
// - Event-driven: the catalog announces changes, the loader reacts
// - Explicit: every component is wired by hand in AppState, no globals
// - Local-first: one JSON catalog file and plain media files on disk
// - Application Layer: CLI boundary

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain Records
// ============================================================================

pub use domain::{
    normalize_name,
    normalize_tag,
    tag_words,
    title_case,
    validate_map_asset,
    validate_token_asset,
    DomainError,
    MapAsset,
    MapEntry,
    TokenAsset,
    TokenEntry,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::LibraryConfig;

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    // Catalog events
    AssetAdded,
    AssetRemoved,
    AssetRenamed,
    AssetTagsChanged,
    CatalogLoaded,
    DomainEvent,
    EventBus,
    EventLogEntry,
    FavoriteChanged,
    MediaImported,
    // Stream events
    StreamActivated,
    StreamReleased,
};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{CatalogStore, JsonCatalogStore};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Catalogs
    Catalog,
    CatalogOptions,
    TokenCatalog,

    // Search
    CorpusSource,
    ScoredMapStrategy,
    ScoredTokenStrategy,
    SearchCorpus,
    SearchStrategy,
    Searcher,
    TagCutoffStrategy,

    // Streaming
    Loader,
    MediaStream,
    StreamHandle,
    StreamPull,
    StreamState,

    // Import
    ImportRequest,
    MediaImporter,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{AppState, MapRanking};

// Re-export application submodules
pub use application::commands;
pub use application::dto;

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{
    DecoderFactory, FfmpegDecoderFactory, FrameDecoder, NoThesaurus, Thesaurus, WordListThesaurus,
};
