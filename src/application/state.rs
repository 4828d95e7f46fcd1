// src/application/state.rs

use std::sync::Arc;

use crate::config::LibraryConfig;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::integrations::{DecoderFactory, Thesaurus};
use crate::repositories::{CatalogStore, JsonCatalogStore};
use crate::services::{
    Catalog, CatalogOptions, CorpusSource, Loader, MediaImporter, ScoredMapStrategy,
    ScoredTokenStrategy, SearchStrategy, Searcher, TagCutoffStrategy, TokenCatalog,
};

/// Ranking used for map searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapRanking {
    /// Weighted name/tag/synonym scoring
    #[default]
    Scored,
    /// Fuzzy tag matching with a widening cutoff
    TagCutoff,
}

/// Application state shared by every command.
/// All fields are Arc-wrapped for thread-safe sharing.
pub struct AppState {
    pub config: LibraryConfig,
    pub event_bus: Arc<EventBus>,
    pub catalog: Arc<Catalog>,
    pub tokens: Arc<TokenCatalog>,
    pub map_searcher: Arc<Searcher>,
    pub token_searcher: Arc<Searcher>,
    pub loader: Arc<Loader>,
    pub importer: Arc<MediaImporter>,
}

impl AppState {
    /// Wire every component from `config` and load both catalogs.
    pub fn initialize(
        config: LibraryConfig,
        factory: Arc<dyn DecoderFactory>,
        thesaurus: Arc<dyn Thesaurus>,
        ranking: MapRanking,
    ) -> AppResult<Self> {
        let workers = config.worker_count();

        // 1. INFRASTRUCTURE
        let event_bus = Arc::new(EventBus::new());

        // 2. REPOSITORIES
        let store: Arc<dyn CatalogStore> = Arc::new(JsonCatalogStore::new(config.catalog_path()));

        // 3. SERVICES
        let catalog = Arc::new(Catalog::new(
            store,
            event_bus.clone(),
            config.assets_root.clone(),
            CatalogOptions {
                thumbnail_size: config.thumbnail_size(),
                asset_cache_capacity: config.asset_cache_capacity,
                workers,
            },
        ));
        catalog.load()?;

        let tokens = Arc::new(TokenCatalog::load_dir(
            &config.tokens_path(),
            &config.assets_root,
            workers,
            config.token_cache_capacity,
        )?);

        let map_strategy: Box<dyn SearchStrategy> = match ranking {
            MapRanking::Scored => Box::new(ScoredMapStrategy::new(thesaurus.clone())),
            MapRanking::TagCutoff => Box::new(TagCutoffStrategy::new(config.tag_cutoff_accuracy)),
        };
        let map_searcher = Arc::new(Searcher::new(
            map_strategy,
            catalog.clone() as Arc<dyn CorpusSource>,
            config.search_cache_capacity,
        ));
        let token_searcher = Arc::new(Searcher::new(
            Box::new(ScoredTokenStrategy::new(thesaurus)),
            tokens.clone() as Arc<dyn CorpusSource>,
            config.search_cache_capacity,
        ));

        let loader = Arc::new(Loader::new(
            catalog.clone(),
            factory.clone(),
            event_bus.clone(),
            config.canonical_size(),
        ));
        let importer = Arc::new(MediaImporter::new(
            catalog.clone(),
            factory,
            event_bus.clone(),
            config.thumbnails_path(),
            config.thumbnail_size(),
        ));

        // 4. EVENT HANDLER REGISTRATION (WIRING)
        loader.register_event_handlers();

        log::info!(
            "Library at {:?}: {} maps, {} tokens, {} ranking",
            config.assets_root,
            catalog.len(),
            tokens.len(),
            map_searcher.strategy_name()
        );

        Ok(Self {
            config,
            event_bus,
            catalog,
            tokens,
            map_searcher,
            token_searcher,
            loader,
            importer,
        })
    }
}
