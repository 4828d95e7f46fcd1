// src/services/catalog_service.rs
//
// Asset Catalog
//
// CRITICAL RULES:
// - Names are unique after title-casing
// - tag_index always equals the inverted index recomputed from records
// - Every mutation persists the full record set before it is committed in
//   memory; a failed write leaves memory at the previous snapshot
// - One lock covers the in-memory state and the write, so mutators are
//   serialized and readers never see memory ahead of disk
// - Events are emitted after the lock is released

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

use crate::domain::{
    normalize_name, resolve_path, tag_words, validate_map_asset, DomainError, MapAsset, MapEntry,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    AssetAdded, AssetRemoved, AssetRenamed, AssetTagsChanged, CatalogLoaded, EventBus,
    FavoriteChanged,
};
use crate::infrastructure::{build_all, default_worker_count, load_thumbnail, LruCache};
use crate::repositories::CatalogStore;
use crate::services::search::{CorpusSource, SearchCorpus};

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub thumbnail_size: (u32, u32),
    pub asset_cache_capacity: usize,
    pub workers: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            thumbnail_size: (320, 180),
            asset_cache_capacity: 1024,
            workers: default_worker_count(),
        }
    }
}

/// Records plus everything derived from them
#[derive(Debug, Clone, Default)]
struct CatalogState {
    records: HashMap<String, MapAsset>,
    sorted_names: Vec<String>,
    tag_index: BTreeMap<String, BTreeSet<String>>,
    vocabulary: BTreeSet<String>,
}

impl CatalogState {
    fn insert(&mut self, asset: MapAsset) {
        for tag in &asset.tags {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(asset.name.clone());
            self.vocabulary.insert(tag.clone());
        }
        if let Err(pos) = self.sorted_names.binary_search(&asset.name) {
            self.sorted_names.insert(pos, asset.name.clone());
        }
        self.records.insert(asset.name.clone(), asset);
    }

    fn record_mut(&mut self, name: &str) -> AppResult<&mut MapAsset> {
        self.records
            .get_mut(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    fn add_tags(&mut self, name: &str, tags: &[String]) -> AppResult<Vec<String>> {
        let record = self.record_mut(name)?;
        let added: Vec<String> = tags
            .iter()
            .filter(|tag| record.tags.insert((*tag).clone()))
            .cloned()
            .collect();

        for tag in &added {
            self.tag_index
                .entry(tag.clone())
                .or_default()
                .insert(name.to_string());
        }
        self.vocabulary.extend(tags.iter().cloned());
        Ok(added)
    }

    /// Drop `tags` from one record. A tag left with at most one holder
    /// leaves the vocabulary.
    fn remove_tags(&mut self, name: &str, tags: &[String]) -> AppResult<Vec<String>> {
        let record = self.record_mut(name)?;
        let removed: Vec<String> = tags
            .iter()
            .filter(|tag| record.tags.remove(tag.as_str()))
            .cloned()
            .collect();

        for tag in &removed {
            let remaining = match self.tag_index.get_mut(tag) {
                Some(holders) => {
                    holders.remove(name);
                    holders.len()
                }
                None => 0,
            };
            if remaining == 0 {
                self.tag_index.remove(tag);
            }
            if remaining <= 1 {
                self.vocabulary.remove(tag);
            }
        }
        Ok(removed)
    }

    fn remove(&mut self, name: &str) -> AppResult<MapAsset> {
        let tags: Vec<String> = self.record_mut(name)?.tags.iter().cloned().collect();
        self.remove_tags(name, &tags)?;
        if let Ok(pos) = self.sorted_names.binary_search_by(|n| n.as_str().cmp(name)) {
            self.sorted_names.remove(pos);
        }
        self.records
            .remove(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    fn entries(&self, assets_root: &Path) -> Vec<MapEntry> {
        self.sorted_names
            .iter()
            .filter_map(|name| self.records.get(name))
            .map(|asset| asset.to_entry(assets_root))
            .collect()
    }

    fn corpus(&self) -> SearchCorpus {
        SearchCorpus {
            names: self.sorted_names.clone(),
            tag_index: self.tag_index.clone(),
            vocabulary: self.vocabulary.clone(),
        }
    }
}

struct CatalogInner {
    state: CatalogState,
    generation: u64,
    corpus: Option<Arc<SearchCorpus>>,
    asset_cache: LruCache<String, MapAsset>,
    favorites: Option<Vec<MapAsset>>,
}

impl CatalogInner {
    fn commit(&mut self, next: CatalogState) {
        self.state = next;
        self.generation += 1;
        self.corpus = None;
        self.asset_cache.clear();
        self.favorites = None;
    }
}

/// The map library: records, tag index and backing store.
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    event_bus: Arc<EventBus>,
    assets_root: PathBuf,
    options: CatalogOptions,
    inner: Mutex<CatalogInner>,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        event_bus: Arc<EventBus>,
        assets_root: PathBuf,
        options: CatalogOptions,
    ) -> Self {
        let asset_cache = LruCache::new(options.asset_cache_capacity);
        Self {
            store,
            event_bus,
            assets_root,
            options,
            inner: Mutex::new(CatalogInner {
                state: CatalogState::default(),
                generation: 0,
                corpus: None,
                asset_cache,
                favorites: None,
            }),
        }
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Replace the in-memory catalog with the backing store's contents.
    ///
    /// Records (and their thumbnails) are built on the worker pool; the call
    /// returns once every record is built. When two entries share a name
    /// the first one in the file wins.
    pub fn load(&self) -> AppResult<usize> {
        let entries = self.store.load()?;
        let total = entries.len();
        let root = self.assets_root.clone();
        let thumbnail_size = self.options.thumbnail_size;

        let mut built = build_all(
            entries.into_iter().enumerate().collect(),
            self.options.workers,
            |(idx, entry): (usize, MapEntry)| {
                Ok(build_record(&entry, &root, thumbnail_size).map(|asset| (idx, asset)))
            },
        )?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
        built.sort_by_key(|(idx, _)| *idx);

        let mut state = CatalogState::default();
        for (_, asset) in built {
            if state.records.contains_key(&asset.name) {
                log::warn!("Skipping duplicate map entry {:?}", asset.name);
                continue;
            }
            state.insert(asset);
        }

        let asset_count = state.records.len();
        let tag_count = state.tag_index.len();
        self.inner.lock().commit(state);

        log::info!(
            "Loaded {} maps ({} entries, {} tags) with {} workers",
            asset_count,
            total,
            tag_count,
            self.options.workers
        );
        self.event_bus.emit(CatalogLoaded::new(asset_count, tag_count));
        Ok(asset_count)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get_asset(&self, name: &str) -> AppResult<MapAsset> {
        let key = normalize_name(name);
        let mut inner = self.inner.lock();

        if let Some(hit) = inner.asset_cache.get(&key) {
            return Ok(hit);
        }

        let asset = inner
            .state
            .records
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(key.clone()))?;
        inner.asset_cache.insert(key, asset.clone());
        Ok(asset)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .lock()
            .state
            .records
            .contains_key(&normalize_name(name))
    }

    /// Favorite maps, sorted by name
    pub fn get_favorites(&self) -> Vec<MapAsset> {
        let mut inner = self.inner.lock();
        if let Some(favorites) = &inner.favorites {
            return favorites.clone();
        }

        let favorites: Vec<MapAsset> = inner
            .state
            .sorted_names
            .iter()
            .filter_map(|name| inner.state.records.get(name))
            .filter(|asset| asset.favorite)
            .cloned()
            .collect();
        inner.favorites = Some(favorites.clone());
        favorites
    }

    /// Maps carrying at least one of the tags in `raw_text`, sorted by name
    pub fn assets_with_tags(&self, raw_text: &str) -> Vec<MapAsset> {
        let tags = tag_words(raw_text);
        let inner = self.inner.lock();

        let names: BTreeSet<&String> = tags
            .iter()
            .filter_map(|tag| inner.state.tag_index.get(tag))
            .flatten()
            .collect();
        names
            .into_iter()
            .filter_map(|name| inner.state.records.get(name))
            .cloned()
            .collect()
    }

    /// Sorted names
    pub fn names(&self) -> Vec<String> {
        self.inner.lock().state.sorted_names.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().state.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Global tag vocabulary
    pub fn tags(&self) -> BTreeSet<String> {
        self.inner.lock().state.vocabulary.clone()
    }

    pub fn tag_index(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.inner.lock().state.tag_index.clone()
    }

    /// The persisted shape of the current records
    pub fn entries(&self) -> Vec<MapEntry> {
        self.inner.lock().state.entries(&self.assets_root)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Build the next state, persist it, then commit it.
    fn mutate<T, F>(&self, apply: F) -> AppResult<T>
    where
        F: FnOnce(&mut CatalogState) -> AppResult<T>,
    {
        let mut inner = self.inner.lock();
        let mut next = inner.state.clone();
        let outcome = apply(&mut next)?;

        self.store.save(&next.entries(&self.assets_root))?;
        inner.commit(next);
        Ok(outcome)
    }

    /// Add the tag words in `raw_text` to a map. Returns the tags the map
    /// did not already carry.
    pub fn add_tags(&self, name: &str, raw_text: &str) -> AppResult<Vec<String>> {
        let key = normalize_name(name);
        let tags = tag_words(raw_text);
        let added = self.mutate(|state| state.add_tags(&key, &tags))?;

        log::info!("Tagged {:?} with {:?}", key, added);
        if !added.is_empty() {
            self.event_bus
                .emit(AssetTagsChanged::new(key, added.clone(), Vec::new()));
        }
        Ok(added)
    }

    /// Remove the tag words in `raw_text` from a map. Returns the tags that
    /// were actually removed.
    pub fn remove_tags(&self, name: &str, raw_text: &str) -> AppResult<Vec<String>> {
        let key = normalize_name(name);
        let tags = tag_words(raw_text);
        let removed = self.mutate(|state| state.remove_tags(&key, &tags))?;

        log::info!("Untagged {:?}: {:?}", key, removed);
        if !removed.is_empty() {
            self.event_bus
                .emit(AssetTagsChanged::new(key, Vec::new(), removed.clone()));
        }
        Ok(removed)
    }

    pub fn set_favorite(&self, name: &str, favorite: bool) -> AppResult<()> {
        let key = normalize_name(name);
        self.mutate(|state| {
            state.record_mut(&key)?.favorite = favorite;
            Ok(())
        })?;

        self.event_bus.emit(FavoriteChanged::new(key, favorite));
        Ok(())
    }

    pub fn add_asset(&self, mut asset: MapAsset) -> AppResult<()> {
        asset.name = normalize_name(&asset.name);
        validate_map_asset(&asset)?;
        let name = asset.name.clone();

        self.mutate(|state| {
            if state.records.contains_key(&asset.name) {
                return Err(AppError::AlreadyExists(asset.name.clone()));
            }
            state.insert(asset);
            Ok(())
        })?;

        log::info!("Added map {:?}", name);
        self.event_bus.emit(AssetAdded::new(name));
        Ok(())
    }

    /// Remove a map, its tags and its files.
    pub fn remove_asset(&self, name: &str) -> AppResult<MapAsset> {
        let key = normalize_name(name);
        let removed = self.mutate(|state| state.remove(&key))?;

        for file in removed.files() {
            if let Err(e) = std::fs::remove_file(file) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not delete {:?}: {}", file, e);
                }
            }
        }

        log::info!("Removed map {:?}", key);
        self.event_bus.emit(AssetRemoved::new(key));
        Ok(removed)
    }

    /// Re-key a map. Tags, favorite flag, files and origin carry over.
    pub fn rename_asset(&self, name: &str, new_name: &str) -> AppResult<String> {
        let old_key = normalize_name(name);
        let new_key = normalize_name(new_name);
        if new_key.is_empty() {
            return Err(DomainError::EmptyName.into());
        }
        if old_key == new_key {
            return if self.contains(&old_key) {
                Ok(new_key)
            } else {
                Err(AppError::NotFound(old_key))
            };
        }

        self.mutate(|state| {
            if !state.records.contains_key(&old_key) {
                return Err(AppError::NotFound(old_key.clone()));
            }
            if state.records.contains_key(&new_key) {
                return Err(AppError::AlreadyExists(new_key.clone()));
            }

            // a rename is not a tag edit, the vocabulary stays as it was
            let vocabulary = state.vocabulary.clone();
            let mut asset = state.remove(&old_key)?;
            asset.name = new_key.clone();
            state.insert(asset);
            state.vocabulary = vocabulary;
            Ok(())
        })?;

        log::info!("Renamed map {:?} -> {:?}", old_key, new_key);
        self.event_bus
            .emit(AssetRenamed::new(old_key, new_key.clone()));
        Ok(new_key)
    }

    #[cfg(test)]
    pub(crate) fn index_is_consistent(&self) -> bool {
        let inner = self.inner.lock();
        let state = &inner.state;

        let mut expected: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for asset in state.records.values() {
            for tag in &asset.tags {
                expected
                    .entry(tag.clone())
                    .or_default()
                    .insert(asset.name.clone());
            }
        }

        let mut names: Vec<String> = state.records.keys().cloned().collect();
        names.sort();

        expected == state.tag_index && names == state.sorted_names
    }
}

impl CorpusSource for Catalog {
    fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    fn corpus(&self) -> Arc<SearchCorpus> {
        let mut inner = self.inner.lock();
        if let Some(corpus) = &inner.corpus {
            return Arc::clone(corpus);
        }
        let corpus = Arc::new(inner.state.corpus());
        inner.corpus = Some(Arc::clone(&corpus));
        corpus
    }
}

/// Turn one stored entry into a record, decoding its thumbnail.
///
/// An unreadable thumbnail does not fail the load; the record gets a blank
/// preview instead. Entries that break a record invariant are skipped.
fn build_record(
    entry: &MapEntry,
    assets_root: &Path,
    thumbnail_size: (u32, u32),
) -> Option<MapAsset> {
    let path = resolve_path(&entry.path, assets_root);
    let thumbnail_path = resolve_path(&entry.thumbnail, assets_root);

    let thumbnail = load_thumbnail(&thumbnail_path, thumbnail_size).unwrap_or_else(|e| {
        log::warn!(
            "Thumbnail for {:?} unreadable ({}), using a blank preview",
            entry.name,
            e
        );
        RgbaImage::new(thumbnail_size.0, thumbnail_size.1)
    });

    let origin = Some(entry.url.clone());
    let asset = MapAsset::new(
        &entry.name,
        path,
        &entry.tags,
        thumbnail_path,
        thumbnail,
        origin,
    )
    .with_favorite(entry.favorite);

    if let Err(e) = validate_map_asset(&asset) {
        log::warn!("Skipping map entry {:?}: {}", entry.name, e);
        return None;
    }
    Some(asset)
}
