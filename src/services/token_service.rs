// src/services/token_service.rs
//
// Token Catalog
//
// Still-image overlay tokens. Built once, read-only afterwards, not
// tag-indexed. Token images are matted (near-white background made
// transparent) while loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use walkdir::WalkDir;

use crate::domain::{
    normalize_name, resolve_path, validate_token_asset, TokenAsset, TokenEntry,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{build_all, load_token_image, LruCache};
use crate::services::search::{CorpusSource, SearchCorpus};

pub struct TokenCatalog {
    assets_root: PathBuf,
    tokens: HashMap<String, TokenAsset>,
    corpus: Arc<SearchCorpus>,
    cache: Mutex<LruCache<String, TokenAsset>>,
}

impl TokenCatalog {
    /// Load every `*.png` directly inside `dir`; names come from file stems.
    pub fn load_dir(
        dir: &Path,
        assets_root: &Path,
        workers: usize,
        cache_capacity: usize,
    ) -> AppResult<Self> {
        if !dir.is_dir() {
            log::info!("No token directory at {:?}", dir);
            return Ok(Self::from_tokens(Vec::new(), assets_root, cache_capacity));
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let entries = paths
            .into_iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_string_lossy().into_owned();
                Some((stem, path))
            })
            .collect();
        Self::load(entries, assets_root, workers, cache_capacity)
    }

    /// Build from persisted `{name, path}` records.
    pub fn from_entries(
        entries: Vec<TokenEntry>,
        assets_root: &Path,
        workers: usize,
        cache_capacity: usize,
    ) -> AppResult<Self> {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let path = resolve_path(&entry.path, assets_root);
                (entry.name, path)
            })
            .collect();
        Self::load(entries, assets_root, workers, cache_capacity)
    }

    fn load(
        entries: Vec<(String, PathBuf)>,
        assets_root: &Path,
        workers: usize,
        cache_capacity: usize,
    ) -> AppResult<Self> {
        let total = entries.len();
        let built = build_all(entries, workers, |(name, path)| {
            match load_token_image(&path) {
                Ok(image) => {
                    let token = TokenAsset::new(&name, path, image);
                    validate_token_asset(&token)?;
                    Ok(Some(token))
                }
                Err(e) => {
                    log::warn!("Skipping token {:?} ({:?}): {}", name, path, e);
                    Ok(None)
                }
            }
        })?;

        let tokens: Vec<TokenAsset> = built.into_iter().flatten().collect();
        log::info!("Loaded {} of {} tokens", tokens.len(), total);
        Ok(Self::from_tokens(tokens, assets_root, cache_capacity))
    }

    fn from_tokens(tokens: Vec<TokenAsset>, assets_root: &Path, cache_capacity: usize) -> Self {
        let mut by_name: HashMap<String, TokenAsset> = HashMap::new();
        for token in tokens {
            if by_name.contains_key(&token.name) {
                log::warn!("Skipping duplicate token {:?}", token.name);
                continue;
            }
            by_name.insert(token.name.clone(), token);
        }

        let corpus = SearchCorpus::from_names(by_name.keys().cloned().collect());
        Self {
            assets_root: assets_root.to_path_buf(),
            tokens: by_name,
            corpus: Arc::new(corpus),
            cache: Mutex::new(LruCache::new(cache_capacity)),
        }
    }

    pub fn get_token(&self, name: &str) -> AppResult<TokenAsset> {
        let key = normalize_name(name);
        let mut cache = self.cache.lock();
        if let Some(hit) = cache.get(&key) {
            return Ok(hit);
        }

        let token = self
            .tokens
            .get(&key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(key.clone()))?;
        cache.insert(key, token.clone());
        Ok(token)
    }

    /// Sorted names
    pub fn names(&self) -> &[String] {
        &self.corpus.names
    }

    pub fn entries(&self) -> Vec<TokenEntry> {
        self.corpus
            .names
            .iter()
            .filter_map(|name| self.tokens.get(name))
            .map(|token| token.to_entry(&self.assets_root))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl CorpusSource for TokenCatalog {
    fn generation(&self) -> u64 {
        0
    }

    fn corpus(&self) -> Arc<SearchCorpus> {
        Arc::clone(&self.corpus)
    }
}
