// src/config/mod.rs
//
// Library configuration.
//
// RULES:
// - Every field has a default, so a missing or partial file is valid
// - Relative paths resolve against `assets_root`
// - Configuration is read once at startup and passed down explicitly

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::infrastructure::default_worker_count;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub assets_root: PathBuf,
    pub catalog_file: PathBuf,
    pub maps_dir: PathBuf,
    pub tokens_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    /// JSON object of `word -> [synonym, ...]`
    pub thesaurus_file: Option<PathBuf>,

    pub canonical_width: u32,
    pub canonical_height: u32,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,

    pub asset_cache_capacity: usize,
    pub token_cache_capacity: usize,
    pub search_cache_capacity: usize,

    /// Bulk-load workers; host parallelism when unset
    pub workers: Option<usize>,

    pub tag_cutoff_accuracy: f64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            catalog_file: PathBuf::from("maps.json"),
            maps_dir: PathBuf::from("maps"),
            tokens_dir: PathBuf::from("tokens"),
            thumbnails_dir: PathBuf::from("thumbnails"),
            thesaurus_file: None,
            canonical_width: 1920,
            canonical_height: 1080,
            thumbnail_width: 320,
            thumbnail_height: 180,
            asset_cache_capacity: 1024,
            token_cache_capacity: 256,
            search_cache_capacity: 1024,
            workers: None,
            tag_cutoff_accuracy: 0.5,
        }
    }
}

fn default_assets_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mapvault")
}

impl LibraryConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{:?}: {}", path, e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults rooted somewhere else
    pub fn with_root(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(AppError::Config(
                "Canonical resolution must be non-zero".to_string(),
            ));
        }
        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err(AppError::Config(
                "Thumbnail size must be non-zero".to_string(),
            ));
        }
        if !(self.tag_cutoff_accuracy > 0.0 && self.tag_cutoff_accuracy <= 1.0) {
            return Err(AppError::Config(format!(
                "tag_cutoff_accuracy must be in (0, 1], got {}",
                self.tag_cutoff_accuracy
            )));
        }
        if self.workers == Some(0) {
            return Err(AppError::Config("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.assets_root.join(path)
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.resolve(&self.catalog_file)
    }

    pub fn maps_path(&self) -> PathBuf {
        self.resolve(&self.maps_dir)
    }

    pub fn tokens_path(&self) -> PathBuf {
        self.resolve(&self.tokens_dir)
    }

    pub fn thumbnails_path(&self) -> PathBuf {
        self.resolve(&self.thumbnails_dir)
    }

    pub fn thesaurus_path(&self) -> Option<PathBuf> {
        self.thesaurus_file.as_deref().map(|p| self.resolve(p))
    }

    pub fn canonical_size(&self) -> (u32, u32) {
        (self.canonical_width, self.canonical_height)
    }

    pub fn thumbnail_size(&self) -> (u32, u32) {
        (self.thumbnail_width, self.thumbnail_height)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count)
    }
}
