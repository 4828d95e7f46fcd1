use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::naming::{normalize_name, normalize_tag};

/// One map as it is stored in the backing file.
///
/// Paths are kept relative to the assets root whenever the file lives
/// under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub favorite: bool,
}

/// One token as it is stored. Tokens carry no tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub name: String,
    pub path: String,
}

/// A video-backed background map
#[derive(Debug, Clone, PartialEq)]
pub struct MapAsset {
    /// Title-cased unique key
    pub name: String,

    /// Absolute path to the video file
    pub path: PathBuf,

    /// Lower-cased, trimmed tags
    pub tags: BTreeSet<String>,

    /// Absolute path to the preview image
    pub thumbnail_path: PathBuf,

    /// Decoded preview, shared between clones
    pub thumbnail: Arc<RgbaImage>,

    /// Where the map was fetched from, if anywhere
    pub origin: Option<String>,

    pub favorite: bool,
}

impl MapAsset {
    /// Create a map record, normalizing the name and tags.
    pub fn new<I, S>(
        name: &str,
        path: PathBuf,
        tags: I,
        thumbnail_path: PathBuf,
        thumbnail: RgbaImage,
        origin: Option<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: normalize_name(name),
            path,
            tags: tags
                .into_iter()
                .map(|t| normalize_tag(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
            thumbnail_path,
            thumbnail: Arc::new(thumbnail),
            origin: origin.filter(|o| !o.trim().is_empty()),
            favorite: false,
        }
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Files owned by this record
    pub fn files(&self) -> [&Path; 2] {
        [self.path.as_path(), self.thumbnail_path.as_path()]
    }

    /// Flatten into the persisted shape
    pub fn to_entry(&self, assets_root: &Path) -> MapEntry {
        MapEntry {
            name: self.name.clone(),
            path: relativize(&self.path, assets_root),
            tags: self.tags.iter().cloned().collect(),
            thumbnail: relativize(&self.thumbnail_path, assets_root),
            url: self.origin.clone().unwrap_or_default(),
            favorite: self.favorite,
        }
    }
}

/// An image-backed overlay token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenAsset {
    pub name: String,
    pub path: PathBuf,
    /// Decoded image with the background matted out
    pub image: Arc<RgbaImage>,
}

impl TokenAsset {
    pub fn new(name: &str, path: PathBuf, image: RgbaImage) -> Self {
        Self {
            name: normalize_name(name),
            path,
            image: Arc::new(image),
        }
    }

    pub fn to_entry(&self, assets_root: &Path) -> TokenEntry {
        TokenEntry {
            name: self.name.clone(),
            path: relativize(&self.path, assets_root),
        }
    }
}

/// Resolve a stored path against the assets root
pub fn resolve_path(stored: &str, assets_root: &Path) -> PathBuf {
    let path = Path::new(stored);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        assets_root.join(path)
    }
}

fn relativize(path: &Path, assets_root: &Path) -> String {
    path.strip_prefix(assets_root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
