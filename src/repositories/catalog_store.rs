// src/repositories/catalog_store.rs

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::MapEntry;
use crate::error::{AppError, AppResult};

/// Backing store for the map catalog.
///
/// `save` receives the complete record set every time; there are no
/// partial writes.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogStore: Send + Sync {
    fn load(&self) -> AppResult<Vec<MapEntry>>;
    fn save(&self, entries: &[MapEntry]) -> AppResult<()>;
}

/// Whole-file JSON store.
///
/// Writes go to a temporary file in the same directory which then
/// atomically replaces the target, so readers see either the previous
/// snapshot or the new one.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, entries: &[MapEntry]) -> AppResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| AppError::Io(e.error))?;
        Ok(())
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> AppResult<Vec<MapEntry>> {
        if !self.path.exists() {
            log::info!("No catalog at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, entries: &[MapEntry]) -> AppResult<()> {
        self.write_atomically(entries).map_err(|e| {
            AppError::Persistence(format!("writing {:?} failed: {}", self.path, e))
        })?;
        log::debug!("Wrote {} catalog entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}
