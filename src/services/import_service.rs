// src/services/import_service.rs
//
// Media Importer
//
// Turns a freshly downloaded video into a catalogued map.
//
// CRITICAL RULES:
// - The first frame must decode; otherwise the file is deleted and the
//   import fails with CorruptMedia
// - The thumbnail is the first frame, written as PNG next to the others
// - Default tags come from the ASCII-cleaned map name

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use super::catalog_service::Catalog;
use crate::domain::{ascii_clean, normalize_name, tag_words, MapAsset};
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, MediaImported};
use crate::infrastructure::{bgr_to_rgb, save_png};
use crate::integrations::DecoderFactory;

#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Downloaded video, already inside the maps directory
    pub video_path: PathBuf,
    /// Where it was fetched from
    pub origin: Option<String>,
}

pub struct MediaImporter {
    catalog: Arc<Catalog>,
    factory: Arc<dyn DecoderFactory>,
    event_bus: Arc<EventBus>,
    thumbnails_dir: PathBuf,
    thumbnail_size: (u32, u32),
}

impl MediaImporter {
    pub fn new(
        catalog: Arc<Catalog>,
        factory: Arc<dyn DecoderFactory>,
        event_bus: Arc<EventBus>,
        thumbnails_dir: PathBuf,
        thumbnail_size: (u32, u32),
    ) -> Self {
        Self {
            catalog,
            factory,
            event_bus,
            thumbnails_dir,
            thumbnail_size,
        }
    }

    pub fn import(&self, request: ImportRequest) -> AppResult<MapAsset> {
        let video_path = request.video_path;
        let stem = video_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Other(format!("No file name in {:?}", video_path)))?;

        let name = normalize_name(&stem);
        if self.catalog.contains(&name) {
            return Err(AppError::AlreadyExists(name));
        }

        let first_frame = match self.probe_first_frame(&video_path) {
            Ok(frame) => frame,
            Err(reason) => {
                discard(&video_path);
                return Err(AppError::CorruptMedia {
                    path: video_path,
                    reason,
                });
            }
        };

        let thumbnail_path = self.thumbnails_dir.join(format!("{}.png", stem));
        save_png(&first_frame, &thumbnail_path)?;

        let preview = imageops::resize(
            &first_frame,
            self.thumbnail_size.0,
            self.thumbnail_size.1,
            FilterType::Triangle,
        );
        let tags = tag_words(&ascii_clean(&name));
        let asset = MapAsset::new(
            &name,
            video_path.clone(),
            &tags,
            thumbnail_path.clone(),
            DynamicImage::ImageRgb8(preview).to_rgba8(),
            request.origin,
        );

        if let Err(e) = self.catalog.add_asset(asset.clone()) {
            discard(&thumbnail_path);
            return Err(e);
        }

        log::info!("Imported {:?} from {:?} with tags {:?}", name, video_path, tags);
        self.event_bus.emit(MediaImported::new(name, video_path));
        Ok(asset)
    }

    /// Decode frame 0, or say why it could not be decoded
    fn probe_first_frame(&self, path: &Path) -> Result<RgbImage, String> {
        let mut decoder = self.factory.open(path).map_err(|e| e.to_string())?;
        let raw = decoder
            .read_frame()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "no frame could be read".to_string())?;
        bgr_to_rgb(raw).map_err(|e| e.to_string())
    }
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Could not delete {:?}: {}", path, e);
        }
    }
}
