// src/services/test_support.rs
//
// Fixtures shared by the service test suites.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::domain::MapAsset;
use crate::error::{AppError, AppResult};
use crate::events::EventBus;
use crate::infrastructure::RawFrame;
use crate::integrations::{DecoderFactory, FrameDecoder};
use crate::repositories::{CatalogStore, JsonCatalogStore};
use crate::services::{Catalog, CatalogOptions};

pub fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(width, height, Rgb(color)).save(path).unwrap();
}

/// A map whose video and thumbnail files exist under `root`
pub fn map_on_disk(root: &Path, name: &str, tags: &[&str]) -> MapAsset {
    let slug = name.to_lowercase().replace(' ', "_");
    let video = root.join("maps").join(format!("{}.mp4", slug));
    let thumbnail = root.join("thumbnails").join(format!("{}.png", slug));

    std::fs::create_dir_all(video.parent().unwrap()).unwrap();
    std::fs::write(&video, b"not really a video").unwrap();
    write_png(&thumbnail, 4, 4, [10, 20, 30]);

    MapAsset::new(
        name,
        video,
        tags.iter().copied(),
        thumbnail,
        RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255])),
        None,
    )
}

pub fn options() -> CatalogOptions {
    CatalogOptions {
        thumbnail_size: (4, 4),
        asset_cache_capacity: 8,
        workers: 2,
    }
}

/// Empty catalog persisting to `root/maps.json`
pub fn json_catalog(root: &Path) -> (Arc<Catalog>, Arc<EventBus>) {
    let bus = Arc::new(EventBus::new());
    let store: Arc<dyn CatalogStore> = Arc::new(JsonCatalogStore::new(root.join("maps.json")));
    let catalog = Arc::new(Catalog::new(
        store,
        Arc::clone(&bus),
        root.to_path_buf(),
        options(),
    ));
    (catalog, bus)
}

/// "Ancient Ruins" {ruins, stone, outdoor} and "Dragon Lair" {dragon, cave, fire}
pub fn ruins_and_lair(root: &Path) -> (Arc<Catalog>, Arc<EventBus>) {
    let (catalog, bus) = json_catalog(root);
    catalog
        .add_asset(map_on_disk(root, "Ancient Ruins", &["ruins", "stone", "outdoor"]))
        .unwrap();
    catalog
        .add_asset(map_on_disk(root, "Dragon Lair", &["dragon", "cave", "fire"]))
        .unwrap();
    (catalog, bus)
}

/// 2x1 BGR frame whose first pixel's blue byte is `marker`
pub fn marked_frame(marker: u8) -> RawFrame {
    RawFrame {
        width: 2,
        height: 1,
        bgr: vec![marker, 0, 0, 0, 0, 0],
    }
}

/// In-memory decoder over a fixed list of frames
pub struct FakeDecoder {
    frames: Arc<Vec<RawFrame>>,
    cursor: usize,
    rewinds: Arc<AtomicUsize>,
}

impl FrameDecoder for FakeDecoder {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn read_frame(&mut self) -> AppResult<Option<RawFrame>> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> AppResult<()> {
        self.cursor = 0;
        self.rewinds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serves `FakeDecoder`s by path and counts every open
#[derive(Default)]
pub struct FakeDecoderFactory {
    videos: Mutex<HashMap<PathBuf, Arc<Vec<RawFrame>>>>,
    opens: Mutex<HashMap<PathBuf, usize>>,
    pub rewinds: Arc<AtomicUsize>,
}

impl FakeDecoderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(self, path: &Path, frames: Vec<RawFrame>) -> Self {
        self.add_video(path, frames);
        self
    }

    pub fn add_video(&self, path: &Path, frames: Vec<RawFrame>) {
        self.videos.lock().insert(path.to_path_buf(), Arc::new(frames));
    }

    pub fn opens(&self, path: &Path) -> usize {
        self.opens.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_opens(&self) -> usize {
        self.opens.lock().values().sum()
    }
}

impl DecoderFactory for FakeDecoderFactory {
    fn open(&self, path: &Path) -> AppResult<Box<dyn FrameDecoder>> {
        *self.opens.lock().entry(path.to_path_buf()).or_insert(0) += 1;
        let frames = self
            .videos
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::Decoder(format!("cannot open {:?}", path)))?;

        Ok(Box::new(FakeDecoder {
            frames,
            cursor: 0,
            rewinds: Arc::clone(&self.rewinds),
        }))
    }
}
