// src/services/loader_service.rs
//
// Loader
//
// "Give me the live frame sequence for map X."
//
// CRITICAL RULES:
// - At most one stream is active per Loader
// - Loading the active map again returns the same live handle, unreset
// - Switching maps releases the previous decoder before opening the next
// - Streams of maps that leave the catalog are released and forgotten

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use image::RgbImage;
use parking_lot::Mutex;

use super::catalog_service::Catalog;
use super::media_stream::{MediaStream, StreamState};
use crate::domain::normalize_name;
use crate::error::AppResult;
use crate::events::{AssetRemoved, AssetRenamed, EventBus, StreamActivated, StreamReleased};
use crate::integrations::DecoderFactory;

/// Shared handle onto one map's stream.
///
/// Clones pull from the same cursor; the sequence is infinite and cannot be
/// restarted independently.
#[derive(Clone)]
pub struct StreamHandle {
    stream: Arc<Mutex<MediaStream>>,
}

impl StreamHandle {
    fn new(stream: MediaStream) -> Self {
        Self {
            stream: Arc::new(Mutex::new(stream)),
        }
    }

    pub fn next_frame(&self) -> AppResult<RgbImage> {
        self.stream.lock().next_frame()
    }

    pub fn name(&self) -> String {
        self.stream.lock().name().to_string()
    }

    pub fn state(&self) -> StreamState {
        self.stream.lock().state()
    }

    pub fn frame_count(&self) -> Option<usize> {
        self.stream.lock().frame_count()
    }

    /// Whether both handles drive the same stream
    pub fn same_stream(&self, other: &StreamHandle) -> bool {
        Arc::ptr_eq(&self.stream, &other.stream)
    }

    fn open(&self) -> AppResult<usize> {
        self.stream.lock().open()
    }

    fn release(&self) -> bool {
        self.stream.lock().release()
    }
}

impl Iterator for StreamHandle {
    type Item = AppResult<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_frame())
    }
}

#[derive(Default)]
struct LoaderState {
    active: Option<String>,
    streams: HashMap<String, StreamHandle>,
}

pub struct Loader {
    catalog: Arc<Catalog>,
    factory: Arc<dyn DecoderFactory>,
    event_bus: Arc<EventBus>,
    canonical: (u32, u32),
    state: Mutex<LoaderState>,
}

impl Loader {
    pub fn new(
        catalog: Arc<Catalog>,
        factory: Arc<dyn DecoderFactory>,
        event_bus: Arc<EventBus>,
        canonical: (u32, u32),
    ) -> Self {
        Self {
            catalog,
            factory,
            event_bus,
            canonical,
            state: Mutex::new(LoaderState::default()),
        }
    }

    /// Release and forget streams whose map is removed or renamed.
    pub fn register_event_handlers(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.event_bus.subscribe::<AssetRemoved, _>(move |event| {
            if let Some(loader) = weak.upgrade() {
                loader.forget(&event.name);
            }
        });

        let weak: Weak<Self> = Arc::downgrade(self);
        self.event_bus.subscribe::<AssetRenamed, _>(move |event| {
            if let Some(loader) = weak.upgrade() {
                loader.forget(&event.old_name);
            }
        });
    }

    /// Activate `name` and return its live frame sequence.
    pub fn load_asset(&self, name: &str) -> AppResult<StreamHandle> {
        let asset = self.catalog.get_asset(name)?;
        let mut released = None;

        let (handle, frame_count) = {
            let mut state = self.state.lock();

            if state.active.as_deref() == Some(asset.name.as_str()) {
                if let Some(handle) = state.streams.get(&asset.name) {
                    return Ok(handle.clone());
                }
            }

            if let Some(previous) = state.active.take() {
                if let Some(handle) = state.streams.get(&previous) {
                    if handle.release() {
                        released = Some(previous);
                    }
                }
            }

            let handle = state
                .streams
                .entry(asset.name.clone())
                .or_insert_with(|| {
                    StreamHandle::new(MediaStream::new(
                        asset.name.clone(),
                        asset.path.clone(),
                        Arc::clone(&self.factory),
                        self.canonical,
                    ))
                })
                .clone();

            let opened = handle.open();
            match opened {
                Ok(frame_count) => {
                    state.active = Some(asset.name.clone());
                    (handle, frame_count)
                }
                Err(e) => {
                    state.streams.remove(&asset.name);
                    drop(state);
                    if let Some(previous) = released {
                        self.event_bus.emit(StreamReleased::new(previous));
                    }
                    return Err(e);
                }
            }
        };

        if let Some(previous) = released {
            self.event_bus.emit(StreamReleased::new(previous));
        }
        log::info!("Activated {:?} ({} frames)", asset.name, frame_count);
        self.event_bus
            .emit(StreamActivated::new(asset.name.clone(), frame_count));
        Ok(handle)
    }

    /// Close a map's decoder. Idempotent.
    pub fn release(&self, name: &str) -> bool {
        let key = normalize_name(name);
        let released = {
            let mut state = self.state.lock();
            if state.active.as_deref() == Some(key.as_str()) {
                state.active = None;
            }
            state
                .streams
                .get(&key)
                .map(|handle| handle.release())
                .unwrap_or(false)
        };

        if released {
            self.event_bus.emit(StreamReleased::new(key));
        }
        released
    }

    /// Release a map's stream and drop it entirely.
    pub fn forget(&self, name: &str) {
        let key = normalize_name(name);
        let released = {
            let mut state = self.state.lock();
            if state.active.as_deref() == Some(key.as_str()) {
                state.active = None;
            }
            state
                .streams
                .remove(&key)
                .map(|handle| handle.release())
                .unwrap_or(false)
        };

        if released {
            log::debug!("Forgot stream {:?}", key);
            self.event_bus.emit(StreamReleased::new(key));
        }
    }

    pub fn active_asset(&self) -> Option<String> {
        self.state.lock().active.clone()
    }

    /// Streams currently holding an open decoder
    pub fn open_streams(&self) -> usize {
        self.state
            .lock()
            .streams
            .values()
            .filter(|handle| handle.state() != StreamState::Closed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::test_support::{marked_frame, ruins_and_lair, FakeDecoderFactory};

    struct Fixture {
        _dir: tempfile::TempDir,
        catalog: Arc<Catalog>,
        bus: Arc<EventBus>,
        factory: Arc<FakeDecoderFactory>,
        loader: Arc<Loader>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, bus) = ruins_and_lair(dir.path());
        let factory = Arc::new(FakeDecoderFactory::new());
        for name in ["Ancient Ruins", "Dragon Lair"] {
            let asset = catalog.get_asset(name).unwrap();
            factory.add_video(&asset.path, vec![marked_frame(1), marked_frame(2)]);
        }
        let loader = Arc::new(Loader::new(
            Arc::clone(&catalog),
            Arc::clone(&factory) as Arc<dyn DecoderFactory>,
            Arc::clone(&bus),
            (2, 1),
        ));
        loader.register_event_handlers();
        Fixture {
            _dir: dir,
            catalog,
            bus,
            factory,
            loader,
        }
    }

    #[test]
    fn test_loading_active_map_again_reuses_stream() {
        let f = fixture();
        let path = f.catalog.get_asset("Dragon Lair").unwrap().path;

        let first = f.loader.load_asset("Dragon Lair").unwrap();
        first.next_frame().unwrap();
        let second = f.loader.load_asset("dragon lair").unwrap();

        assert!(first.same_stream(&second));
        assert_eq!(f.factory.opens(&path), 1);
        // not reset: the cursor is where the first pull left it
        assert_eq!(second.state(), StreamState::Open { position: 1 });
    }

    #[test]
    fn test_switching_releases_previous_stream() {
        let f = fixture();

        let lair = f.loader.load_asset("Dragon Lair").unwrap();
        let ruins = f.loader.load_asset("Ancient Ruins").unwrap();

        assert_eq!(lair.state(), StreamState::Closed);
        assert_eq!(ruins.state(), StreamState::Open { position: 0 });
        assert_eq!(f.loader.active_asset().as_deref(), Some("Ancient Ruins"));
        assert_eq!(f.loader.open_streams(), 1);

        let types: Vec<String> = f
            .bus
            .get_event_log()
            .into_iter()
            .map(|e| e.event_type)
            .filter(|t| t.starts_with("Stream"))
            .collect();
        assert_eq!(types, vec!["StreamActivated", "StreamReleased", "StreamActivated"]);
    }

    #[test]
    fn test_switching_back_reopens_once() {
        let f = fixture();
        let path = f.catalog.get_asset("Dragon Lair").unwrap().path;

        let first = f.loader.load_asset("Dragon Lair").unwrap();
        f.loader.load_asset("Ancient Ruins").unwrap();
        let again = f.loader.load_asset("Dragon Lair").unwrap();

        assert!(first.same_stream(&again));
        assert_eq!(f.factory.opens(&path), 2);
    }

    #[test]
    fn test_handle_iterates_forever() {
        let f = fixture();
        let handle = f.loader.load_asset("Ancient Ruins").unwrap();

        let frames: Vec<RgbImage> = handle.take(7).collect::<AppResult<_>>().unwrap();

        assert_eq!(frames.len(), 7);
        assert_eq!(frames[0], frames[2]);
        assert_eq!(frames[1], frames[5]);
    }

    #[test]
    fn test_stale_handles_cannot_reopen() {
        let f = fixture();

        let lair = f.loader.load_asset("Dragon Lair").unwrap();
        let ruins = f.loader.load_asset("Ancient Ruins").unwrap();
        assert!(matches!(lair.next_frame(), Err(AppError::Decoder(_))));
        assert_eq!(f.loader.open_streams(), 1);
        assert_eq!(f.loader.active_asset().as_deref(), Some("Ancient Ruins"));

        ruins.next_frame().unwrap();
        f.loader.release("Ancient Ruins");
        assert!(matches!(ruins.next_frame(), Err(AppError::Decoder(_))));
        assert_eq!(f.loader.open_streams(), 0);
        assert_eq!(f.factory.total_opens(), 2);
    }

    #[test]
    fn test_release_is_idempotent() {
        let f = fixture();
        f.loader.load_asset("Dragon Lair").unwrap();

        assert!(f.loader.release("dragon lair"));
        assert!(!f.loader.release("Dragon Lair"));
        assert!(!f.loader.release("Nowhere"));
        assert_eq!(f.loader.active_asset(), None);
    }

    #[test]
    fn test_unknown_map_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.loader.load_asset("Nowhere"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_open_failure_leaves_nothing_active() {
        let f = fixture();
        let broken = crate::services::test_support::map_on_disk(
            f.catalog.assets_root(),
            "Broken Map",
            &[],
        );
        f.catalog.add_asset(broken).unwrap();

        assert!(matches!(
            f.loader.load_asset("Broken Map"),
            Err(AppError::Decoder(_))
        ));
        assert_eq!(f.loader.active_asset(), None);
        assert_eq!(f.loader.open_streams(), 0);
    }

    #[test]
    fn test_removed_map_stream_is_released() {
        let f = fixture();
        let handle = f.loader.load_asset("Dragon Lair").unwrap();

        f.catalog.remove_asset("Dragon Lair").unwrap();

        assert_eq!(handle.state(), StreamState::Closed);
        assert_eq!(f.loader.active_asset(), None);
        assert_eq!(f.loader.open_streams(), 0);
    }

    #[test]
    fn test_renamed_map_stream_is_forgotten() {
        let f = fixture();
        let old = f.loader.load_asset("Dragon Lair").unwrap();

        f.catalog.rename_asset("Dragon Lair", "Wyrm Den").unwrap();
        let renamed = f.loader.load_asset("Wyrm Den").unwrap();

        assert!(!old.same_stream(&renamed));
        assert_eq!(renamed.name(), "Wyrm Den");
        assert_eq!(old.state(), StreamState::Closed);
    }
}
