// src/application/commands/fixture.rs
//
// An AppState over a scratch library.

use std::sync::Arc;

use tempfile::TempDir;

use crate::application::state::{AppState, MapRanking};
use crate::config::LibraryConfig;
use crate::integrations::{DecoderFactory, WordListThesaurus};
use crate::services::test_support::{map_on_disk, marked_frame, write_png, FakeDecoderFactory};

pub struct Library {
    pub dir: TempDir,
    pub factory: Arc<FakeDecoderFactory>,
    pub state: AppState,
}

/// Two maps with 3-frame videos and two tokens
pub fn library(ranking: MapRanking) -> Library {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(&root.join("tokens").join("goblin.png"), 8, 8, [30, 160, 30]);
    write_png(&root.join("tokens").join("red dragon.png"), 8, 8, [180, 20, 20]);

    let mut config = LibraryConfig::with_root(root);
    config.canonical_width = 4;
    config.canonical_height = 2;
    config.thumbnail_width = 4;
    config.thumbnail_height = 4;
    config.workers = Some(2);

    let factory = Arc::new(FakeDecoderFactory::new());
    let thesaurus = Arc::new(WordListThesaurus::from_pairs([("cave", vec!["cavern"])]));
    let state = AppState::initialize(
        config,
        Arc::clone(&factory) as Arc<dyn DecoderFactory>,
        thesaurus,
        ranking,
    )
    .unwrap();

    for (name, tags) in [
        ("Ancient Ruins", ["ruins", "stone", "outdoor"]),
        ("Dragon Lair", ["dragon", "cave", "fire"]),
    ] {
        let asset = map_on_disk(root, name, &tags);
        factory.add_video(
            &asset.path,
            vec![marked_frame(1), marked_frame(2), marked_frame(3)],
        );
        state.catalog.add_asset(asset).unwrap();
    }

    Library {
        dir,
        factory,
        state,
    }
}
