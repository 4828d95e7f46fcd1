// src/application/commands/stream_commands.rs
//
// Stream Command Handlers

use crate::application::{
    dto::{FrameDto, FramesReportDto},
    state::AppState,
};
use crate::error::AppResult;

/// Activate a map, pull `count` frames and report their dimensions.
pub fn pull_frames(state: &AppState, name: &str, count: usize) -> AppResult<FramesReportDto> {
    let handle = state.loader.load_asset(name)?;

    let frames = handle
        .clone()
        .take(count)
        .enumerate()
        .map(|(index, frame)| {
            frame.map(|frame| FrameDto {
                index,
                width: frame.width(),
                height: frame.height(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(FramesReportDto {
        name: handle.name(),
        frame_count: handle.frame_count(),
        frames,
    })
}

/// Close a map's decoder. Returns whether one was open.
pub fn release_stream(state: &AppState, name: &str) -> bool {
    state.loader.release(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::fixture::library;
    use crate::application::state::MapRanking;
    use crate::error::AppError;

    #[test]
    fn test_pull_frames_cycles_past_the_end() {
        let lib = library(MapRanking::Scored);

        let report = pull_frames(&lib.state, "dragon lair", 7).unwrap();

        assert_eq!(report.name, "Dragon Lair");
        assert_eq!(report.frame_count, Some(3));
        assert_eq!(report.frames.len(), 7);
        // canonical 4x2, rotated a quarter turn
        assert!(report.frames.iter().all(|f| (f.width, f.height) == (2, 4)));
        assert_eq!(lib.factory.total_opens(), 1);
    }

    #[test]
    fn test_release_stream() {
        let lib = library(MapRanking::Scored);
        pull_frames(&lib.state, "Ancient Ruins", 1).unwrap();

        assert!(release_stream(&lib.state, "Ancient Ruins"));
        assert!(!release_stream(&lib.state, "Ancient Ruins"));
    }

    #[test]
    fn test_unknown_map() {
        let lib = library(MapRanking::Scored);
        assert!(matches!(
            pull_frames(&lib.state, "Nowhere", 1),
            Err(AppError::NotFound(_))
        ));
    }
}
