// src/integrations/video/mod.rs
//
// Video decode seam.
//
// A FrameDecoder is one open decode handle. Opening it (and probing the
// frame count) is the expensive part; reading and rewinding are cheap
// relative to that.

pub mod ffmpeg;

use std::path::Path;

use crate::error::AppResult;
use crate::infrastructure::RawFrame;

pub use ffmpeg::{FfmpegDecoder, FfmpegDecoderFactory};

pub trait FrameDecoder: Send {
    /// Total frame count, probed once when the handle was opened
    fn frame_count(&self) -> usize;

    /// Next frame in BGR order, or `None` once the source is exhausted
    fn read_frame(&mut self) -> AppResult<Option<RawFrame>>;

    /// Reposition at frame 0
    fn rewind(&mut self) -> AppResult<()>;
}

pub trait DecoderFactory: Send + Sync {
    fn open(&self, path: &Path) -> AppResult<Box<dyn FrameDecoder>>;
}
