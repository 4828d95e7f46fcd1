// src/services/media_stream.rs
//
// Media Stream
//
// One decode handle over one map's video, cycled forever.
//
// STATES:
//   Closed --open--> Open { position: 0 } --frames--> Exhausted
//   Exhausted --next--> Open { position: 0 }   (rewind, reported as Rewound)
//   any --release--> Closed
//
// CRITICAL RULES:
// - The decoder is opened and the frame count probed once per activation
// - Only an explicit open leaves Closed; pulling from a closed stream fails
// - Exhaustion never fails; it rewinds
// - A source with no readable frame at position 0 is an error

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;

use crate::error::{AppError, AppResult};
use crate::infrastructure::post_process_frame;
use crate::integrations::{DecoderFactory, FrameDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Closed,
    Open { position: usize },
    Exhausted,
}

/// Outcome of a single pull
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPull {
    Frame(RgbImage),
    /// The stream went back to frame 0; pull again
    Rewound,
}

pub struct MediaStream {
    name: String,
    path: PathBuf,
    factory: Arc<dyn DecoderFactory>,
    canonical: (u32, u32),
    decoder: Option<Box<dyn FrameDecoder>>,
    frame_count: Option<usize>,
    state: StreamState,
}

impl MediaStream {
    pub fn new(
        name: String,
        path: PathBuf,
        factory: Arc<dyn DecoderFactory>,
        canonical: (u32, u32),
    ) -> Self {
        Self {
            name,
            path,
            factory,
            canonical,
            decoder: None,
            frame_count: None,
            state: StreamState::Closed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.decoder.is_some()
    }

    /// Frame count probed at open, `None` while closed
    pub fn frame_count(&self) -> Option<usize> {
        self.frame_count
    }

    /// Open the decoder if closed. Returns the probed frame count.
    pub fn open(&mut self) -> AppResult<usize> {
        if let (Some(_), Some(count)) = (&self.decoder, self.frame_count) {
            return Ok(count);
        }

        let decoder = self.factory.open(&self.path)?;
        let count = decoder.frame_count();
        if count == 0 {
            return Err(AppError::Decoder(format!(
                "{:?} reports no frames",
                self.path
            )));
        }

        log::debug!("Opened stream {:?} ({} frames)", self.name, count);
        self.decoder = Some(decoder);
        self.frame_count = Some(count);
        self.state = StreamState::Open { position: 0 };
        Ok(count)
    }

    /// Advance the state machine by one step.
    pub fn next(&mut self) -> AppResult<StreamPull> {
        match self.state {
            StreamState::Exhausted => self.rewind(),
            StreamState::Open { position } => self.read_at(position),
            StreamState::Closed => Err(AppError::Decoder(format!(
                "Stream {:?} is released",
                self.name
            ))),
        }
    }

    /// Next frame, rewinding transparently
    pub fn next_frame(&mut self) -> AppResult<RgbImage> {
        match self.next()? {
            StreamPull::Frame(frame) => Ok(frame),
            StreamPull::Rewound => match self.next()? {
                StreamPull::Frame(frame) => Ok(frame),
                StreamPull::Rewound => Err(AppError::Decoder(format!(
                    "Stream {:?} rewound without producing a frame",
                    self.name
                ))),
            },
        }
    }

    /// Close the decoder and forget the probe. Returns whether anything
    /// was open.
    pub fn release(&mut self) -> bool {
        let was_open = self.decoder.take().is_some();
        self.frame_count = None;
        self.state = StreamState::Closed;
        if was_open {
            log::debug!("Released stream {:?}", self.name);
        }
        was_open
    }

    fn read_at(&mut self, position: usize) -> AppResult<StreamPull> {
        let frame_count = self.frame_count.unwrap_or(0);
        let decoder = self.decoder.as_mut().ok_or_else(|| {
            AppError::Decoder(format!("Stream {:?} has no decoder", self.name))
        })?;

        match decoder.read_frame()? {
            Some(raw) => {
                let next = position + 1;
                self.state = if next >= frame_count {
                    StreamState::Exhausted
                } else {
                    StreamState::Open { position: next }
                };
                Ok(StreamPull::Frame(post_process_frame(raw, self.canonical)?))
            }
            None if position == 0 => Err(AppError::Decoder(format!(
                "No frame readable from {:?}",
                self.path
            ))),
            None => {
                log::debug!(
                    "Stream {:?} ended at frame {} of {}",
                    self.name,
                    position,
                    frame_count
                );
                self.rewind()
            }
        }
    }

    fn rewind(&mut self) -> AppResult<StreamPull> {
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.rewind()?;
        }
        self.state = StreamState::Open { position: 0 };
        Ok(StreamPull::Rewound)
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.release();
    }
}
