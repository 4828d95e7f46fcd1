// src/integrations/mod.rs
//
// External Integrations Module
//
// Seams to things this crate does not implement itself: video decoding
// (libav through ffmpeg-next) and synonym lookup.

pub mod thesaurus;
pub mod video;

pub use thesaurus::{NoThesaurus, Thesaurus, WordListThesaurus};
pub use video::{DecoderFactory, FfmpegDecoder, FfmpegDecoderFactory, FrameDecoder};
