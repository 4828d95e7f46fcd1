// src/integrations/video/ffmpeg.rs
//
// libav decoder (ffmpeg-next).
//
// - One input context and one video decoder per open handle
// - The frame count comes from the container header, or from a packet scan
//   when the header has none
// - Frames are scaled to BGR24 at source resolution
// - Rewinding seeks the input to 0 and flushes the decoder; nothing reopens

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ffmpeg_next as ffmpeg;

use super::{DecoderFactory, FrameDecoder};
use crate::error::{AppError, AppResult};
use crate::infrastructure::RawFrame;

fn decoder_error(context: &str, path: &Path, e: ffmpeg::Error) -> AppError {
    AppError::Decoder(format!("{} {:?}: {}", context, path, e))
}

/// Opens libav decode handles.
#[derive(Debug, Clone, Default)]
pub struct FfmpegDecoderFactory;

impl FfmpegDecoderFactory {
    pub fn new() -> Self {
        Self
    }

    fn init() -> AppResult<()> {
        static INIT: OnceLock<Result<(), String>> = OnceLock::new();
        INIT.get_or_init(|| ffmpeg::init().map_err(|e| e.to_string()))
            .clone()
            .map_err(|e| AppError::Decoder(format!("Failed to initialize FFmpeg: {}", e)))
    }
}

impl DecoderFactory for FfmpegDecoderFactory {
    fn open(&self, path: &Path) -> AppResult<Box<dyn FrameDecoder>> {
        if !path.exists() {
            return Err(AppError::NotFound(path.display().to_string()));
        }
        Self::init()?;
        Ok(Box::new(FfmpegDecoder::open(path)?))
    }
}

/// One open video: input context, decoder and BGR24 scaler.
pub struct FfmpegDecoder {
    path: PathBuf,
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_index: usize,
    frame_count: usize,
    draining: bool,
}

impl FfmpegDecoder {
    fn open(path: &Path) -> AppResult<Self> {
        let mut input =
            ffmpeg::format::input(path).map_err(|e| decoder_error("Failed to open", path, e))?;

        let (stream_index, header_frames, parameters) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| AppError::Decoder(format!("No video stream in {:?}", path)))?;
            (stream.index(), stream.frames(), stream.parameters())
        };

        let decoder = ffmpeg::codec::context::Context::from_parameters(parameters)
            .and_then(|context| context.decoder().video())
            .map_err(|e| decoder_error("No usable video decoder for", path, e))?;

        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(AppError::Decoder(format!(
                "Unknown resolution for {:?}",
                path
            )));
        }

        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::format::Pixel::BGR24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| decoder_error("Failed to create scaler for", path, e))?;

        let frame_count = match usize::try_from(header_frames) {
            Ok(count) if count > 0 => count,
            _ => count_packets(&mut input, stream_index, path)?,
        };

        log::debug!(
            "Opened {:?}: {}x{}, {} frames",
            path,
            width,
            height,
            frame_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            input,
            decoder,
            scaler,
            stream_index,
            frame_count,
            draining: false,
        })
    }

    fn convert(&mut self, decoded: &ffmpeg::frame::Video) -> AppResult<RawFrame> {
        let mut bgr = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut bgr)
            .map_err(|e| decoder_error("Failed to scale frame from", &self.path, e))?;

        let (width, height) = (bgr.width(), bgr.height());
        Ok(RawFrame {
            width,
            height,
            bgr: pack_rows(bgr.data(0), bgr.stride(0), width as usize * 3, height as usize),
        })
    }
}

/// Count video packets, then seek back to the start.
fn count_packets(
    input: &mut ffmpeg::format::context::Input,
    stream_index: usize,
    path: &Path,
) -> AppResult<usize> {
    let count = input
        .packets()
        .filter(|(stream, _)| stream.index() == stream_index)
        .count();
    input
        .seek(0, ..)
        .map_err(|e| decoder_error("Failed to seek", path, e))?;
    Ok(count)
}

/// Drop per-row padding from a plane with `stride` bytes per row.
fn pack_rows(data: &[u8], stride: usize, row_len: usize, rows: usize) -> Vec<u8> {
    if stride == row_len {
        return data[..row_len * rows].to_vec();
    }
    data.chunks(stride)
        .take(rows)
        .flat_map(|row| &row[..row_len])
        .copied()
        .collect()
}

impl FrameDecoder for FfmpegDecoder {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_frame(&mut self) -> AppResult<Option<RawFrame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.convert(&decoded).map(Some);
            }
            if self.draining {
                return Ok(None);
            }

            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == self.stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|e| decoder_error("Failed to decode", &self.path, e))?;
                    }
                }
                None => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| decoder_error("Failed to drain", &self.path, e))?;
                    self.draining = true;
                }
            }
        }
    }

    fn rewind(&mut self) -> AppResult<()> {
        self.input
            .seek(0, ..)
            .map_err(|e| decoder_error("Failed to rewind", &self.path, e))?;
        self.decoder.flush();
        self.draining = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rows_strips_padding() {
        // 2 pixels per row (6 bytes) padded to 8
        let data = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
        assert_eq!(
            pack_rows(&data, 8, 6, 2),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn test_pack_rows_without_padding() {
        let data = [1, 2, 3, 4, 5, 6, 99];
        assert_eq!(pack_rows(&data, 3, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_open_missing_file_is_not_found() {
        let factory = FfmpegDecoderFactory::new();
        let result = factory.open(Path::new("/definitely/not/here.mp4"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_open_garbage_is_a_decoder_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"this is not a video").unwrap();

        let result = FfmpegDecoderFactory::new().open(&path);
        assert!(matches!(result, Err(AppError::Decoder(_))));
    }
}
