// src/infrastructure/imaging.rs
//
// Pixel work shared by the catalogs, the importer and the media stream.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};

use crate::error::{AppError, AppResult};

/// Gray level above which a token pixel counts as background
const BACKGROUND_THRESHOLD: u8 = 250;

/// Sigma of the blur that softens the token matte edge
const MATTE_BLUR_SIGMA: f32 = 2.0;

/// One undecoded frame as handed over by a decoder: packed BGR, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub bgr: Vec<u8>,
}

/// Decode a preview image and scale it to `size`.
pub fn load_thumbnail(path: &Path, size: (u32, u32)) -> AppResult<RgbaImage> {
    let decoded = image::open(path)?;
    Ok(decoded
        .resize_exact(size.0, size.1, FilterType::Triangle)
        .to_rgba8())
}

/// Decode a token image and matte out its near-white background.
pub fn load_token_image(path: &Path) -> AppResult<RgbaImage> {
    let decoded = image::open(path)?;
    Ok(remove_background(&decoded))
}

pub fn save_png(frame: &RgbImage, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    DynamicImage::ImageRgb8(frame.clone()).save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Build an alpha matte that hides the near-white background of a token.
///
/// Threshold, open, close, blur, then a contrast stretch so the soft edge
/// stays narrow.
pub fn remove_background(source: &DynamicImage) -> RgbaImage {
    let gray = source.to_luma8();
    let foreground = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > BACKGROUND_THRESHOLD {
            Luma([0])
        } else {
            Luma([255])
        }
    });

    let opened = dilate(&erode(&foreground));
    let closed = erode(&dilate(&opened));
    let softened = imageops::blur(&closed, MATTE_BLUR_SIGMA);

    let mut out = source.to_rgba8();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let m = softened.get_pixel(x, y)[0] as i32;
        pixel[3] = (2 * m - 255).clamp(0, 255) as u8;
    }
    out
}

fn erode(mask: &GrayImage) -> GrayImage {
    neighborhood(mask, |a, b| a.min(b), u8::MAX)
}

fn dilate(mask: &GrayImage) -> GrayImage {
    neighborhood(mask, |a, b| a.max(b), u8::MIN)
}

/// 3x3 neighborhood fold; pixels outside the image are ignored
fn neighborhood(mask: &GrayImage, fold: impl Fn(u8, u8) -> u8, init: u8) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut acc = init;
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                acc = fold(acc, mask.get_pixel(nx, ny)[0]);
            }
        }
        Luma([acc])
    })
}

/// Reorder BGR to RGB.
pub fn bgr_to_rgb(frame: RawFrame) -> AppResult<RgbImage> {
    let RawFrame { width, height, mut bgr } = frame;
    for pixel in bgr.chunks_exact_mut(3) {
        pixel.swap(0, 2);
    }
    RgbImage::from_raw(width, height, bgr).ok_or_else(|| {
        AppError::Decoder(format!(
            "Frame buffer does not match {}x{} BGR dimensions",
            width, height
        ))
    })
}

/// Fixed per-frame pipeline: BGR to RGB, resize to the canonical
/// resolution when the source differs, rotate 90 degrees counter-clockwise,
/// flip vertically.
pub fn post_process_frame(frame: RawFrame, canonical: (u32, u32)) -> AppResult<RgbImage> {
    let mut rgb = bgr_to_rgb(frame)?;
    if rgb.dimensions() != canonical {
        rgb = imageops::resize(&rgb, canonical.0, canonical.1, FilterType::Triangle);
    }
    let rotated = imageops::rotate270(&rgb);
    Ok(imageops::flip_vertical(&rotated))
}
