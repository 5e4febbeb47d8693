//! Shared test utilities.
//!
//! Synthetic bitmaps and in-memory encoders so tests never depend on fixture
//! files.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let bitmap = gradient(64, 48);
//! let png = encode_png(&bitmap);
//! let jpeg = encode_jpeg(&noise(64, 48, 7), 80);
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, Rgba, RgbaImage};

// =========================================================================
// Synthetic bitmaps
// =========================================================================

/// Opaque gradient: red follows x, green follows y, blue is fixed.
///
/// Every pixel differs from its neighbours, so rotations and flips are
/// distinguishable.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8;
        let g = (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8;
        Rgba([r, g, 96, 255])
    })
}

/// Deterministic opaque noise. Compresses poorly, which makes encoded size
/// track quality.
pub fn noise(width: u32, height: u32, seed: u32) -> RgbaImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    RgbaImage::from_fn(width, height, |_, _| {
        let mut next = || {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        Rgba([next(), next(), next(), 255])
    })
}

// =========================================================================
// Encoders
// =========================================================================

pub fn encode_png(bitmap: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    out
}

pub fn encode_jpeg(bitmap: &RgbaImage, quality: u8) -> Vec<u8> {
    let rgb = DynamicImage::ImageRgba8(bitmap.clone()).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    out
}
