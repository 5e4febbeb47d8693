//! Built-in codec, no system libraries.
//!
//! Everything is statically linked into the binary. WebP encoding goes
//! through libwebp, which `webp` builds from source.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory_with_format` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha dropped) |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e) |

use super::codec::{DecodeError, EncodeError, ImageCodec};
use super::params::{ExportFormat, Quality};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use std::sync::LazyLock;

/// MIME types whose decoders are compiled in and known to work.
///
/// AVIF is deliberately excluded: the `image` crate's `"avif"` feature only
/// enables the **encoder** (rav1e).
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("image/png", ImageFormat::Png),
    ("image/jpeg", ImageFormat::Jpeg),
    ("image/jpg", ImageFormat::Jpeg),
    ("image/pjpeg", ImageFormat::Jpeg),
    ("image/webp", ImageFormat::WebP),
    ("image/tiff", ImageFormat::Tiff),
];

static SUPPORTED_MIME_TYPES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(mime, _)| *mime)
        .collect()
});

/// Returns the MIME types that have working decoders compiled in.
pub fn supported_mime_types() -> &'static [&'static str] {
    &SUPPORTED_MIME_TYPES
}

/// Map a declared MIME type (parameters and case ignored) to a decodable format.
pub fn format_for_mime(mime_type: &str) -> Result<ImageFormat, DecodeError> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    INPUT_CANDIDATES
        .iter()
        .find(|(mime, fmt)| *mime == essence && fmt.reading_enabled())
        .map(|(_, fmt)| *fmt)
        .ok_or_else(|| DecodeError::UnsupportedFormat(mime_type.to_string()))
}

/// Codec built on the `image` crate, plus `webp` for lossy WebP.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec {
    /// rav1e speed preset, 1 (slowest) to 10 (fastest).
    avif_speed: u8,
}

impl RustCodec {
    pub fn new() -> Self {
        Self { avif_speed: 6 }
    }

    pub fn with_avif_speed(speed: u8) -> Self {
        Self {
            avif_speed: speed.clamp(1, 10),
        }
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_failed(format: ExportFormat) -> impl FnOnce(image::ImageError) -> EncodeError {
    move |e| EncodeError::Failed {
        format,
        reason: e.to_string(),
    }
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> Result<RgbaImage, DecodeError> {
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| DecodeError::Malformed(format!("{format:?}: {e}")))?;
        Ok(decoded.into_rgba8())
    }

    fn encode(
        &self,
        bitmap: &RgbaImage,
        format: ExportFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EncodeError> {
        let (width, height) = bitmap.dimensions();
        let mut out = Vec::new();
        match format {
            ExportFormat::Png => PngEncoder::new(&mut out)
                .write_image(bitmap.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_failed(format))?,
            ExportFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(bitmap.clone()).into_rgb8();
                JpegEncoder::new_with_quality(&mut out, quality.value() as u8)
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(encode_failed(format))?
            }
            ExportFormat::Webp => {
                // image's own WebP encoder is lossless only
                let encoded = webp::Encoder::from_rgba(bitmap.as_raw(), width, height)
                    .encode_simple(false, quality.value() as f32)
                    .map_err(|e| EncodeError::Failed {
                        format,
                        reason: format!("{e:?}"),
                    })?;
                out.extend_from_slice(&encoded);
            }
            ExportFormat::Avif => {
                AvifEncoder::new_with_speed_quality(&mut out, self.avif_speed, quality.value() as u8)
                    .write_image(bitmap.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_failed(format))?
            }
        }
        Ok(out)
    }
}
