//! Codec trait and shared error types.
//!
//! The [`ImageCodec`] trait defines the two operations the engine needs from
//! the outside world: turn file bytes into a bitmap, and turn a bitmap into
//! file bytes at a given quality.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec), built on the
//! `image` and `webp` crates. Tests swap in a `MockCodec` with a predictable size curve.

use super::params::{ExportFormat, Quality};
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported image type: {0}")]
    UnsupportedFormat(String),
    #[error("Decoding failed: {0}")]
    Malformed(String),
    #[error("Image is {width}x{height}, larger than the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("Decode worker stopped before reporting a result")]
    WorkerLost,
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Encoding {format:?} failed: {reason}")]
    Failed {
        format: ExportFormat,
        reason: String,
    },
    #[error("Encode worker stopped before reporting a result")]
    WorkerLost,
}

/// Trait for image codecs.
///
/// `Send + Sync` because decode and encode jobs run on the rayon pool.
pub trait ImageCodec: Send + Sync {
    /// Decode file bytes of a known container format to RGBA8.
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> Result<RgbaImage, DecodeError>;

    /// Encode a bitmap. `quality` is ignored by lossless formats.
    fn encode(
        &self,
        bitmap: &RgbaImage,
        format: ExportFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EncodeError>;
}
