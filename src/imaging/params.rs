//! Parameter types for editing and export operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`session`](crate::session) (which decides what the
//! user asked for) and the pixel code in [`operations`](super::operations),
//! [`export`](super::export) and the [`codec`](super::codec).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ExportFormat`]: Output container; knows its extension, MIME type and lossiness.
//! - [`FileSizeUnit`] / [`ExportSettings`]: Format, quality and optional size target.
//! - [`ResizeUnit`] / [`ResizeSettings`]: Target dimensions, aspect lock, crop-to-fill.
//! - [`CropRect`]: Crop rectangle in transformed-frame coordinates.
//! - [`Resample`]: Interpolation filter used by every resize.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Output container for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    #[default]
    Jpeg,
    Webp,
    Avif,
}

impl ExportFormat {
    /// Whether `quality` changes the encoded output.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg | Self::Webp | Self::Avif)
    }

    /// Lowercase name, as written in config files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    /// Guess the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }
}

/// Unit of [`ExportSettings::target_file_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSizeUnit {
    #[default]
    Kb,
    Mb,
}

impl FileSizeUnit {
    pub fn bytes_per_unit(self) -> f64 {
        match self {
            Self::Kb => 1024.0,
            Self::Mb => 1024.0 * 1024.0,
        }
    }
}

/// How the final bitmap is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportSettings {
    pub format: ExportFormat,
    /// Only meaningful for lossy formats.
    pub quality: Quality,
    /// Desired output size in `file_size_unit`s. `None` encodes once at `quality`.
    pub target_file_size: Option<f64>,
    pub file_size_unit: FileSizeUnit,
}

impl ExportSettings {
    /// The size target converted to bytes, if one is set.
    pub fn target_bytes(&self) -> Option<u64> {
        self.target_file_size
            .map(|size| (size * self.file_size_unit.bytes_per_unit()).round() as u64)
    }

    /// Reject a non-finite or non-positive size target.
    pub fn validate(&self) -> Result<(), String> {
        match self.target_file_size {
            Some(size) if !size.is_finite() || size <= 0.0 => Err(format!(
                "target file size must be a positive number, got {size}"
            )),
            _ => Ok(()),
        }
    }
}

/// Unit in which [`ResizeSettings`] width and height are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeUnit {
    #[default]
    Pixel,
    Percent,
}

/// Target dimensions for the resize stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResizeSettings {
    pub width: u32,
    pub height: u32,
    pub maintain_aspect_ratio: bool,
    pub unit: ResizeUnit,
    /// Cover the target and centre-crop instead of stretching.
    /// Ignored while `maintain_aspect_ratio` is set.
    #[serde(default)]
    pub crop_to_fill: bool,
}

impl ResizeSettings {
    /// Pixel-unit settings with the aspect lock on.
    pub fn pixels(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            maintain_aspect_ratio: true,
            unit: ResizeUnit::Pixel,
            crop_to_fill: false,
        }
    }

    /// Exact pixel dimensions, cover-scaled and centre-cropped.
    pub fn exact_fill(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            maintain_aspect_ratio: false,
            unit: ResizeUnit::Pixel,
            crop_to_fill: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "resize dimensions must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }

    /// Swap width and height, used when a quarter turn changes orientation.
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
            ..self
        }
    }
}

/// Crop rectangle in the coordinate space of the transformed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the rectangle is non-empty and lies inside a `frame_w` x `frame_h` frame.
    pub fn fits_within(&self, frame_w: u32, frame_h: u32) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.x) + u64::from(self.width) <= u64::from(frame_w)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(frame_h)
    }
}

/// Interpolation filter for resizes. Nearest-neighbour is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resample {
    /// Bilinear.
    Triangle,
    CatmullRom,
    #[default]
    Lanczos3,
}

impl Resample {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}
