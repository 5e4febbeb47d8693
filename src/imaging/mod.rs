//! Image processing on top of the `image` crate.
//!
//! | Stage | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory_with_format` → RGBA8 |
//! | **Filters** | per-pixel LUT/matrix passes on rayon, `imageops::blur`/`unsharpen` |
//! | **Transforms** | `imageops::rotate90`/`rotate270`/`flip_*` |
//! | **Crop / Resize** | `imageops::crop_imm`, `imageops::resize` (Lanczos3 by default) |
//! | **Encode** | PNG, JPEG, WebP (libwebp), AVIF (rav1e) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing edits and exports
//! - **Filters / Transform**: Pure bitmap → bitmap functions
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: The render pipeline combining the above
//! - **Export**: Encoding with the target-size quality search

mod calculations;
pub mod codec;
pub mod export;
pub mod filters;
pub mod operations;
mod params;
pub mod rust_codec;
pub mod transform;

pub use calculations::{
    calculate_fill_dimensions, resolve_resize_dimensions, transform_crop, transformed_dimensions,
};
pub use codec::{DecodeError, EncodeError, ImageCodec};
pub use export::{ExportOutcome, SearchPolicy, TargetSizeUnmet, export_bitmap};
pub use filters::{FilterKind, FilterSettings, apply_filters};
pub use operations::{EditRecipe, RenderError, RenderOptions, apply_resize, output_dimensions, render};
pub use params::{
    CropRect, ExportFormat, ExportSettings, FileSizeUnit, Quality, Resample, ResizeSettings,
    ResizeUnit,
};
pub use rust_codec::{RustCodec, format_for_mime, supported_mime_types};
pub use transform::{TransformOperation, apply_transform, apply_transforms};
