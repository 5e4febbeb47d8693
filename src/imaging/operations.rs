//! High-level image operations.
//!
//! These functions combine calculations with pixel work. The render pipeline
//! is declarative: the frame shown to the user is always recomputed from the
//! untouched original as
//!
//! ```text
//! resize(crop(transforms(filters(original))))
//! ```
//!
//! so the same [`EditRecipe`] always renders the same pixels, whatever order
//! the edits were made in.

use super::calculations::{
    calculate_fill_dimensions, center_offset, resolve_resize_dimensions, transformed_dimensions,
};
use super::filters::{FilterSettings, apply_filters};
use super::params::{CropRect, Resample, ResizeSettings};
use super::transform::{TransformOperation, apply_transforms};
use image::RgbaImage;
use image::imageops;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Crop {rect:?} does not fit a {frame_width}x{frame_height} frame")]
    CropOutOfBounds {
        rect: CropRect,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("Resize to {width}x{height} exceeds the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("Invalid resize settings: {0}")]
    InvalidResize(String),
}

/// Every setting that shapes the rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditRecipe {
    pub filters: FilterSettings,
    pub transforms: Vec<TransformOperation>,
    pub crop: Option<CropRect>,
    /// `None` keeps the native dimensions of the cropped frame.
    pub resize: Option<ResizeSettings>,
}

/// Knobs that do not belong to a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub resample: Resample,
    /// Upper bound for either output dimension.
    pub max_dimension: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resample: Resample::default(),
            max_dimension: 16_384,
        }
    }
}

/// Dimensions after transforms and crop, i.e. the input of the resize stage.
pub fn geometry_dimensions(original: (u32, u32), recipe: &EditRecipe) -> (u32, u32) {
    if let Some(crop) = recipe.crop {
        return (crop.width, crop.height);
    }
    recipe
        .transforms
        .iter()
        .fold(original, |(w, h), op| transformed_dimensions(w, h, *op))
}

/// Final output dimensions of `recipe` applied to an `original`-sized bitmap.
pub fn output_dimensions(original: (u32, u32), recipe: &EditRecipe) -> (u32, u32) {
    let geometry = geometry_dimensions(original, recipe);
    match &recipe.resize {
        Some(settings) => resolve_resize_dimensions(geometry, settings),
        None => geometry,
    }
}

/// Check a recipe against the original's dimensions without touching pixels.
pub fn validate_recipe(
    original: (u32, u32),
    recipe: &EditRecipe,
    options: &RenderOptions,
) -> Result<(), RenderError> {
    if let Some(rect) = recipe.crop {
        let (frame_width, frame_height) = recipe
            .transforms
            .iter()
            .fold(original, |(w, h), op| transformed_dimensions(w, h, *op));
        if !rect.fits_within(frame_width, frame_height) {
            return Err(RenderError::CropOutOfBounds {
                rect,
                frame_width,
                frame_height,
            });
        }
    }
    if let Some(settings) = &recipe.resize {
        settings.validate().map_err(RenderError::InvalidResize)?;
        let (width, height) = output_dimensions(original, recipe);
        if width > options.max_dimension || height > options.max_dimension {
            return Err(RenderError::TooLarge {
                width,
                height,
                max: options.max_dimension,
            });
        }
    }
    Ok(())
}

/// Render a recipe from the original bitmap.
pub fn render(
    original: &RgbaImage,
    recipe: &EditRecipe,
    options: &RenderOptions,
) -> Result<RgbaImage, RenderError> {
    validate_recipe(original.dimensions(), recipe, options)?;

    let filtered = apply_filters(original, &recipe.filters);
    let transformed = if recipe.transforms.is_empty() {
        filtered
    } else {
        apply_transforms(&filtered, &recipe.transforms)
    };
    let cropped = match recipe.crop {
        Some(rect) => apply_crop(&transformed, rect),
        None => transformed,
    };
    let frame = match &recipe.resize {
        Some(settings) => apply_resize(&cropped, settings, options.resample),
        None => cropped,
    };

    trace!(
        width = frame.width(),
        height = frame.height(),
        transforms = recipe.transforms.len(),
        "rendered frame"
    );
    Ok(frame)
}

/// Copy out a rectangle. The caller guarantees it fits.
pub fn apply_crop(bitmap: &RgbaImage, rect: CropRect) -> RgbaImage {
    imageops::crop_imm(bitmap, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Resize to the dimensions `settings` resolve to for this bitmap.
///
/// With `crop_to_fill` (and no aspect lock) the bitmap is scaled to cover the
/// target, then centre-cropped to the exact dimensions.
pub fn apply_resize(bitmap: &RgbaImage, settings: &ResizeSettings, resample: Resample) -> RgbaImage {
    let source = bitmap.dimensions();
    let target = resolve_resize_dimensions(source, settings);
    if target == source {
        return bitmap.clone();
    }
    let filter = resample.filter_type();

    if settings.crop_to_fill && !settings.maintain_aspect_ratio {
        let (fill_w, fill_h) = calculate_fill_dimensions(source, target);
        let filled = if (fill_w, fill_h) == source {
            bitmap.clone()
        } else {
            imageops::resize(bitmap, fill_w, fill_h, filter)
        };
        let x = center_offset(fill_w, target.0);
        let y = center_offset(fill_h, target.1);
        return imageops::crop_imm(&filled, x, y, target.0, target.1).to_image();
    }

    imageops::resize(bitmap, target.0, target.1, filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::filters::FilterKind;
    use crate::imaging::params::ResizeUnit;
    use crate::test_helpers::gradient;

    #[test]
    fn empty_recipe_renders_original() {
        let original = gradient(30, 20);
        let frame = render(&original, &EditRecipe::default(), &RenderOptions::default()).unwrap();
        assert_eq!(frame, original);
    }

    #[test]
    fn render_applies_stages_in_fixed_order() {
        let original = gradient(40, 20);
        let recipe = EditRecipe {
            filters: FilterSettings::default().with(FilterKind::Brightness, 70),
            transforms: vec![TransformOperation::RotateRight],
            crop: Some(CropRect::new(0, 0, 20, 30)),
            resize: Some(ResizeSettings::pixels(10, 15)),
        };
        let frame = render(&original, &recipe, &RenderOptions::default()).unwrap();
        assert_eq!(frame.dimensions(), (10, 15));

        let by_hand = apply_resize(
            &apply_crop(
                &apply_transforms(
                    &apply_filters(&original, &recipe.filters),
                    &recipe.transforms,
                ),
                CropRect::new(0, 0, 20, 30),
            ),
            &ResizeSettings::pixels(10, 15),
            Resample::default(),
        );
        assert_eq!(frame, by_hand);
    }

    #[test]
    fn crop_is_checked_against_transformed_frame() {
        let original = gradient(40, 20);
        let recipe = EditRecipe {
            transforms: vec![TransformOperation::RotateLeft],
            crop: Some(CropRect::new(0, 0, 40, 20)),
            ..Default::default()
        };
        let err = render(&original, &recipe, &RenderOptions::default()).unwrap_err();
        assert_eq!(
            err,
            RenderError::CropOutOfBounds {
                rect: CropRect::new(0, 0, 40, 20),
                frame_width: 20,
                frame_height: 40,
            }
        );
    }

    #[test]
    fn resize_beyond_limit_is_rejected() {
        let options = RenderOptions {
            max_dimension: 100,
            ..Default::default()
        };
        let recipe = EditRecipe {
            resize: Some(ResizeSettings::pixels(200, 10)),
            ..Default::default()
        };
        let result = validate_recipe((50, 50), &recipe, &options);
        assert!(matches!(result, Err(RenderError::TooLarge { width: 200, .. })));
    }

    #[test]
    fn zero_resize_is_rejected() {
        let recipe = EditRecipe {
            resize: Some(ResizeSettings::pixels(0, 10)),
            ..Default::default()
        };
        let result = validate_recipe((50, 50), &recipe, &RenderOptions::default());
        assert!(matches!(result, Err(RenderError::InvalidResize(_))));
    }

    #[test]
    fn resize_aspect_lock_matches_rounding() {
        let bitmap = gradient(300, 200);
        let out = apply_resize(&bitmap, &ResizeSettings::pixels(100, 200), Resample::Triangle);
        // r = 1.5, 100 / 1.5 = 66.67 → 67
        assert_eq!(out.dimensions(), (100, 67));
    }

    #[test]
    fn resize_percent_upscale() {
        let bitmap = gradient(40, 30);
        let settings = ResizeSettings {
            unit: ResizeUnit::Percent,
            ..ResizeSettings::pixels(150, 150)
        };
        let out = apply_resize(&bitmap, &settings, Resample::CatmullRom);
        assert_eq!(out.dimensions(), (60, 45));
    }

    #[test]
    fn crop_to_fill_hits_exact_dimensions() {
        let bitmap = gradient(160, 90);
        let out = apply_resize(&bitmap, &ResizeSettings::exact_fill(50, 50), Resample::Lanczos3);
        assert_eq!(out.dimensions(), (50, 50));
    }

    #[test]
    fn stretch_without_lock_hits_exact_dimensions() {
        let bitmap = gradient(160, 90);
        let settings = ResizeSettings {
            maintain_aspect_ratio: false,
            ..ResizeSettings::pixels(33, 77)
        };
        assert_eq!(apply_resize(&bitmap, &settings, Resample::Lanczos3).dimensions(), (33, 77));
    }

    #[test]
    fn output_dimensions_follow_rotation_then_crop() {
        let recipe = EditRecipe {
            transforms: vec![TransformOperation::RotateRight],
            ..Default::default()
        };
        assert_eq!(output_dimensions((40, 20), &recipe), (20, 40));

        let cropped = EditRecipe {
            crop: Some(CropRect::new(2, 2, 10, 5)),
            ..recipe
        };
        assert_eq!(output_dimensions((40, 20), &cropped), (10, 5));
    }
}
