//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropRect, ResizeSettings, ResizeUnit};
use super::transform::TransformOperation;

/// Resolve resize settings to concrete pixel dimensions for a source frame.
///
/// Percent units are resolved against `source` first. With the aspect lock on,
/// the dimension with the larger relative change drives (width wins ties) and
/// the other is derived from the source aspect ratio.
///
/// # Examples
/// ```
/// # use retouch::imaging::{resolve_resize_dimensions, ResizeSettings};
/// // 800x600 source, width asked to halve, height untouched → width drives
/// let settings = ResizeSettings::pixels(400, 600);
/// assert_eq!(resolve_resize_dimensions((800, 600), &settings), (400, 300));
/// ```
pub fn resolve_resize_dimensions(source: (u32, u32), settings: &ResizeSettings) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (req_w, req_h) = match settings.unit {
        ResizeUnit::Pixel => (settings.width, settings.height),
        ResizeUnit::Percent => (
            scale_by_percent(src_w, settings.width),
            scale_by_percent(src_h, settings.height),
        ),
    };

    if !settings.maintain_aspect_ratio || src_w == 0 || src_h == 0 {
        return (req_w.max(1), req_h.max(1));
    }

    let width_change = (req_w as f64 / src_w as f64 - 1.0).abs();
    let height_change = (req_h as f64 / src_h as f64 - 1.0).abs();
    let aspect = src_w as f64 / src_h as f64;

    if width_change >= height_change {
        let h = (req_w as f64 / aspect).round() as u32;
        (req_w.max(1), h.max(1))
    } else {
        let w = (req_h as f64 * aspect).round() as u32;
        (w.max(1), req_h.max(1))
    }
}

fn scale_by_percent(value: u32, percent: u32) -> u32 {
    ((value as f64 * percent as f64 / 100.0).round() as u32).max(1)
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Offset that centres a `target` span inside a `filled` span.
pub fn center_offset(filled: u32, target: u32) -> u32 {
    filled.saturating_sub(target) / 2
}

/// Dimensions of a `width` x `height` frame after a transform.
pub fn transformed_dimensions(width: u32, height: u32, op: TransformOperation) -> (u32, u32) {
    if op.swaps_dimensions() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Map a crop rectangle through a transform so it keeps covering the same pixels.
///
/// `frame_w` x `frame_h` are the dimensions of the frame *before* `op`.
pub fn transform_crop(rect: CropRect, frame_w: u32, frame_h: u32, op: TransformOperation) -> CropRect {
    let CropRect {
        x,
        y,
        width,
        height,
    } = rect;
    match op {
        // Clockwise: (x, y) → (H - 1 - y, x)
        TransformOperation::RotateRight => {
            CropRect::new(frame_h.saturating_sub(y + height), x, height, width)
        }
        // Counter-clockwise: (x, y) → (y, W - 1 - x)
        TransformOperation::RotateLeft => {
            CropRect::new(y, frame_w.saturating_sub(x + width), height, width)
        }
        TransformOperation::FlipHorizontal => {
            CropRect::new(frame_w.saturating_sub(x + width), y, width, height)
        }
        TransformOperation::FlipVertical => {
            CropRect::new(x, frame_h.saturating_sub(y + height), width, height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // resolve_resize_dimensions tests
    // =========================================================================

    #[test]
    fn resize_without_lock_is_exact() {
        let settings = ResizeSettings {
            maintain_aspect_ratio: false,
            ..ResizeSettings::pixels(123, 45)
        };
        assert_eq!(resolve_resize_dimensions((800, 600), &settings), (123, 45));
    }

    #[test]
    fn resize_lock_width_drives() {
        // 800x600 (4:3), width 400 → height 300
        let settings = ResizeSettings::pixels(400, 600);
        assert_eq!(resolve_resize_dimensions((800, 600), &settings), (400, 300));
    }

    #[test]
    fn resize_lock_height_drives() {
        // 800x600, height 1200 is a +100% change, width +0% → height drives
        let settings = ResizeSettings::pixels(800, 1200);
        assert_eq!(resolve_resize_dimensions((800, 600), &settings), (1600, 1200));
    }

    #[test]
    fn resize_lock_rounds_derived_dimension() {
        // 1001x500, width 500 → 500 / (1001/500) = 249.75 → 250
        let settings = ResizeSettings::pixels(500, 500);
        assert_eq!(resolve_resize_dimensions((1001, 500), &settings), (500, 250));
    }

    #[test]
    fn resize_lock_tie_prefers_width() {
        // Both halve: width drives, same result either way
        let settings = ResizeSettings::pixels(400, 300);
        assert_eq!(resolve_resize_dimensions((800, 600), &settings), (400, 300));
    }

    #[test]
    fn resize_percent_resolves_against_source() {
        let settings = ResizeSettings {
            unit: ResizeUnit::Percent,
            maintain_aspect_ratio: false,
            ..ResizeSettings::pixels(50, 25)
        };
        assert_eq!(resolve_resize_dimensions((800, 600), &settings), (400, 150));
    }

    #[test]
    fn resize_percent_never_reaches_zero() {
        let settings = ResizeSettings {
            unit: ResizeUnit::Percent,
            ..ResizeSettings::pixels(1, 1)
        };
        assert_eq!(resolve_resize_dimensions((10, 10), &settings), (1, 1));
    }

    // =========================================================================
    // calculate_fill_dimensions tests
    // =========================================================================

    #[test]
    fn fill_wider_source_to_portrait_target() {
        // 800x600 (4:3) → 400x500 target
        // Source is wider, so height matches: 500, width = 500 * (4/3) = 667
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 500)), (667, 500));
    }

    #[test]
    fn fill_taller_source_to_landscape_target() {
        assert_eq!(calculate_fill_dimensions((600, 800), (500, 400)), (500, 667));
    }

    #[test]
    fn fill_same_aspect_ratio() {
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 300)), (400, 300));
    }

    #[test]
    fn fill_square_target() {
        // Instagram post from a 1920x1080 frame
        assert_eq!(
            calculate_fill_dimensions((1920, 1080), (1080, 1080)),
            (1920, 1080)
        );
    }

    #[test]
    fn center_offset_halves_excess() {
        assert_eq!(center_offset(667, 400), 133);
        assert_eq!(center_offset(400, 400), 0);
        assert_eq!(center_offset(300, 400), 0);
    }

    // =========================================================================
    // transform_crop tests
    // =========================================================================

    #[test]
    fn crop_follows_rotate_right() {
        // 4x2 frame, crop the top-left 1x1 → after clockwise turn it sits top-right of a 2x4 frame
        let rect = CropRect::new(0, 0, 1, 1);
        assert_eq!(
            transform_crop(rect, 4, 2, TransformOperation::RotateRight),
            CropRect::new(1, 0, 1, 1)
        );
    }

    #[test]
    fn crop_follows_rotate_left() {
        // Top-left of a 4x2 frame ends bottom-left of the 2x4 frame
        let rect = CropRect::new(0, 0, 1, 1);
        assert_eq!(
            transform_crop(rect, 4, 2, TransformOperation::RotateLeft),
            CropRect::new(0, 3, 1, 1)
        );
    }

    #[test]
    fn crop_swaps_extent_on_rotation() {
        let rect = CropRect::new(1, 0, 3, 2);
        let rotated = transform_crop(rect, 4, 2, TransformOperation::RotateRight);
        assert_eq!((rotated.width, rotated.height), (2, 3));
        assert!(rotated.fits_within(2, 4));
    }

    #[test]
    fn crop_follows_flips() {
        let rect = CropRect::new(1, 1, 2, 1);
        assert_eq!(
            transform_crop(rect, 5, 3, TransformOperation::FlipHorizontal),
            CropRect::new(2, 1, 2, 1)
        );
        assert_eq!(
            transform_crop(rect, 5, 3, TransformOperation::FlipVertical),
            CropRect::new(1, 1, 2, 1)
        );
    }

    #[test]
    fn transformed_dimensions_swap_on_quarter_turns() {
        assert_eq!(
            transformed_dimensions(4, 2, TransformOperation::RotateLeft),
            (2, 4)
        );
        assert_eq!(
            transformed_dimensions(4, 2, TransformOperation::FlipVertical),
            (4, 2)
        );
    }
}
