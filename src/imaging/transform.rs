//! Discrete geometric transforms.
//!
//! Rotations are exact quarter turns (pixel moves, no interpolation) and flips
//! mirror one axis. A transform list is replayed in order on every render.

use image::RgbaImage;
use image::imageops;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformOperation {
    /// 90° counter-clockwise.
    RotateLeft,
    /// 90° clockwise.
    RotateRight,
    FlipHorizontal,
    FlipVertical,
}

impl TransformOperation {
    pub const ALL: [TransformOperation; 4] = [
        Self::RotateLeft,
        Self::RotateRight,
        Self::FlipHorizontal,
        Self::FlipVertical,
    ];

    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::RotateLeft | Self::RotateRight)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RotateLeft => "rotate left",
            Self::RotateRight => "rotate right",
            Self::FlipHorizontal => "flip horizontal",
            Self::FlipVertical => "flip vertical",
        }
    }
}

pub fn apply_transform(bitmap: &RgbaImage, op: TransformOperation) -> RgbaImage {
    match op {
        TransformOperation::RotateLeft => imageops::rotate270(bitmap),
        TransformOperation::RotateRight => imageops::rotate90(bitmap),
        TransformOperation::FlipHorizontal => imageops::flip_horizontal(bitmap),
        TransformOperation::FlipVertical => imageops::flip_vertical(bitmap),
    }
}

/// Apply `ops` in sequence order. An empty list returns a copy of `bitmap`.
pub fn apply_transforms(bitmap: &RgbaImage, ops: &[TransformOperation]) -> RgbaImage {
    let Some((first, rest)) = ops.split_first() else {
        return bitmap.clone();
    };
    rest.iter()
        .fold(apply_transform(bitmap, *first), |acc, op| {
            apply_transform(&acc, *op)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 3x2 image where every pixel encodes its own coordinates.
    fn coordinate_image() -> RgbaImage {
        RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn rotate_right_swaps_dimensions_and_moves_corner() {
        let rotated = apply_transform(&coordinate_image(), TransformOperation::RotateRight);
        assert_eq!(rotated.dimensions(), (2, 3));
        // Bottom-left source pixel (0, 1) becomes the top-left after a clockwise turn
        assert_eq!(rotated.get_pixel(0, 0), &Rgba([0, 1, 0, 255]));
    }

    #[test]
    fn rotate_left_moves_top_right_to_top_left() {
        let rotated = apply_transform(&coordinate_image(), TransformOperation::RotateLeft);
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(rotated.get_pixel(0, 0), &Rgba([2, 0, 0, 255]));
    }

    #[test]
    fn flips_mirror_one_axis() {
        let h = apply_transform(&coordinate_image(), TransformOperation::FlipHorizontal);
        assert_eq!(h.get_pixel(0, 0), &Rgba([2, 0, 0, 255]));
        let v = apply_transform(&coordinate_image(), TransformOperation::FlipVertical);
        assert_eq!(v.get_pixel(0, 0), &Rgba([0, 1, 0, 255]));
    }

    #[test]
    fn opposite_rotations_cancel() {
        let source = coordinate_image();
        let result = apply_transforms(
            &source,
            &[TransformOperation::RotateLeft, TransformOperation::RotateRight],
        );
        assert_eq!(result, source);
    }

    #[test]
    fn four_right_turns_are_identity() {
        let source = coordinate_image();
        let result = apply_transforms(&source, &[TransformOperation::RotateRight; 4]);
        assert_eq!(result, source);
    }

    #[test]
    fn sequence_order_matters() {
        let source = coordinate_image();
        let a = apply_transforms(
            &source,
            &[TransformOperation::RotateRight, TransformOperation::FlipHorizontal],
        );
        let b = apply_transforms(
            &source,
            &[TransformOperation::FlipHorizontal, TransformOperation::RotateRight],
        );
        assert_ne!(a, b);
    }

    #[test]
    fn empty_sequence_is_a_copy() {
        let source = coordinate_image();
        assert_eq!(apply_transforms(&source, &[]), source);
    }
}
