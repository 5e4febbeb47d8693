//! Adjustable filters applied in a fixed order.
//!
//! Every filter takes a value in `0..=100` with 50 as the neutral point. The
//! value maps to a strength `s = (value - 50) / 50` in `[-1, 1]`:
//!
//! | Order | Filter | Transfer |
//! |---|---|---|
//! | 1 | Brightness | `c * (1 + s)` |
//! | 2 | Contrast | `(c - 127.5) * (1 + s) + 127.5` |
//! | 3 | Saturation | `luma + (c - luma) * (1 + s)` (Rec. 709 luma) |
//! | 4 | Hue | rotate by `s * 180°` |
//! | 5 | Warmth | red `+ 40s`, blue `- 40s` |
//! | 6 | Sharpness | blur (`s < 0`, sigma `-4s`) or unsharp mask (`s > 0`, sigma `2s`) |
//!
//! The order is part of the contract: the same settings always render the
//! same pixels, no matter which slider the user touched first. Each pass
//! rounds and clamps to `0..=255`, and neutral filters are skipped entirely.

use image::RgbaImage;
use image::imageops;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NEUTRAL: u8 = 50;
pub const MAX_VALUE: u8 = 100;

const WARMTH_SHIFT: f32 = 40.0;
const MAX_BLUR_SIGMA: f32 = 4.0;
const MAX_SHARPEN_SIGMA: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Warmth,
    Sharpness,
}

impl FilterKind {
    /// All filters, in application order.
    pub const ALL: [FilterKind; 6] = [
        Self::Brightness,
        Self::Contrast,
        Self::Saturation,
        Self::Hue,
        Self::Warmth,
        Self::Sharpness,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Hue => "hue",
            Self::Warmth => "warmth",
            Self::Sharpness => "sharpness",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per [`FilterKind`], always fully populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSettings {
    values: [u8; FilterKind::ALL.len()],
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            values: [NEUTRAL; FilterKind::ALL.len()],
        }
    }
}

impl FilterSettings {
    pub fn get(&self, kind: FilterKind) -> u8 {
        self.values[kind.index()]
    }

    /// Set a filter value. Returns `false` (and changes nothing) when `value > 100`.
    pub fn set(&mut self, kind: FilterKind, value: u8) -> bool {
        if value > MAX_VALUE {
            return false;
        }
        self.values[kind.index()] = value;
        true
    }

    pub fn with(mut self, kind: FilterKind, value: u8) -> Self {
        self.set(kind, value);
        self
    }

    pub fn is_neutral(&self) -> bool {
        self.values.iter().all(|&v| v == NEUTRAL)
    }

    /// `(kind, value)` pairs in application order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKind, u8)> + '_ {
        FilterKind::ALL.iter().map(|&kind| (kind, self.get(kind)))
    }
}

fn strength(value: u8) -> f32 {
    (value as f32 - NEUTRAL as f32) / NEUTRAL as f32
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Apply every non-neutral filter to a copy of `source`, in [`FilterKind::ALL`] order.
pub fn apply_filters(source: &RgbaImage, settings: &FilterSettings) -> RgbaImage {
    let mut image = source.clone();
    for (kind, value) in settings.iter() {
        if value == NEUTRAL {
            continue;
        }
        let s = strength(value);
        match kind {
            FilterKind::Brightness => {
                map_with_lut(&mut image, &build_lut(|c| c * (1.0 + s)));
            }
            FilterKind::Contrast => {
                map_with_lut(&mut image, &build_lut(|c| (c - 127.5) * (1.0 + s) + 127.5));
            }
            FilterKind::Saturation => map_pixels(&mut image, |rgb| saturate(rgb, 1.0 + s)),
            FilterKind::Hue => {
                let matrix = hue_matrix(s * 180.0);
                map_pixels(&mut image, |rgb| apply_matrix(rgb, &matrix));
            }
            FilterKind::Warmth => {
                let shift = s * WARMTH_SHIFT;
                let red = build_lut(|c| c + shift);
                let blue = build_lut(|c| c - shift);
                map_pixels(&mut image, |[r, g, b]| [red[r as usize], g, blue[b as usize]]);
            }
            FilterKind::Sharpness if s < 0.0 => {
                let blurred = imageops::blur(&image, -s * MAX_BLUR_SIGMA);
                image = keep_alpha(blurred, &image);
            }
            FilterKind::Sharpness => {
                let sharpened = imageops::unsharpen(&image, s * MAX_SHARPEN_SIGMA, 0);
                image = keep_alpha(sharpened, &image);
            }
        }
    }
    image
}

/// `imageops` convolves all four channels; put the alpha plane back.
fn keep_alpha(mut filtered: RgbaImage, source: &RgbaImage) -> RgbaImage {
    filtered
        .par_chunks_mut(4)
        .zip(source.par_chunks(4))
        .for_each(|(out, src)| out[3] = src[3]);
    filtered
}

/// Precompute a per-channel transfer function over all 256 input levels.
fn build_lut(transfer: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (level, out) in lut.iter_mut().enumerate() {
        *out = to_channel(transfer(level as f32));
    }
    lut
}

fn map_with_lut(image: &mut RgbaImage, lut: &[u8; 256]) {
    map_pixels(image, |[r, g, b]| {
        [lut[r as usize], lut[g as usize], lut[b as usize]]
    });
}

/// Run `f` over the RGB channels of every pixel in parallel; alpha is kept.
fn map_pixels<F>(image: &mut RgbaImage, f: F)
where
    F: Fn([u8; 3]) -> [u8; 3] + Sync,
{
    image.par_chunks_mut(4).for_each(|px| {
        let [r, g, b] = f([px[0], px[1], px[2]]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    });
}

fn saturate([r, g, b]: [u8; 3], factor: f32) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    [
        to_channel(luma + (r - luma) * factor),
        to_channel(luma + (g - luma) * factor),
        to_channel(luma + (b - luma) * factor),
    ]
}

/// Luminance-preserving hue rotation matrix (the one used by CSS `hue-rotate`).
fn hue_matrix(degrees: f32) -> [[f32; 3]; 3] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn apply_matrix([r, g, b]: [u8; 3], m: &[[f32; 3]; 3]) -> [u8; 3] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    [
        to_channel(m[0][0] * r + m[0][1] * g + m[0][2] * b),
        to_channel(m[1][0] * r + m[1][1] * g + m[1][2] * b),
        to_channel(m[2][0] * r + m[2][1] * g + m[2][2] * b),
    ]
}
