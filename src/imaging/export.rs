//! Export: encode a frame, optionally searching quality for a size target.
//!
//! ## Quality search
//!
//! When a lossy format has a size target, quality is bisected over `1..=100`:
//!
//! 1. Encode at the midpoint of the open range.
//! 2. If the output is within `tolerance` of the target, stop.
//! 3. Oversized narrows the range downward, undersized upward.
//! 4. Stop after `max_attempts` encodes or when the range is empty.
//!
//! The closest result by absolute byte difference is kept throughout. If no
//! attempt lands inside the tolerance band, that closest result is returned
//! together with a [`TargetSizeUnmet`] warning; the export still succeeds.
//!
//! Lossless formats encode exactly once. A target is advisory for them: a miss
//! only attaches the warning.

use super::codec::{EncodeError, ImageCodec};
use super::params::{ExportFormat, ExportSettings, Quality};
use image::RgbaImage;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Bounds on the quality search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    /// Accepted relative deviation from the target, e.g. `0.10` for ±10%.
    pub tolerance: f64,
    pub max_attempts: u32,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            tolerance: 0.10,
            max_attempts: 8,
        }
    }
}

impl SearchPolicy {
    fn accepts(&self, len: u64, target: u64) -> bool {
        (len as f64 - target as f64).abs() <= target as f64 * self.tolerance
    }
}

/// Non-fatal: the export succeeded but missed the requested size.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error(
    "Requested {target_bytes} bytes, closest achievable was {achieved_bytes} bytes{}",
    quality_suffix(.quality)
)]
pub struct TargetSizeUnmet {
    pub target_bytes: u64,
    pub achieved_bytes: u64,
    pub quality: Option<u32>,
}

fn quality_suffix(quality: &Option<u32>) -> String {
    quality.map(|q| format!(" at quality {q}")).unwrap_or_default()
}

/// Encoded bytes plus how they were produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    /// Quality used, `None` for lossless formats.
    pub quality: Option<Quality>,
    pub attempts: u32,
    pub warning: Option<TargetSizeUnmet>,
}

impl ExportOutcome {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode `bitmap` according to `settings`.
pub fn export_bitmap(
    codec: &dyn ImageCodec,
    bitmap: &RgbaImage,
    settings: &ExportSettings,
    policy: &SearchPolicy,
) -> Result<ExportOutcome, EncodeError> {
    let format = settings.format;

    let Some(target) = settings.target_bytes() else {
        let bytes = codec.encode(bitmap, format, settings.quality)?;
        return Ok(ExportOutcome {
            bytes,
            format,
            quality: format.is_lossy().then_some(settings.quality),
            attempts: 1,
            warning: None,
        });
    };

    if !format.is_lossy() {
        let bytes = codec.encode(bitmap, format, settings.quality)?;
        let achieved = bytes.len() as u64;
        let warning = (!policy.accepts(achieved, target)).then_some(TargetSizeUnmet {
            target_bytes: target,
            achieved_bytes: achieved,
            quality: None,
        });
        return Ok(ExportOutcome {
            bytes,
            format,
            quality: None,
            attempts: 1,
            warning,
        });
    }

    search_quality(codec, bitmap, format, target, policy)
}

fn search_quality(
    codec: &dyn ImageCodec,
    bitmap: &RgbaImage,
    format: ExportFormat,
    target: u64,
    policy: &SearchPolicy,
) -> Result<ExportOutcome, EncodeError> {
    let mut low = 1u32;
    let mut high = 100u32;
    let mut attempts = 0u32;
    let mut best: Option<(Quality, Vec<u8>)> = None;

    while low <= high && attempts < policy.max_attempts.max(1) {
        let quality = Quality::new((low + high) / 2);
        let bytes = codec.encode(bitmap, format, quality)?;
        attempts += 1;
        let len = bytes.len() as u64;
        debug!(quality = quality.value(), len, target, attempts, "size search step");

        let closer = best
            .as_ref()
            .is_none_or(|(_, b)| len.abs_diff(target) < (b.len() as u64).abs_diff(target));
        let within = policy.accepts(len, target);
        if closer {
            best = Some((quality, bytes));
        }
        if within {
            break;
        }
        if len > target {
            high = quality.value() - 1;
        } else {
            low = quality.value() + 1;
        }
    }

    // At least one encode ran, so `best` is populated.
    let (quality, bytes) = best.ok_or(EncodeError::Failed {
        format,
        reason: "no encode attempt was made".to_string(),
    })?;
    let achieved = bytes.len() as u64;
    let warning = (!policy.accepts(achieved, target)).then_some(TargetSizeUnmet {
        target_bytes: target,
        achieved_bytes: achieved,
        quality: Some(quality.value()),
    });

    Ok(ExportOutcome {
        bytes,
        format,
        quality: Some(quality),
        attempts,
        warning,
    })
}
