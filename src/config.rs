//! Editor configuration.
//!
//! Handles loading, validating, and merging `retouch.toml`. Stock defaults
//! are serialised to a TOML table and the user file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [export]
//! format = "jpeg"           # png | jpeg | webp | avif
//! quality = 90              # 1-100, lossy formats only
//! file_stem = "edited-image"
//! tolerance_percent = 10    # accepted deviation from a target file size
//! max_attempts = 8          # encodes allowed per size search
//! avif_speed = 6            # rav1e speed preset, 1 (slow) - 10 (fast)
//!
//! [resize]
//! filter = "lanczos3"       # triangle | catmull-rom | lanczos3
//! max_dimension = 16384     # largest accepted width or height
//!
//! [history]
//! max_entries = 100         # oldest snapshots dropped beyond this
//!
//! [processing]
//! max_threads = 4           # omit for auto = CPU cores
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{ExportFormat, ExportSettings, Quality, RenderOptions, Resample, SearchPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `retouch.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Default export settings and size-search bounds.
    pub export: ExportConfig,
    /// Resampling and output limits.
    pub resize: ResizeConfig,
    /// Undo history bounds.
    pub history: HistoryConfig,
    /// Worker pool settings.
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.export.quality) {
            return Err(ConfigError::Validation(
                "export.quality must be 1-100".into(),
            ));
        }
        if !(self.export.tolerance_percent > 0.0 && self.export.tolerance_percent < 100.0) {
            return Err(ConfigError::Validation(
                "export.tolerance_percent must be between 0 and 100 (exclusive)".into(),
            ));
        }
        if self.export.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "export.max_attempts must be at least 1".into(),
            ));
        }
        if !(1..=10).contains(&self.export.avif_speed) {
            return Err(ConfigError::Validation(
                "export.avif_speed must be 1-10".into(),
            ));
        }
        if self.export.file_stem.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.file_stem must not be empty".into(),
            ));
        }
        if self.resize.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "resize.max_dimension must be positive".into(),
            ));
        }
        if self.history.max_entries == 0 {
            return Err(ConfigError::Validation(
                "history.max_entries must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Export settings a fresh session starts with.
    pub fn default_export_settings(&self) -> ExportSettings {
        ExportSettings {
            format: self.export.format,
            quality: Quality::new(self.export.quality),
            ..ExportSettings::default()
        }
    }

    pub fn search_policy(&self) -> SearchPolicy {
        SearchPolicy {
            tolerance: self.export.tolerance_percent / 100.0,
            max_attempts: self.export.max_attempts,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            resample: self.resize.filter,
            max_dimension: self.resize.max_dimension,
        }
    }
}

/// Export defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Encoding quality for lossy formats (1 = worst, 100 = best).
    pub quality: u32,
    /// File name (without extension) suggested for downloads.
    pub file_stem: String,
    /// Accepted deviation from a target file size, in percent.
    pub tolerance_percent: f64,
    /// Upper bound on encodes during a size search.
    pub max_attempts: u32,
    /// rav1e speed preset for AVIF.
    pub avif_speed: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality: 90,
            file_stem: "edited-image".to_string(),
            tolerance_percent: 10.0,
            max_attempts: 8,
            avif_speed: 6,
        }
    }
}

/// Resampling and dimension limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub filter: Resample,
    /// Largest width or height accepted from a decode or produced by a resize.
    pub max_dimension: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            filter: Resample::Lanczos3,
            max_dimension: 16_384,
        }
    }
}

/// Undo history bounds.
///
/// Every snapshot holds a full frame, so the history is always capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Maximum snapshots kept, oldest dropped first.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads for pixel work and codec jobs.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(EditorConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<EditorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the stock defaults. A present file is merged on top
/// of the defaults, checked for unknown keys, and validated.
pub fn load_config(path: &Path) -> Result<EditorConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `retouch.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# retouch configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Output format: "png", "jpeg", "webp" or "avif".
format = "jpeg"

# Encoding quality for lossy formats (1 = worst, 100 = best).
quality = 90

# Suggested file name, without extension, for downloaded images.
file_stem = "edited-image"

# When a target file size is requested, results within this many percent of
# the target are accepted.
tolerance_percent = 10.0

# Maximum number of encodes while searching for a target file size.
max_attempts = 8

# rav1e speed preset for AVIF output, 1 (slowest, smallest) to 10 (fastest).
avif_speed = 6

# ---------------------------------------------------------------------------
# Resize
# ---------------------------------------------------------------------------
[resize]
# Resampling filter: "triangle" (bilinear), "catmull-rom" or "lanczos3".
filter = "lanczos3"

# Largest width or height accepted from an input image or a resize.
max_dimension = 16384

# ---------------------------------------------------------------------------
# History
# ---------------------------------------------------------------------------
[history]
# Maximum number of undo snapshots. Each one holds a full frame, so large
# images and a high cap use a lot of memory.
max_entries = 100

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads for filters and codec jobs.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}
