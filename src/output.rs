//! CLI output formatting.
//!
//! The engine itself is silent; these functions turn its results into the
//! text the `retouch` binary prints.
//!
//! # Output Format
//!
//! ## Edit
//!
//! ```text
//! Input
//!     photo.jpg (4032x3024)
//!
//! Edits
//! 001 brightness 70
//! 002 rotate right
//! 003 preset Instagram Post
//!
//! Output 1080x1080
//!     jpeg, quality 84, 198.4 KB in 3 attempts
//!     Warning: Requested 204800 bytes, closest achievable was 180100 bytes at quality 100
//!     → out.jpg
//! ```
//!
//! ## Presets
//!
//! ```text
//! 001 Instagram Post       1080x1080
//! 002 Instagram Portrait   1080x1350
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects. Reports derive `Serialize` for `--json`.

use crate::imaging::{ExportFormat, ExportOutcome, TargetSizeUnmet};
use crate::presets::SocialMediaPreset;
use serde::Serialize;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count, binary units.
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

// ============================================================================
// Edit
// ============================================================================

/// Everything the `edit` command did, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditReport {
    pub input: String,
    pub source_width: u32,
    pub source_height: u32,
    /// One label per committed edit.
    pub steps: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub export: ExportSummary,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub quality: Option<u32>,
    pub bytes: u64,
    pub attempts: u32,
    pub warning: Option<TargetSizeUnmet>,
}

impl From<&ExportOutcome> for ExportSummary {
    fn from(outcome: &ExportOutcome) -> Self {
        Self {
            format: outcome.format,
            quality: outcome.quality.map(|q| q.value()),
            bytes: outcome.len(),
            attempts: outcome.attempts,
            warning: outcome.warning.clone(),
        }
    }
}

fn export_line(export: &ExportSummary) -> String {
    let format = export.format.name();
    let mut line = match export.quality {
        Some(q) => format!("{format}, quality {q}, {}", format_size(export.bytes)),
        None => format!("{format}, {}", format_size(export.bytes)),
    };
    if export.attempts > 1 {
        line.push_str(&format!(" in {} attempts", export.attempts));
    }
    line
}

pub fn format_edit_output(report: &EditReport) -> Vec<String> {
    let mut lines = vec![
        "Input".to_string(),
        format!(
            "{}{} ({}x{})",
            indent(1),
            report.input,
            report.source_width,
            report.source_height
        ),
        String::new(),
    ];

    if report.steps.is_empty() {
        lines.push("No edits".to_string());
    } else {
        lines.push("Edits".to_string());
        for (i, step) in report.steps.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), step));
        }
    }
    lines.push(String::new());

    lines.push(format!("Output {}x{}", report.width, report.height));
    lines.push(format!("{}{}", indent(1), export_line(&report.export)));
    if let Some(warning) = &report.export.warning {
        lines.push(format!("{}Warning: {}", indent(1), warning));
    }
    lines.push(format!("{}→ {}", indent(1), report.output));
    lines
}

pub fn print_edit_output(report: &EditReport) {
    for line in format_edit_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Presets
// ============================================================================

pub fn format_presets(presets: &[SocialMediaPreset]) -> Vec<String> {
    let name_width = presets.iter().map(|p| p.name.len()).max().unwrap_or(0);
    presets
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{} {:<name_width$}   {}x{}",
                format_index(i + 1),
                p.name,
                p.width,
                p.height
            )
        })
        .collect()
}

pub fn print_presets(presets: &[SocialMediaPreset]) {
    for line in format_presets(presets) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::SOCIAL_MEDIA_PRESETS;

    fn report() -> EditReport {
        EditReport {
            input: "photo.jpg".to_string(),
            source_width: 4032,
            source_height: 3024,
            steps: vec!["brightness 70".to_string(), "rotate right".to_string()],
            width: 3024,
            height: 4032,
            export: ExportSummary {
                format: ExportFormat::Jpeg,
                quality: Some(84),
                bytes: 203_161,
                attempts: 3,
                warning: None,
            },
            output: "out.jpg".to_string(),
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
    }

    // =========================================================================
    // Edit output tests
    // =========================================================================

    #[test]
    fn edit_output_lists_steps_and_export() {
        let lines = format_edit_output(&report());
        assert_eq!(
            lines,
            vec![
                "Input",
                "    photo.jpg (4032x3024)",
                "",
                "Edits",
                "001 brightness 70",
                "002 rotate right",
                "",
                "Output 3024x4032",
                "    jpeg, quality 84, 198.4 KB in 3 attempts",
                "    → out.jpg",
            ]
        );
    }

    #[test]
    fn edit_output_without_steps() {
        let mut report = report();
        report.steps.clear();
        assert!(format_edit_output(&report).contains(&"No edits".to_string()));
    }

    #[test]
    fn lossless_single_attempt_omits_quality() {
        let mut report = report();
        report.export = ExportSummary {
            format: ExportFormat::Png,
            quality: None,
            bytes: 700,
            attempts: 1,
            warning: None,
        };
        let lines = format_edit_output(&report);
        assert!(lines.contains(&"    png, 700 B".to_string()));
    }

    #[test]
    fn edit_output_shows_warning() {
        let mut report = report();
        report.export.warning = Some(TargetSizeUnmet {
            target_bytes: 1000,
            achieved_bytes: 4000,
            quality: Some(1),
        });
        let lines = format_edit_output(&report);
        assert!(lines.iter().any(|l| l.starts_with("    Warning: Requested 1000 bytes")));
    }

    #[test]
    fn edit_report_serializes() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["export"]["format"], "jpeg");
        assert_eq!(json["steps"][1], "rotate right");
        assert!(json["export"]["warning"].is_null());
    }

    // =========================================================================
    // Preset output tests
    // =========================================================================

    #[test]
    fn presets_are_aligned() {
        let lines = format_presets(SOCIAL_MEDIA_PRESETS);
        assert_eq!(lines.len(), SOCIAL_MEDIA_PRESETS.len());
        assert!(lines[0].starts_with("001 Instagram Post "));
        assert!(lines[0].ends_with("1080x1080"));
        let columns: Vec<usize> = lines.iter().map(|l| l.rfind("   ").unwrap()).collect();
        assert!(columns.windows(2).all(|w| w[0] == w[1]));
    }
}
