//! CLI output formatting for single-image and batch runs.
//!
//! # Information-First Display
//!
//! Every image leads with its positional index and name. The before → after
//! metrics are shown as indented context lines, so the progress stream reads
//! as an inventory of what changed.
//!
//! # Output Format
//!
//! ## Enhance
//!
//! ```text
//! dawn.jpg → dawn-enhanced.jpg (4000x3000)
//!     Sharpness: 120.53 → 340.12
//!     Brightness: 98.20 → 131.77
//! ```
//!
//! ## Batch progress
//!
//! ```text
//! Enhancing 3 images (1 worker)
//! 001 A.jpg
//!     Sharpness: 12.00 → 40.00
//!     Brightness: 40.00 → 215.00
//! 002 B.jpg: skipped (Failed to decode B.jpg: ...)
//! Archived 1 file → out.zip
//! ```
//!
//! ## Batch report
//!
//! ```text
//! filename  sharp_before  sharp_after  brightness_before  brightness_after
//! A.jpg            12.00        40.00              40.00            215.00
//!
//! Enhanced 1 of 2 images in 0.42s, 1 skipped
//! ```
//!
//! With `--report stats.csv` the same columns are written as CSV.
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::batch::{BatchEvent, BatchResult, ImageStatRecord};
use crate::imaging::QualityMetrics;
use std::borrow::Cow;
use std::path::Path;

/// Column headers of the statistics report, in order.
pub const REPORT_COLUMNS: [&str; 5] = [
    "filename",
    "sharp_before",
    "sharp_after",
    "brightness_before",
    "brightness_after",
];

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 0-based index as a 1-based, 3-digit zero-padded position.
fn format_index(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Indented before → after lines for one image.
fn metric_lines(
    sharp_before: f64,
    sharp_after: f64,
    bright_before: f64,
    bright_after: f64,
) -> Vec<String> {
    vec![
        format!("    Sharpness: {sharp_before:.2} \u{2192} {sharp_after:.2}"),
        format!("    Brightness: {bright_before:.2} \u{2192} {bright_after:.2}"),
    ]
}

// ============================================================================
// Single image
// ============================================================================

/// Format the result of enhancing one file.
pub fn format_enhance_output(
    input: &Path,
    output: &Path,
    dimensions: (u32, u32),
    before: &QualityMetrics,
    after: &QualityMetrics,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} \u{2192} {} ({}x{})",
        input.display(),
        output.display(),
        dimensions.0,
        dimensions.1
    )];
    lines.extend(metric_lines(
        before.sharpness,
        after.sharpness,
        before.brightness,
        after.brightness,
    ));
    lines
}

/// Print single-image output to stdout.
pub fn print_enhance_output(
    input: &Path,
    output: &Path,
    dimensions: (u32, u32),
    before: &QualityMetrics,
    after: &QualityMetrics,
) {
    for line in format_enhance_output(input, output, dimensions, before, after) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch progress
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total, workers } => vec![format!(
            "Enhancing {} ({})",
            plural(*total, "image"),
            plural(*workers, "worker")
        )],
        BatchEvent::ImageDone { index, record, .. } => {
            let mut lines = vec![format!("{} {}", format_index(*index), record.filename)];
            lines.extend(metric_lines(
                record.sharpness_before,
                record.sharpness_after,
                record.brightness_before,
                record.brightness_after,
            ));
            lines
        }
        BatchEvent::ImageSkipped { index, failure, .. } => vec![format!(
            "{} {}: skipped ({})",
            format_index(*index),
            failure.filename,
            failure.error
        )],
        BatchEvent::Archived { path, entries } => vec![format!(
            "Archived {} \u{2192} {}",
            plural(*entries, "file"),
            path.display()
        )],
    }
}

// ============================================================================
// Batch report
// ============================================================================

/// Format the statistics table: one header row, one row per record, columns
/// right-aligned to their widest cell (filename left-aligned).
pub fn format_stats_table(records: &[ImageStatRecord]) -> Vec<String> {
    let rows: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.filename.clone(),
                format!("{:.2}", r.sharpness_before),
                format!("{:.2}", r.sharpness_after),
                format!("{:.2}", r.brightness_before),
                format!("{:.2}", r.brightness_after),
            ]
        })
        .collect();

    let mut widths = REPORT_COLUMNS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; 5]| -> String {
        let mut line = format!("{:<w$}", cells[0], w = widths[0]);
        for (cell, w) in cells.iter().zip(widths).skip(1) {
            line.push_str(&format!("  {:>w$}", cell, w = w));
        }
        line.trim_end().to_string()
    };

    let mut lines = vec![render(REPORT_COLUMNS)];
    for row in &rows {
        lines.push(render(row.each_ref().map(String::as_str)));
    }
    lines
}

/// Quote a CSV field when it contains a separator, quote, or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Format the statistics as CSV: the report columns as header, then one row
/// per record with two-decimal values.
pub fn format_stats_csv(records: &[ImageStatRecord]) -> Vec<String> {
    let mut lines = vec![REPORT_COLUMNS.join(",")];
    for r in records {
        lines.push(format!(
            "{},{:.2},{:.2},{:.2},{:.2}",
            csv_field(&r.filename),
            r.sharpness_before,
            r.sharpness_after,
            r.brightness_before,
            r.brightness_after
        ));
    }
    lines
}

/// Format the full batch report: stats table, blank line, summary.
pub fn format_batch_summary(result: &BatchResult) -> Vec<String> {
    let mut lines = format_stats_table(&result.records);
    lines.push(String::new());

    let attempted = result.records.len() + result.failures.len();
    let mut summary = format!(
        "Enhanced {} of {} in {:.2}s",
        result.records.len(),
        plural(attempted, "image"),
        result.elapsed_seconds
    );
    if !result.failures.is_empty() {
        summary.push_str(&format!(", {} skipped", result.failures.len()));
    }
    lines.push(summary);
    lines
}

/// Print the batch report to stdout.
pub fn print_batch_summary(result: &BatchResult) {
    for line in format_batch_summary(result) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ImageFailure;
    use std::path::PathBuf;

    fn record(name: &str) -> ImageStatRecord {
        ImageStatRecord {
            filename: name.to_string(),
            sharpness_before: 12.0,
            sharpness_after: 1234.5,
            brightness_before: 40.0,
            brightness_after: 215.25,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_is_one_based_and_padded() {
        assert_eq!(format_index(0), "001");
        assert_eq!(format_index(41), "042");
        assert_eq!(format_index(999), "1000");
    }

    #[test]
    fn plural_handles_one() {
        assert_eq!(plural(1, "image"), "1 image");
        assert_eq!(plural(0, "image"), "0 images");
        assert_eq!(plural(3, "worker"), "3 workers");
    }

    // =========================================================================
    // Enhance output
    // =========================================================================

    #[test]
    fn enhance_output_shows_arrow_and_metrics() {
        let before = QualityMetrics {
            sharpness: 1.234,
            brightness: 128.0,
        };
        let after = QualityMetrics {
            sharpness: 5.0,
            brightness: 140.567,
        };
        let lines = format_enhance_output(
            Path::new("in.png"),
            Path::new("out.jpg"),
            (100, 50),
            &before,
            &after,
        );
        assert_eq!(
            lines,
            vec![
                "in.png \u{2192} out.jpg (100x50)",
                "    Sharpness: 1.23 \u{2192} 5.00",
                "    Brightness: 128.00 \u{2192} 140.57",
            ]
        );
    }

    // =========================================================================
    // Batch events
    // =========================================================================

    #[test]
    fn format_started() {
        let lines = format_batch_event(&BatchEvent::Started {
            total: 3,
            workers: 1,
        });
        assert_eq!(lines, vec!["Enhancing 3 images (1 worker)"]);
    }

    #[test]
    fn format_image_done() {
        let lines = format_batch_event(&BatchEvent::ImageDone {
            index: 0,
            total: 2,
            record: record("A.jpg"),
        });
        assert_eq!(lines[0], "001 A.jpg");
        assert_eq!(lines[1], "    Sharpness: 12.00 \u{2192} 1234.50");
        assert_eq!(lines[2], "    Brightness: 40.00 \u{2192} 215.25");
    }

    #[test]
    fn format_image_skipped() {
        let lines = format_batch_event(&BatchEvent::ImageSkipped {
            index: 1,
            total: 2,
            failure: ImageFailure {
                filename: "bad.jpg".into(),
                error: "Failed to decode bad.jpg".into(),
            },
        });
        assert_eq!(lines, vec!["002 bad.jpg: skipped (Failed to decode bad.jpg)"]);
    }

    #[test]
    fn format_archived() {
        let lines = format_batch_event(&BatchEvent::Archived {
            path: PathBuf::from("out.zip"),
            entries: 1,
        });
        assert_eq!(lines, vec!["Archived 1 file \u{2192} out.zip"]);
    }

    // =========================================================================
    // Report
    // =========================================================================

    #[test]
    fn stats_table_header_only_when_empty() {
        let lines = format_stats_table(&[]);
        assert_eq!(
            lines,
            vec!["filename  sharp_before  sharp_after  brightness_before  brightness_after"]
        );
    }

    #[test]
    fn stats_table_rows_in_record_order_and_aligned() {
        let lines = format_stats_table(&[record("A.jpg"), record("a-much-longer-name.jpg")]);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("A.jpg "));
        assert!(lines[2].starts_with("a-much-longer-name.jpg"));
        // All rows share the same width because the last column is right-aligned.
        assert_eq!(lines[1].len(), lines[2].len());
        assert_eq!(lines[0].len(), lines[1].len());
        assert!(lines[1].ends_with("215.25"));
        assert!(lines[1].contains("1234.50"));
    }

    #[test]
    fn stats_csv_has_header_and_rows() {
        let lines = format_stats_csv(&[record("A.jpg")]);
        assert_eq!(
            lines,
            vec![
                "filename,sharp_before,sharp_after,brightness_before,brightness_after",
                "A.jpg,12.00,1234.50,40.00,215.25",
            ]
        );
    }

    #[test]
    fn stats_csv_quotes_awkward_names() {
        let lines = format_stats_csv(&[record("a,b.jpg"), record("say \"hi\".png")]);
        assert!(lines[1].starts_with("\"a,b.jpg\",12.00"));
        assert!(lines[2].starts_with("\"say \"\"hi\"\".png\",12.00"));
    }

    #[test]
    fn summary_mentions_skips() {
        let result = BatchResult {
            records: vec![record("A.jpg")],
            archive_path: PathBuf::from("out.zip"),
            elapsed_seconds: 0.4213,
            failures: vec![ImageFailure {
                filename: "B.jpg".into(),
                error: "boom".into(),
            }],
        };
        let lines = format_batch_summary(&result);
        assert_eq!(lines.last().unwrap(), "Enhanced 1 of 2 images in 0.42s, 1 skipped");
        assert_eq!(lines[lines.len() - 2], "");
    }

    #[test]
    fn summary_without_skips() {
        let result = BatchResult {
            records: vec![record("A.jpg")],
            archive_path: PathBuf::from("out.zip"),
            elapsed_seconds: 1.0,
            failures: vec![],
        };
        let lines = format_batch_summary(&result);
        assert_eq!(lines.last().unwrap(), "Enhanced 1 of 1 image in 1.00s");
    }
}
