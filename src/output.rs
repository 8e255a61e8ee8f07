//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every input file is listed by positional index and file name, with its
//! path and outcome as indented context lines. Paths are secondary; the
//! report reads as an inventory of what was produced.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! 001 dawn.jpg
//!     Source: photos/dawn.jpg
//!     7 variants → out/dawn.manifest.json
//! 002 broken.png
//!     Source: photos/broken.png
//!     Failed: Failed to load: Failed to decode image: ...
//!
//! Processed 1 of 2 files, 7 variants (1 failed)
//! ```
//!
//! ## Check
//!
//! ```text
//! Pipeline (3 stages)
//! 001 resize
//! 002 compress
//! 003 tag
//!
//! Output
//!     Format: jpeg (quality 95)
//!     Threads: 8
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::BatchReport;
use crate::config::{OutputFormat, PipelineConfig, effective_threads};
use crate::pipeline::Pipeline;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// run
// ============================================================================

/// Format the per-file report of a batch run plus a summary line.
pub fn format_run_report(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, file) in report.files.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), file_name(&file.source)));
        lines.push(format!("{}Source: {}", indent(1), file.source.display()));
        match &file.outcome {
            Ok(saved) => lines.push(format!(
                "{}{} \u{2192} {}",
                indent(1),
                plural(saved.variants, "variant"),
                saved.manifest.display()
            )),
            Err(e) if e.is_cancelled() => lines.push(format!("{}Cancelled", indent(1))),
            Err(e) => lines.push(format!("{}Failed: {}", indent(1), e)),
        }
    }

    let succeeded = report.succeeded().count();
    let failed = report.failed().count();
    let cancelled = report.cancelled_count();

    let mut summary = format!(
        "Processed {} of {}, {}",
        succeeded,
        plural(report.files.len(), "file"),
        plural(report.variant_count(), "variant")
    );
    let mut problems = Vec::new();
    if failed > 0 {
        problems.push(format!("{} failed", failed));
    }
    if cancelled > 0 {
        problems.push(format!("{} cancelled", cancelled));
    }
    if !problems.is_empty() {
        summary.push_str(&format!(" ({})", problems.join(", ")));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(summary);
    lines
}

pub fn print_run_report(report: &BatchReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the resolved stage list and output settings.
pub fn format_check_output(config: &PipelineConfig, pipeline: &Pipeline) -> Vec<String> {
    let mut lines = vec![format!("Pipeline ({})", plural(pipeline.len(), "stage"))];
    for (i, name) in pipeline.stage_names().into_iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), name));
    }

    if let Some(provider) = config.resize.provider() {
        lines.push(String::new());
        lines.push("Sizes".to_string());
        for (dim, name) in provider.entries() {
            match name {
                Some(name) => lines.push(format!("{}{}: {}", indent(1), name, dim)),
                None => lines.push(format!("{}{}", indent(1), dim)),
            }
        }
    }

    let format = match config.output.format {
        OutputFormat::Jpeg => format!("jpeg (quality {})", config.output.quality),
        OutputFormat::Png => "png".to_string(),
    };
    lines.push(String::new());
    lines.push("Output".to_string());
    lines.push(format!("{}Format: {}", indent(1), format));
    lines.push(format!(
        "{}Threads: {}",
        indent(1),
        effective_threads(&config.processing)
    ));
    lines
}

pub fn print_check_output(config: &PipelineConfig, pipeline: &Pipeline) {
    for line in format_check_output(config, pipeline) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{FileError, FileReport, SavedFile};
    use crate::imaging::BackendError;
    use crate::pipeline::{CancelToken, PipelineError};
    use crate::test_helpers::sample_image;
    use std::path::PathBuf;

    fn saved(source: &str, variants: usize) -> FileReport {
        FileReport {
            source: PathBuf::from(source),
            outcome: Ok(SavedFile {
                manifest: PathBuf::from("out/dawn.manifest.json"),
                variants,
            }),
        }
    }

    fn cancelled_error() -> PipelineError {
        let token = CancelToken::new();
        token.cancel();
        Pipeline::builder()
            .then(crate::stages::Tagger::fixed(crate::tags::Tags::new(["x"])))
            .run(&token, sample_image(2, 2))
            .unwrap_err()
    }

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
        assert_eq!(plural(7, "variant"), "7 variants");
    }

    #[test]
    fn run_report_success() {
        let report = BatchReport {
            files: vec![saved("photos/dawn.jpg", 7)],
        };
        let lines = format_run_report(&report);
        assert_eq!(
            lines,
            vec![
                "001 dawn.jpg",
                "    Source: photos/dawn.jpg",
                "    7 variants \u{2192} out/dawn.manifest.json",
                "",
                "Processed 1 of 1 file, 7 variants",
            ]
        );
    }

    #[test]
    fn run_report_failures_and_cancellations() {
        let report = BatchReport {
            files: vec![
                saved("a.jpg", 1),
                FileReport {
                    source: PathBuf::from("b.png"),
                    outcome: Err(FileError::Load(BackendError::Decode("bad".into()))),
                },
                FileReport {
                    source: PathBuf::from("c.png"),
                    outcome: Err(FileError::Pipeline(cancelled_error())),
                },
            ],
        };
        let lines = format_run_report(&report);

        assert_eq!(lines[3], "002 b.png");
        assert!(lines[5].starts_with("    Failed: "));
        assert_eq!(lines[8], "    Cancelled");
        assert_eq!(
            lines.last().unwrap(),
            "Processed 1 of 3 files, 1 variant (1 failed, 1 cancelled)"
        );
    }

    #[test]
    fn run_report_empty() {
        let lines = format_run_report(&BatchReport::default());
        assert_eq!(lines, vec!["Processed 0 of 0 files, 0 variants"]);
    }

    #[test]
    fn check_output_lists_stages_and_sizes() {
        let config = PipelineConfig::default();
        let pipeline = config.build_pipeline();
        let lines = format_check_output(&config, &pipeline);

        assert_eq!(lines[0], "Pipeline (2 stages)");
        assert_eq!(lines[1], "001 resize");
        assert_eq!(lines[2], "002 compress");
        assert!(lines.contains(&"Sizes".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("    sm: ")));
        assert!(lines.contains(&"    Format: jpeg (quality 95)".to_string()));
    }

    #[test]
    fn check_output_png_without_resize() {
        let mut config = PipelineConfig::default();
        config.resize.sizes.clear();
        config.output.format = OutputFormat::Png;
        let pipeline = config.build_pipeline();
        let lines = format_check_output(&config, &pipeline);

        assert_eq!(lines[0], "Pipeline (1 stage)");
        assert!(!lines.contains(&"Sizes".to_string()));
        assert!(lines.contains(&"    Format: png".to_string()));
    }
}
