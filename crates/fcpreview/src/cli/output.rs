//! Output formatting for the extract command
//!
//! Human-readable lines go to stdout; diagnostics stay on the tracing sinks.

use fcpreview::preview::{BatchProgress, BatchReport};
use serde::Serialize;
use std::path::Path;

/// One progress line, e.g. `[2/5] ✓ models/cube.FCStd -> models/cube-preview.png (succeeded 2, failed 0)`.
pub fn format_progress(progress: &BatchProgress<'_>) -> String {
    let counter = format!("[{}/{}]", progress.tally.processed, progress.total);
    let status = match (progress.output, progress.error) {
        (Some(output), _) => format!(
            "✓ {} -> {}",
            progress.candidate.rel_path,
            output.display()
        ),
        (None, Some(err)) => format!("✗ {}: {}", progress.candidate.rel_path, err),
        (None, None) => format!("✗ {}", progress.candidate.rel_path),
    };
    format!(
        "{} {} (succeeded {}, failed {})",
        counter, status, progress.tally.succeeded, progress.tally.failed
    )
}

/// Opening line of a batch run.
pub fn format_banner(root: &Path, fit: bool) -> String {
    let mut line = format!(
        "Extracting images from all FreeCAD files in {}",
        root.display()
    );
    if fit {
        line.push_str(" (with isometric fit)");
    }
    line
}

/// Lines printed once discovery and filtering are done.
pub fn format_plan(discovered: usize, ignored: usize, ignore_source: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();
    if discovered == 0 {
        return lines;
    }
    lines.push(format!("Found {} .FCStd files to check", discovered));
    if ignored > 0 {
        match ignore_source {
            Some(source) => lines.push(format!(
                "Ignored {} files based on {}",
                ignored,
                source.display()
            )),
            None => lines.push(format!("Ignored {} files", ignored)),
        }
    }
    lines
}

/// Final summary line.
pub fn format_summary(report: &BatchReport) -> String {
    if report.discovered == 0 {
        format!("No .FCStd files found in {}", report.root.display())
    } else if report.total() == 0 {
        "All files were filtered out by ignore patterns".to_string()
    } else if report.tally.failed == 0 {
        format!("All {} files processed successfully", report.tally.succeeded)
    } else {
        format!(
            "{} failed out of {}",
            report.tally.failed, report.tally.processed
        )
    }
}

/// Batch report with the overall outcome, as printed by `--json`.
#[derive(Debug, Serialize)]
pub struct JsonBatch<'a> {
    pub success: bool,
    #[serde(flatten)]
    pub report: &'a BatchReport,
}

/// Single-file result, as printed by `--json`.
#[derive(Debug, Serialize)]
pub struct JsonSingle<'a> {
    pub success: bool,
    pub archive: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a fatal error as JSON on stdout.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = serde_json::json!({
        "success": false,
        "error": format!("{:#}", err),
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => println!("{}", text),
        Err(_) => eprintln!("{:?}", err),
    }
}
