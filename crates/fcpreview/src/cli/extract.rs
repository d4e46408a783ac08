//! Extract command - Write `<name>-preview.png` next to FreeCAD files
//!
//! A directory (or no path at all) runs a batch over every `.FCStd` file
//! beneath it; a file path runs single-file mode.

use crate::cli::error::HelpfulError;
use crate::cli::output::{
    format_banner, format_plan, format_progress, format_summary, print_json, JsonBatch, JsonSingle,
};
use anyhow::Context;
use fcpreview::config::{FitOverrides, Settings};
use fcpreview::preview::types::has_archive_extension;
use fcpreview::preview::{
    load_ignore_patterns, run_batch, run_single, BatchEvent, BatchOptions, FitRunner, IgnoreRules,
    PreviewError,
};
use fcpreview_logging::app_home;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Arguments for the extract command
#[derive(Debug, Default)]
pub struct ExtractArgs {
    pub path: Option<PathBuf>,
    pub fit: bool,
    pub ignore_config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub fit_timeout: Option<u64>,
    pub freecad: Option<String>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

/// Execute the extract command.
///
/// Returns `Ok(false)` when the run completed but did not fully succeed;
/// errors are reserved for fatal conditions.
pub fn run(args: ExtractArgs) -> anyhow::Result<bool> {
    let home = app_home();
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default(&home)?,
    };

    let target = args.path.clone().unwrap_or_else(|| PathBuf::from("."));
    if !target.exists() && !has_archive_extension(&target) {
        return Err(HelpfulError::path_not_found(&target).into());
    }

    let fit = if args.fit {
        let overrides = FitOverrides {
            program: args.freecad.clone(),
            timeout_secs: args.fit_timeout,
        };
        let config = settings.fit_config(&overrides)?;
        let runner = FitRunner::new(config, &home)
            .with_context(|| format!("Failed to prepare fit macro under {}", home.display()))?;
        info!(
            "Fit enabled: {} (macro {}, timeout {:?})",
            runner.program(),
            runner.macro_path().display(),
            runner.timeout()
        );
        Some(runner)
    } else {
        None
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if target.is_dir() {
        if args.output.is_some() {
            warn!("--output applies to single files only; writing previews beside each archive");
        }
        rt.block_on(run_batch_mode(&args, target, fit))
    } else {
        if args.ignore_config.is_some() {
            warn!("--ignore-config is not used when processing a single file");
        }
        rt.block_on(run_single_mode(&args, &target, fit.as_ref()))
    }
}

async fn run_batch_mode(
    args: &ExtractArgs,
    root: PathBuf,
    fit: Option<FitRunner>,
) -> anyhow::Result<bool> {
    let quiet = args.json;

    if !quiet {
        println!("{}", format_banner(&root, fit.is_some()));
    }

    let ignore = match &args.ignore_config {
        Some(path) => {
            if !quiet {
                println!("Using ignore config: {}", path.display());
            }
            let patterns = load_ignore_patterns(path);
            if !quiet && path.exists() {
                println!("Loaded {} ignore patterns", patterns.len());
            }
            IgnoreRules::new(patterns)
        }
        None => IgnoreRules::empty(),
    };

    let options = BatchOptions::new(root).with_ignore(ignore).with_fit(fit);
    let ignore_source = args.ignore_config.as_deref();
    let mut unavailable_tool: Option<HelpfulError> = None;

    let report = run_batch(&options, |event| match event {
        BatchEvent::Planned { discovered, ignored } => {
            if !quiet {
                for line in format_plan(discovered, ignored, ignore_source) {
                    println!("{}", line);
                }
            }
        }
        BatchEvent::Progress(progress) => {
            if !quiet {
                println!("{}", format_progress(&progress));
            }
            if let Some(err) = progress.error.filter(|e| e.is_tool_unavailable()) {
                unavailable_tool
                    .get_or_insert_with(|| HelpfulError::from_preview_error(err, &progress.candidate.path));
            }
        }
    })
    .await
    .map_err(|err| -> anyhow::Error {
        if let PreviewError::Discovery { root, source } = &err {
            return HelpfulError::new(format!("Cannot scan {}", root.display()))
                .with_context(source.to_string())
                .with_suggestion(format!("TRY: Check permissions: ls -la {}", root.display()))
                .into();
        }
        err.into()
    })?;

    if quiet {
        print_json(&JsonBatch {
            success: report.success(),
            report: &report,
        })?;
    } else {
        println!("{}", format_summary(&report));
    }

    if let Some(helpful) = unavailable_tool {
        eprintln!("{}", helpful);
    }

    Ok(report.success())
}

async fn run_single_mode(
    args: &ExtractArgs,
    archive: &Path,
    fit: Option<&FitRunner>,
) -> anyhow::Result<bool> {
    if !args.json {
        let mut line = format!("Extracting image from {}", archive.display());
        if fit.is_some() {
            line.push_str(" (with isometric fit)");
        }
        println!("{}", line);
    }

    match run_single(archive, args.output.as_deref(), fit).await {
        Ok(output) => {
            if args.json {
                print_json(&JsonSingle {
                    success: true,
                    archive,
                    output: Some(output.as_path()),
                    error: None,
                })?;
            } else {
                println!("✓ Saved preview to {}", output.display());
            }
            Ok(true)
        }
        Err(err) => {
            warn!("Failed to process {}: {}", archive.display(), err);
            if args.json {
                print_json(&JsonSingle {
                    success: false,
                    archive,
                    output: None,
                    error: Some(err.to_string()),
                })?;
            } else {
                eprintln!("{}", HelpfulError::from_preview_error(&err, archive));
            }
            Ok(false)
        }
    }
}
