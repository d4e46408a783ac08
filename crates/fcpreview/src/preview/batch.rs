//! Batch and single-file orchestration.
//!
//! Each candidate runs to completion before the next one starts:
//!
//! ```text
//! Discovered ──(fit?)──► TempArchive copy ──► augment ──┐
//!     │                                                 │
//!     └──────────────────(no fit)───────────────────────┴──► extract ──► Success | Failure
//!                                                                 │
//!                                               release temp copy (always)
//! ```
//!
//! The preview destination is always derived from the original path, even
//! when the thumbnail is read from the augmented copy. Failures are folded
//! into the tally; the batch never stops early.

use super::discovery::discover_archives;
use super::error::{PreviewError, Result};
use super::fit::FitRunner;
use super::patterns::IgnoreRules;
use super::temp_copy::TempArchive;
use super::thumbnail::extract_thumbnail;
use super::types::{
    has_archive_extension, preview_path_for, BatchProgress, BatchReport, BatchTally, Candidate,
    CandidateFailure,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Inputs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory scanned recursively
    pub root: PathBuf,
    /// Patterns applied to root-relative paths after discovery
    pub ignore: IgnoreRules,
    /// Fit tool to run on a copy of each archive, if requested
    pub fit: Option<FitRunner>,
}

impl BatchOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: IgnoreRules::empty(),
            fit: None,
        }
    }

    pub fn with_ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_fit(mut self, fit: Option<FitRunner>) -> Self {
        self.fit = fit;
        self
    }
}

/// Notifications emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent<'a> {
    /// Discovery and filtering finished; processing is about to start
    Planned { discovered: usize, ignored: usize },
    /// One candidate reached a terminal state
    Progress(BatchProgress<'a>),
}

/// Discover, filter and process every archive under `options.root`.
///
/// Only an unreadable root is an error. Per-candidate failures are logged
/// with their path, reported through `on_event`, and collected in the
/// returned report.
pub async fn run_batch<F>(options: &BatchOptions, mut on_event: F) -> Result<BatchReport>
where
    F: FnMut(BatchEvent<'_>),
{
    let found = discover_archives(&options.root)?;
    let discovered = found.len();
    info!("Found {} archives under {}", discovered, options.root.display());

    let candidates: Vec<Candidate> = found
        .into_iter()
        .filter(|candidate| {
            let ignored = options.ignore.is_ignored_rel(&candidate.rel_path);
            if ignored {
                debug!("Ignoring {}", candidate.rel_path);
            }
            !ignored
        })
        .collect();
    let ignored = discovered - candidates.len();
    if ignored > 0 {
        info!("Ignored {} archives by pattern", ignored);
    }

    on_event(BatchEvent::Planned {
        discovered,
        ignored,
    });

    let total = candidates.len();
    let mut tally = BatchTally::default();
    let mut failures = Vec::new();

    for candidate in &candidates {
        let output = candidate.preview_path();
        let result = process_archive(&candidate.path, &output, options.fit.as_ref()).await;
        tally = tally.record(result.is_ok());

        match result {
            Ok(written) => on_event(BatchEvent::Progress(BatchProgress {
                candidate,
                output: Some(written.as_path()),
                error: None,
                tally,
                total,
            })),
            Err(err) => {
                warn!("Failed to process {}: {}", candidate.path.display(), err);
                on_event(BatchEvent::Progress(BatchProgress {
                    candidate,
                    output: None,
                    error: Some(&err),
                    tally,
                    total,
                }));
                failures.push(CandidateFailure {
                    path: candidate.path.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        "Batch finished: {} succeeded, {} failed, {} ignored",
        tally.succeeded, tally.failed, ignored
    );

    Ok(BatchReport {
        root: options.root.clone(),
        discovered,
        ignored,
        tally,
        failures,
    })
}

/// Process one archive given directly, bypassing discovery and filtering.
///
/// `output` defaults to `<dir>/<stem>-preview.png` beside the archive.
pub async fn run_single(
    archive: &Path,
    output: Option<&Path>,
    fit: Option<&FitRunner>,
) -> Result<PathBuf> {
    if !archive.exists() {
        return Err(PreviewError::FileNotFound {
            path: archive.to_path_buf(),
        });
    }
    if !archive.is_file() || !has_archive_extension(archive) {
        return Err(PreviewError::NotAnArchive {
            path: archive.to_path_buf(),
        });
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| preview_path_for(archive));
    process_archive(archive, &output, fit).await
}

/// Run the per-candidate sequence for one archive.
async fn process_archive(
    archive: &Path,
    output: &Path,
    fit: Option<&FitRunner>,
) -> Result<PathBuf> {
    let Some(runner) = fit else {
        return extract_thumbnail(archive, output).into_result(archive);
    };

    let copy = TempArchive::copy_of(archive)?;
    let result = match runner.augment(copy.path()).await {
        Ok(()) => extract_thumbnail(copy.path(), output).into_result(archive),
        Err(err) => Err(err),
    };

    if let Err(err) = copy.release() {
        warn!(
            "Could not remove working copy of {}: {}",
            archive.display(),
            err
        );
    }

    result
}
