//! Core types for the preview pipeline

use super::error::PreviewError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Suffix appended to the archive stem to name the extracted preview.
pub const PREVIEW_SUFFIX: &str = "-preview.png";

/// Extension (compared case-insensitively) that marks a FreeCAD archive.
pub const ARCHIVE_EXTENSION: &str = "fcstd";

/// Normalize a path to forward slashes so patterns behave the same on every
/// platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// True if `path` carries the `.fcstd` extension in any letter case.
pub fn has_archive_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
        .unwrap_or(false)
}

/// Preview location for an archive: `<dir>/<stem>-preview.png`.
///
/// Only the final extension is stripped, so `a.b.FCStd` yields
/// `a.b-preview.png`.
pub fn preview_path_for(archive: &Path) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}{}", stem, PREVIEW_SUFFIX);
    match archive.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// A discovered file believed to be a FreeCAD archive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Candidate {
    /// Path as discovered (root joined with the relative path)
    pub path: PathBuf,
    /// Path relative to the scan root, forward-slash separated
    pub rel_path: String,
}

impl Candidate {
    /// Build a candidate, deriving the relative path from `root`.
    pub fn new(path: PathBuf, root: &Path) -> Self {
        let rel_path = match path.strip_prefix(root) {
            Ok(rel) => to_forward_slashes(rel),
            Err(_) => to_forward_slashes(&path),
        };
        Self { path, rel_path }
    }

    /// Where this candidate's preview is written.
    pub fn preview_path(&self) -> PathBuf {
        preview_path_for(&self.path)
    }
}

/// Result of extracting the thumbnail from one archive.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// Thumbnail entry found and written
    Extracted {
        /// Output file written
        output: PathBuf,
        /// Bytes written
        bytes: u64,
    },
    /// Archive opened, but it has no thumbnail entry
    NotFound,
    /// Archive unreadable, stream failure, or upstream fit failure
    Failed(PreviewError),
}

impl ExtractionOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, ExtractionOutcome::Extracted { .. })
    }

    /// Convert into a `Result`, mapping `NotFound` to `ThumbnailMissing`.
    pub fn into_result(self, archive: &Path) -> Result<PathBuf, PreviewError> {
        match self {
            ExtractionOutcome::Extracted { output, .. } => Ok(output),
            ExtractionOutcome::NotFound => Err(PreviewError::ThumbnailMissing {
                path: archive.to_path_buf(),
            }),
            ExtractionOutcome::Failed(err) => Err(err),
        }
    }
}

/// Running counters for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchTally {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchTally {
    /// Fold one candidate result into the tally.
    pub fn record(self, success: bool) -> Self {
        Self {
            processed: self.processed + 1,
            succeeded: self.succeeded + usize::from(success),
            failed: self.failed + usize::from(!success),
        }
    }
}

/// Progress update emitted after each candidate.
#[derive(Debug, Clone)]
pub struct BatchProgress<'a> {
    pub candidate: &'a Candidate,
    /// Output written, if the candidate succeeded
    pub output: Option<&'a Path>,
    /// Failure reason, if the candidate failed
    pub error: Option<&'a PreviewError>,
    pub tally: BatchTally,
    pub total: usize,
}

/// One failed candidate in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Final record of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub root: PathBuf,
    /// Candidates found before filtering
    pub discovered: usize,
    /// Candidates removed by ignore patterns
    pub ignored: usize,
    pub tally: BatchTally,
    pub failures: Vec<CandidateFailure>,
}

impl BatchReport {
    /// Overall outcome: false on any failure, on an empty discovery, or when
    /// every candidate was ignored.
    pub fn success(&self) -> bool {
        self.discovered > 0 && self.discovered > self.ignored && self.tally.failed == 0
    }

    /// Candidates that survived filtering.
    pub fn total(&self) -> usize {
        self.discovered - self.ignored
    }
}
