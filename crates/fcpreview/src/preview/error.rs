//! Error types for preview extraction

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Preview pipeline error type
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Cannot open archive {}: {source}", path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("No thumbnail found in {}", path.display())]
    ThumbnailMissing { path: PathBuf },

    #[error("Failed to copy thumbnail from {} to {}: {source}", archive.display(), output.display())]
    StreamFailure {
        archive: PathBuf,
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    AugmenterUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {}{}", exit_code_label(*code), stderr_suffix(stderr))]
    AugmenterNonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?} and was killed")]
    AugmenterTimeout { program: String, timeout: Duration },

    #[error("Failed to prepare working copy of {}: {source}", path.display())]
    TempCopy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot scan {}: {source}", root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Not a .FCStd file: {}", path.display())]
    NotAnArchive { path: PathBuf },

    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    MalformedPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PreviewError {
    /// True when the fit tool could not be run at all (as opposed to failing).
    pub fn is_tool_unavailable(&self) -> bool {
        matches!(self, PreviewError::AugmenterUnavailable { .. })
    }
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PreviewError>;
