//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use fcpreview::preview::PreviewError;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    /// Create a new helpful error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggestion for fixing the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add multiple suggestions
    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Path does not exist
    pub fn path_not_found(path: &Path) -> Self {
        Self::new(format!("Path not found: {}", path.display()))
            .with_context("The specified path does not exist on the filesystem")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Pass a directory to scan or a single .FCStd file".to_string(),
                "TRY: Check for typos in the path".to_string(),
            ])
    }

    /// Archive given directly does not exist
    pub fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified file does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                format!("TRY: Look for FreeCAD files nearby: ls {}", parent_or_dot(path)),
            ])
    }

    /// File exists but is not a FreeCAD archive
    pub fn not_an_archive(path: &Path) -> Self {
        Self::new(format!("Not a .FCStd file: {}", path.display()))
            .with_context("Only FreeCAD documents (.FCStd) carry an embedded thumbnail")
            .with_suggestions([
                format!("TRY: Scan the containing directory instead: fcpreview {}", parent_or_dot(path)),
            ])
    }

    /// Archive has no thumbnail entry
    pub fn thumbnail_missing(path: &Path) -> Self {
        Self::new(format!("No thumbnail found in {}", path.display()))
            .with_context("FreeCAD only stores thumbnails/Thumbnail.png when 'Save thumbnail' is enabled")
            .with_suggestions([
                "TRY: Enable Preferences > General > Document > Save thumbnail into project file".to_string(),
                format!("TRY: Regenerate the thumbnail with FreeCAD: fcpreview --fit {}", path.display()),
            ])
    }

    /// Archive could not be opened as a ZIP container
    pub fn archive_unreadable(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot open archive: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check that the file is a valid FreeCAD document: unzip -l {}", path.display()),
                "TRY: Re-save the document from FreeCAD if it was truncated".to_string(),
            ])
    }

    /// Fit tool could not be started
    pub fn fit_tool_unavailable(program: &str, reason: &str) -> Self {
        Self::new(format!("Cannot run fit tool '{}'", program))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check that '{}' is installed and on PATH: which {}", program, program),
                "TRY: Point at the FreeCAD executable: --freecad /path/to/freecad".to_string(),
                "TRY: Or set FCPREVIEW_FREECAD, or [fit] command in config.toml".to_string(),
                "TRY: Run without --fit to extract the existing thumbnails".to_string(),
            ])
    }

    /// Fit tool ran past its timeout
    pub fn fit_timeout(program: &str, timeout: Duration) -> Self {
        Self::new(format!("Fit tool '{}' timed out after {}s", program, timeout.as_secs()))
            .with_context("The tool was stopped and the original file left untouched")
            .with_suggestions([
                "TRY: Allow more time: --fit-timeout 600".to_string(),
                format!("TRY: Check that '{}' can run without a display", program),
            ])
    }

    /// Fit tool exited with an error
    pub fn fit_failed(program: &str, details: &str) -> Self {
        Self::new(format!("Fit tool '{}' failed", program))
            .with_context(details.to_string())
            .with_suggestions([
                "TRY: Run with -v to see the tool's output".to_string(),
                "TRY: Run without --fit to extract the existing thumbnail".to_string(),
            ])
    }

    /// Map a pipeline failure for `archive` to a user-facing error.
    pub fn from_preview_error(err: &PreviewError, archive: &Path) -> Self {
        match err {
            PreviewError::FileNotFound { path } => Self::file_not_found(path),
            PreviewError::NotAnArchive { path } => Self::not_an_archive(path),
            PreviewError::ThumbnailMissing { .. } => Self::thumbnail_missing(archive),
            PreviewError::ArchiveUnreadable { source, .. } => {
                Self::archive_unreadable(archive, &source.to_string())
            }
            PreviewError::AugmenterUnavailable { program, source } => {
                Self::fit_tool_unavailable(program, &source.to_string())
            }
            PreviewError::AugmenterTimeout { program, timeout } => Self::fit_timeout(program, *timeout),
            PreviewError::AugmenterNonZeroExit { program, .. } => {
                Self::fit_failed(program, &err.to_string())
            }
            other => Self::new(format!("Failed to process {}", archive.display()))
                .with_context(other.to_string()),
        }
    }
}

fn parent_or_dot(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string())
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}
