//! Preview extraction: pull the embedded thumbnail out of FreeCAD archives.
//!
//! Pipeline per archive: discover → filter by ignore patterns → (optionally)
//! augment a temp copy with the fit tool → extract `thumbnails/Thumbnail.png`
//! to `<stem>-preview.png` beside the original.

pub mod batch;
pub mod discovery;
pub mod error;
pub mod fit;
pub mod ignore_file;
pub mod patterns;
pub mod temp_copy;
pub mod thumbnail;
pub mod types;

pub use batch::{run_batch, run_single, BatchEvent, BatchOptions};
pub use discovery::discover_archives;
pub use error::{PreviewError, Result};
pub use fit::{FitConfig, FitRunner, DEFAULT_FIT_PROGRAM, DEFAULT_FIT_TIMEOUT_SECS};
pub use ignore_file::{load_ignore_patterns, parse_ignore_patterns};
pub use patterns::{filter_ignored, should_ignore, IgnoreRules};
pub use temp_copy::TempArchive;
pub use thumbnail::{extract_thumbnail, THUMBNAIL_ENTRY};
pub use types::{
    preview_path_for, BatchProgress, BatchReport, BatchTally, Candidate, CandidateFailure,
    ExtractionOutcome,
};
