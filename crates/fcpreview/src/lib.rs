//! fcpreview - Core Library
//!
//! Thumbnail extraction for FreeCAD `.FCStd` archives, shared by the CLI and
//! its tests.

pub mod config;
pub mod preview;

pub use config::{FitOverrides, Settings};
pub use preview::{
    extract_thumbnail, run_batch, run_single, BatchEvent, BatchOptions, BatchReport,
    ExtractionOutcome, FitConfig, FitRunner, IgnoreRules, PreviewError,
};
