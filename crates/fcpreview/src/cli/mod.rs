//! CLI module for fcpreview
//!
//! The extract command plus its error and output helpers.

pub mod error;
pub mod extract;
pub mod output;
