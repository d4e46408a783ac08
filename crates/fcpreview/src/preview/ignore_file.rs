//! Loading ignore patterns from a text file.
//!
//! One glob per line. Lines are trimmed; blank lines and lines starting with
//! `#` are skipped. There is no escaping and no negation.

use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Parse ignore-file content into patterns.
pub fn parse_ignore_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load patterns from `path`.
///
/// A missing or unreadable file is not fatal: a warning is logged and no
/// patterns are returned.
pub fn load_ignore_patterns(path: &Path) -> Vec<String> {
    if !path.exists() {
        warn!("Ignore config file not found: {}", path.display());
        return Vec::new();
    }

    match fs::read_to_string(path) {
        Ok(content) => {
            let patterns = parse_ignore_patterns(&content);
            info!(
                "Loaded {} ignore patterns from {}",
                patterns.len(),
                path.display()
            );
            patterns
        }
        Err(err) => {
            warn!("Could not read ignore file {}: {}", path.display(), err);
            Vec::new()
        }
    }
}
