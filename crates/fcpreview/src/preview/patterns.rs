//! Ignore-pattern matching against scan-root-relative paths.
//!
//! Rules:
//! - Paths are made relative to the scan root and use forward slashes
//! - Patterns are anchored at the root: `model.FCStd` only matches a file
//!   directly under the root, `**/model.FCStd` matches at any depth
//! - `*` and `?` never cross a `/`
//! - Matching is case-sensitive and dotfiles are not special
//! - A pattern that fails to compile is reported once and never matches

use super::error::PreviewError;
use super::types::to_forward_slashes;
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Build a matcher for one raw ignore pattern.
pub fn build_matcher(pattern: &str) -> Result<GlobMatcher, PreviewError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| PreviewError::MalformedPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}

/// Match a raw pattern against a root-relative path.
pub fn matches(pattern: &str, rel_path: &str) -> Result<bool, PreviewError> {
    let matcher = build_matcher(pattern)?;
    Ok(matcher.is_match(rel_path.trim_start_matches('/')))
}

/// Relative path of `path` under `root`, forward-slash separated.
///
/// Paths outside `root` are returned as given.
pub fn relative_to(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => to_forward_slashes(rel),
        Err(_) => to_forward_slashes(path),
    }
}

/// An ordered set of ignore patterns, compiled once.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    /// Compiled matchers; `None` for patterns that failed to compile
    matchers: Vec<Option<GlobMatcher>>,
    enabled: bool,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::empty()
    }
}

impl IgnoreRules {
    /// A rule set that ignores nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            matchers: Vec::new(),
            enabled: true,
        }
    }

    /// Compile `patterns`. Malformed patterns are logged and kept as
    /// never-matching entries.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let matchers = patterns
            .iter()
            .map(|pattern| match build_matcher(pattern) {
                Ok(matcher) => Some(matcher),
                Err(err) => {
                    warn!("Skipping ignore pattern: {}", err);
                    None
                }
            })
            .collect();

        Self {
            patterns,
            matchers,
            enabled: true,
        }
    }

    /// Turn filtering on or off without discarding the patterns.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True when filtering would leave any input unchanged.
    pub fn is_noop(&self) -> bool {
        !self.enabled || self.patterns.is_empty()
    }

    /// Number of patterns that failed to compile.
    pub fn malformed_count(&self) -> usize {
        self.matchers.iter().filter(|m| m.is_none()).count()
    }

    /// True if any pattern matches an already-relative path.
    pub fn is_ignored_rel(&self, rel_path: &str) -> bool {
        if self.is_noop() {
            return false;
        }
        let candidate = rel_path.trim_start_matches('/');
        self.matchers
            .iter()
            .flatten()
            .any(|matcher| matcher.is_match(candidate))
    }

    /// True if any pattern matches `path` made relative to `root`.
    pub fn is_ignored(&self, path: &Path, root: &Path) -> bool {
        if self.is_noop() {
            return false;
        }
        self.is_ignored_rel(&relative_to(path, root))
    }

    /// Keep the paths no pattern matches, preserving order.
    pub fn filter(&self, paths: Vec<PathBuf>, root: &Path) -> Vec<PathBuf> {
        if self.is_noop() {
            return paths;
        }
        paths
            .into_iter()
            .filter(|path| !self.is_ignored(path, root))
            .collect()
    }
}

/// One-shot form of [`IgnoreRules::is_ignored`].
pub fn should_ignore(path: &Path, root: &Path, patterns: &[String]) -> bool {
    IgnoreRules::new(patterns.iter().cloned()).is_ignored(path, root)
}

/// One-shot form of [`IgnoreRules::filter`].
pub fn filter_ignored(paths: Vec<PathBuf>, root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    IgnoreRules::new(patterns.iter().cloned()).filter(paths, root)
}
