//! Recursive discovery of `.FCStd` archives under a root directory.

use super::error::{PreviewError, Result};
use super::types::{has_archive_extension, Candidate};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Find every file under `root` whose extension is `fcstd` in any case.
///
/// Symlinked directories are not descended into, but a symlink that resolves
/// to a regular file is kept under its link path. Results are sorted by path
/// so processing order is stable across runs.
/// An unreadable root is an error; unreadable subdirectories are logged and
/// skipped.
pub fn discover_archives(root: &Path) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(PreviewError::Discovery {
                    root: root.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                warn!("Skipping unreadable path during scan: {}", err);
                continue;
            }
        };

        let path = entry.path();
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && path.is_file());
        if !is_file {
            continue;
        }

        if has_archive_extension(path) {
            debug!("Discovered {}", path.display());
            candidates.push(Candidate::new(path.to_path_buf(), root));
        }
    }

    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_case_insensitively_and_recursively() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("b.FCStd"), b"x").unwrap();
        fs::write(root.join("a.fcstd"), b"x").unwrap();
        fs::write(root.join("sub/c.FCSTD"), b"x").unwrap();
        fs::write(root.join("sub/deeper/d.FCStd"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::write(root.join("b-preview.png"), b"x").unwrap();
        fs::write(root.join("e.FCStd1"), b"x").unwrap();
        fs::create_dir(root.join("dir.FCStd")).unwrap();

        let found: Vec<String> = discover_archives(root)
            .unwrap()
            .into_iter()
            .map(|c| c.rel_path)
            .collect();

        assert_eq!(
            found,
            vec!["a.fcstd", "b.FCStd", "sub/c.FCSTD", "sub/deeper/d.FCStd"]
        );
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(discover_archives(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = discover_archives(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, PreviewError::Discovery { .. }));
    }

    #[test]
    fn test_candidate_paths_are_rooted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("models")).unwrap();
        fs::write(dir.path().join("models/cube.FCStd"), b"x").unwrap();

        let found = discover_archives(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, dir.path().join("models/cube.FCStd"));
        assert_eq!(found[0].preview_path(), dir.path().join("models/cube-preview.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_archive_is_discovered() {
        use std::os::unix::fs::symlink;

        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("real.FCStd");
        fs::write(&target, b"x").unwrap();
        fs::create_dir(elsewhere.path().join("nested.FCStd")).unwrap();

        let dir = TempDir::new().unwrap();
        symlink(&target, dir.path().join("link.FCStd")).unwrap();
        symlink(elsewhere.path().join("nested.FCStd"), dir.path().join("dir.FCStd")).unwrap();
        symlink(dir.path().join("gone.FCStd"), dir.path().join("dangling.FCStd")).unwrap();

        let found = discover_archives(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, dir.path().join("link.FCStd"));
        assert_eq!(found[0].rel_path, "link.FCStd");
    }
}
