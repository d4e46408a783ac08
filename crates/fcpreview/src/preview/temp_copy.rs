//! Disposable working copies of archives.
//!
//! The fit tool rewrites the archive it is given, so it only ever sees a
//! copy in a private temp directory. The directory is removed when the
//! `TempArchive` is released or dropped, on every exit path.

use super::error::{PreviewError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A private copy of one archive, deleted with its directory on release.
#[derive(Debug)]
pub struct TempArchive {
    dir: TempDir,
    path: PathBuf,
}

impl TempArchive {
    /// Copy `original` into a fresh temp directory, keeping its file name.
    ///
    /// The original is only read.
    pub fn copy_of(original: &Path) -> Result<Self> {
        let temp_err = |source: io::Error| PreviewError::TempCopy {
            path: original.to_path_buf(),
            source,
        };

        let dir = tempfile::Builder::new()
            .prefix("fcpreview-")
            .tempdir()
            .map_err(temp_err)?;

        let file_name = original
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "archive.FCStd".into());
        let path = dir.path().join(file_name);

        fs::copy(original, &path).map_err(temp_err)?;
        make_writable(&path).map_err(temp_err)?;

        debug!("Working copy of {} at {}", original.display(), path.display());
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the copy and its directory, reporting any failure.
    pub fn release(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Copies inherit the source mode; the tool must be able to save over it.
fn make_writable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
    }
    #[cfg(not(unix))]
    {
        let mut perms = fs::metadata(path)?.permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(path, perms)
    }
}
