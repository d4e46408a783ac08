//! Fit Tool Runner
//!
//! Runs FreeCAD with the bundled isometric "fit all" macro so the archive's
//! embedded thumbnail is regenerated before extraction.
//!
//! ```text
//! FitRunner
//!     │
//!     └── spawn <program> [leading args] <archive> <macro>
//!         ├── timeout: 300 seconds (configurable), child killed on expiry
//!         ├── stdout/stderr: drained while waiting, shown only on failure
//!         └── exit 0 = success
//! ```
//!
//! The tool saves the archive in place. Callers must hand it a disposable
//! copy, never the user's file.

use super::error::{PreviewError, Result};
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Program used when none is configured (resolved through `PATH`).
pub const DEFAULT_FIT_PROGRAM: &str = "freecad";

/// Default bound on one tool run.
pub const DEFAULT_FIT_TIMEOUT_SECS: u64 = 300;

/// File name of the bundled macro.
pub const MACRO_FILE_NAME: &str = "isofit.FCMacro";

const ISOFIT_MACRO_SOURCE: &str = include_str!("../../macros/isofit.FCMacro");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Longest piece of one output line held in memory; the rest of the line is
/// read as a continuation.
const MAX_LINE_BYTES: u64 = 4096;

/// Fit tool configuration
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Program to run
    pub program: String,
    /// Arguments placed before the archive and macro paths
    pub leading_args: Vec<String>,
    /// Maximum time one run may take
    pub timeout: Duration,
    /// Macro to run instead of the bundled one
    pub macro_path: Option<PathBuf>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_FIT_PROGRAM.to_string(),
            leading_args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_FIT_TIMEOUT_SECS),
            macro_path: None,
        }
    }
}

/// Runs the external fit tool on one archive at a time.
#[derive(Debug, Clone)]
pub struct FitRunner {
    config: FitConfig,
    macro_path: PathBuf,
}

impl FitRunner {
    /// Create a runner, materializing the bundled macro under `home` unless
    /// the config names its own macro.
    pub fn new(config: FitConfig, home: &Path) -> Result<Self> {
        let macro_path = match &config.macro_path {
            Some(path) => path.clone(),
            None => materialize_macro(home)?,
        };
        Ok(Self { config, macro_path })
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    pub fn macro_path(&self) -> &Path {
        &self.macro_path
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Run the tool against `archive`, which it may rewrite in place.
    pub async fn augment(&self, archive: &Path) -> Result<()> {
        let start = Instant::now();
        info!(
            "Running {} with isometric fit macro on {}",
            self.config.program,
            archive.display()
        );

        let result = tokio::time::timeout(self.config.timeout, self.run_tool(archive)).await;

        match result {
            Ok(Ok(())) => {
                info!(
                    "{} finished for {} in {}ms",
                    self.config.program,
                    archive.display(),
                    start.elapsed().as_millis()
                );
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_elapsed) => {
                warn!(
                    "{} timed out after {:?} on {}",
                    self.config.program,
                    self.config.timeout,
                    archive.display()
                );
                Err(PreviewError::AugmenterTimeout {
                    program: self.config.program.clone(),
                    timeout: self.config.timeout,
                })
            }
        }
    }

    /// Spawn the tool and wait for it, draining both output pipes.
    async fn run_tool(&self, archive: &Path) -> Result<()> {
        let mut child = Command::new(&self.config.program)
            .args(&self.config.leading_args)
            .arg(archive)
            .arg(&self.macro_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PreviewError::AugmenterUnavailable {
                program: self.config.program.clone(),
                source,
            })?;

        let program = self.config.program.as_str();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (status, _, stderr_tail) = tokio::join!(
            child.wait(),
            drain_lines(stdout, program, "stdout", 0),
            drain_lines(stderr, program, "stderr", STDERR_TAIL_LINES),
        );
        let status = status?;

        if !status.success() {
            return Err(PreviewError::AugmenterNonZeroExit {
                program: self.config.program.clone(),
                code: status.code(),
                stderr: Vec::from(stderr_tail).join("\n"),
            });
        }

        Ok(())
    }
}

/// Read `stream` to EOF, logging every line at debug and returning the last
/// `keep` non-blank ones.
async fn drain_lines<R: AsyncRead + Unpin>(
    stream: Option<R>,
    program: &str,
    label: &str,
    keep: usize,
) -> VecDeque<String> {
    let mut tail = VecDeque::with_capacity(keep);
    let Some(stream) = stream else {
        return tail;
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match (&mut reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end();
                if line.is_empty() {
                    continue;
                }
                debug!("{} {}: {}", program, label, line);
                if keep > 0 {
                    if tail.len() == keep {
                        tail.pop_front();
                    }
                    tail.push_back(line.to_string());
                }
            }
            Err(err) => {
                warn!("Stopped reading {} {}: {}", program, label, err);
                break;
            }
        }
    }
    tail
}

/// Write the bundled macro to `<home>/macros/<version>/isofit.FCMacro`.
///
/// Idempotent: an existing file with identical content is reused. The write
/// goes through a temp file and a rename so concurrent runs never observe a
/// truncated macro.
pub fn materialize_macro(home: &Path) -> Result<PathBuf> {
    let macro_dir = home.join("macros").join(CRATE_VERSION);
    let macro_path = macro_dir.join(MACRO_FILE_NAME);

    if matches!(fs::read_to_string(&macro_path), Ok(existing) if existing == ISOFIT_MACRO_SOURCE) {
        debug!("Using cached fit macro: {}", macro_path.display());
        return Ok(macro_path);
    }

    fs::create_dir_all(&macro_dir)?;

    let mut part = tempfile::Builder::new()
        .prefix(".isofit-")
        .suffix(".tmp")
        .tempfile_in(&macro_dir)?;
    part.write_all(ISOFIT_MACRO_SOURCE.as_bytes())?;
    part.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(part.path(), fs::Permissions::from_mode(0o644))?;
    }

    part.persist(&macro_path).map_err(|e| e.error)?;
    info!("Materialized fit macro v{}: {}", CRATE_VERSION, macro_path.display());

    Ok(macro_path)
}
