//! Settings file parsing
//!
//! Reads optional settings from `<home>/config.toml` or a file passed with
//! `--config`. Every key has a default, so an empty file is valid.
//!
//! ```toml
//! [fit]
//! command = ["freecad"]
//! timeout_secs = 300
//! macro_path = "/path/to/custom.FCMacro"
//! ```

use crate::preview::{FitConfig, DEFAULT_FIT_PROGRAM, DEFAULT_FIT_TIMEOUT_SECS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the application home.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Error type for settings operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Result type for settings operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root of the settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub fit: FitSettings,
}

/// `[fit]` section
#[derive(Debug, Clone, Deserialize)]
pub struct FitSettings {
    /// Program followed by any leading arguments
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Upper bound on one tool run (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Macro to run instead of the bundled isometric fit macro
    #[serde(default)]
    pub macro_path: Option<PathBuf>,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            timeout_secs: default_timeout_secs(),
            macro_path: None,
        }
    }
}

fn default_command() -> Vec<String> { vec![DEFAULT_FIT_PROGRAM.to_string()] }
fn default_timeout_secs() -> u64 { DEFAULT_FIT_TIMEOUT_SECS }

/// Values given on the command line (or through the environment) that take
/// precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct FitOverrides {
    /// Replaces the whole configured command
    pub program: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from an explicit file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `<home>/config.toml` if present, defaults otherwise.
    pub fn load_default(home: &Path) -> Result<Self> {
        let path = home.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Resolve the fit tool configuration, applying `overrides` first.
    pub fn fit_config(&self, overrides: &FitOverrides) -> Result<FitConfig> {
        let command = match &overrides.program {
            Some(program) => vec![program.clone()],
            None => self.fit.command.clone(),
        };
        let mut parts = command.into_iter();
        let program = match parts.next() {
            Some(program) if !program.trim().is_empty() => program,
            _ => {
                return Err(ConfigError::Invalid(
                    "fit.command must name a program".to_string(),
                ))
            }
        };

        let timeout_secs = overrides.timeout_secs.unwrap_or(self.fit.timeout_secs);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fit timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(FitConfig {
            program,
            leading_args: parts.collect(),
            timeout: Duration::from_secs(timeout_secs),
            macro_path: self.fit.macro_path.clone(),
        })
    }
}
