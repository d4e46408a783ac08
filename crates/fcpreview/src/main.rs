//! fcpreview launcher
//!
//! Extracts the embedded thumbnail of FreeCAD documents into
//! `<name>-preview.png` files, optionally re-rendering it first with FreeCAD
//! in an isometric "fit all" view.

use clap::Parser;
use fcpreview_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "fcpreview",
    version,
    about = "Extract preview images from FreeCAD .FCStd files"
)]
struct Cli {
    /// Directory to scan recursively, or a single .FCStd file (default: current directory)
    path: Option<PathBuf>,

    /// Re-render each thumbnail with FreeCAD (isometric view, fit all) before extracting
    #[arg(long)]
    fit: bool,

    /// File of glob patterns, relative to the scan root, to skip
    #[arg(long, value_name = "FILE")]
    ignore_config: Option<PathBuf>,

    /// Output image path (single-file mode only)
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Seconds to wait for FreeCAD before killing it
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    fit_timeout: Option<u64>,

    /// FreeCAD executable used by --fit
    #[arg(long, value_name = "PROGRAM", env = "FCPREVIEW_FREECAD")]
    freecad: Option<String>,

    /// Settings file (default: ~/.fcpreview/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn into_extract_args(self) -> cli::extract::ExtractArgs {
        cli::extract::ExtractArgs {
            path: self.path,
            fit: self.fit,
            ignore_config: self.ignore_config,
            output: self.output,
            fit_timeout: self.fit_timeout,
            freecad: self.freecad,
            config: self.config,
            json: self.json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "fcpreview",
        verbose: cli.verbose,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    let json_mode = cli.json;
    match cli::extract::run(cli.into_extract_args()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            if json_mode {
                cli::output::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch_flags() {
        let cli = Cli::try_parse_from([
            "fcpreview",
            "--fit",
            "--ignore-config",
            ".fcignore",
            "--fit-timeout",
            "60",
            "models",
        ])
        .unwrap();
        assert!(cli.fit);
        assert_eq!(cli.path, Some(PathBuf::from("models")));
        assert_eq!(cli.ignore_config, Some(PathBuf::from(".fcignore")));
        assert_eq!(cli.fit_timeout, Some(60));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["fcpreview", "--fit-timeout", "0"]).is_err());
    }
}
