use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfixture-thumbnail";

fn fcpreview_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fcpreview"))
}

fn run_cli(args: &[&str], home: &Path, envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(fcpreview_bin());
    cmd.args(args)
        .env("FCPREVIEW_HOME", home)
        .env_remove("FCPREVIEW_FREECAD")
        .env_remove("RUST_LOG");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute fcpreview CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn describe(output: &Output) -> String {
    format!("stdout:\n{}\nstderr:\n{}", stdout(output), stderr(output))
}

fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

fn write_fcstd(path: &Path, thumbnail: &[u8]) {
    write_archive(
        path,
        &[
            ("Document.xml", b"<Document/>".as_slice()),
            ("thumbnails/Thumbnail.png", thumbnail),
        ],
    );
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn batch_extracts_single_archive() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("cube.FCStd"), PNG_BYTES);

    let output = run_cli(&[path_arg(dir.path())], home.path(), &[]);

    assert!(output.status.success(), "{}", describe(&output));
    let preview = fs::read(dir.path().join("cube-preview.png")).unwrap();
    assert!(!preview.is_empty());
    assert_eq!(preview, PNG_BYTES);

    let out = stdout(&output);
    assert!(out.contains("Extracting images from all FreeCAD files in"), "{}", out);
    assert!(out.contains("Found 1 .FCStd files to check"), "{}", out);
    assert!(out.contains("All 1 files processed successfully"), "{}", out);
}

#[test]
fn batch_reports_invalid_archive_and_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("a.FCStd"), PNG_BYTES);
    fs::write(dir.path().join("b.FCStd"), [0u8; 10]).unwrap();

    let output = run_cli(&[path_arg(dir.path())], home.path(), &[]);

    assert!(!output.status.success(), "{}", describe(&output));
    assert!(dir.path().join("a-preview.png").exists());
    assert!(!dir.path().join("b-preview.png").exists());
    assert!(stdout(&output).contains("1 failed out of 2"), "{}", describe(&output));
}

#[test]
fn batch_skips_ignored_archives() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("model1.FCStd"), PNG_BYTES);
    write_fcstd(&dir.path().join("archived/old.FCStd"), PNG_BYTES);
    let ignore = dir.path().join(".fcignore");
    fs::write(&ignore, "# old stuff\narchived/*.FCStd\n").unwrap();

    let output = run_cli(
        &[path_arg(dir.path()), "--ignore-config", path_arg(&ignore)],
        home.path(),
        &[],
    );

    assert!(output.status.success(), "{}", describe(&output));
    assert!(dir.path().join("model1-preview.png").exists());
    assert!(!dir.path().join("archived/old-preview.png").exists());

    let out = stdout(&output);
    assert!(out.contains("Loaded 1 ignore patterns"), "{}", out);
    assert!(out.contains("Ignored 1 files based on"), "{}", out);
    assert!(out.contains("All 1 files processed successfully"), "{}", out);
}

#[test]
fn batch_with_everything_ignored_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("a.FCStd"), PNG_BYTES);
    let ignore = dir.path().join("ignore.txt");
    fs::write(&ignore, "*.FCStd\n").unwrap();

    let output = run_cli(
        &[path_arg(dir.path()), "--ignore-config", path_arg(&ignore)],
        home.path(),
        &[],
    );

    assert!(!output.status.success(), "{}", describe(&output));
    assert!(stdout(&output).contains("All files were filtered out by ignore patterns"));
    assert!(!dir.path().join("a-preview.png").exists());
}

#[test]
fn batch_with_missing_ignore_file_still_runs() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("a.FCStd"), PNG_BYTES);
    let missing = dir.path().join("no-such-ignore");

    let output = run_cli(
        &[path_arg(dir.path()), "--ignore-config", path_arg(&missing)],
        home.path(),
        &[],
    );

    assert!(output.status.success(), "{}", describe(&output));
    assert!(stderr(&output).contains("Ignore config file not found"), "{}", describe(&output));
    assert!(dir.path().join("a-preview.png").exists());
}

#[test]
fn empty_directory_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();

    let output = run_cli(&[path_arg(dir.path())], home.path(), &[]);

    assert!(!output.status.success());
    assert!(stdout(&output).contains("No .FCStd files found"), "{}", describe(&output));
}

#[test]
fn fit_with_unavailable_tool_names_it_and_keeps_originals() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("cube.FCStd");
    write_fcstd(&archive, PNG_BYTES);
    let before = fs::read(&archive).unwrap();

    let output = run_cli(
        &[path_arg(dir.path()), "--fit", "--freecad", "fcpreview-missing-tool"],
        home.path(),
        &[],
    );

    assert!(!output.status.success(), "{}", describe(&output));
    let combined = describe(&output);
    assert!(combined.contains("fcpreview-missing-tool"), "{}", combined);
    assert!(stderr(&output).contains("TRY:"), "{}", combined);
    assert_eq!(fs::read(&archive).unwrap(), before);
    assert!(!dir.path().join("cube-preview.png").exists());
}

#[test]
fn fit_program_from_environment() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("cube.FCStd"), PNG_BYTES);

    let output = run_cli(
        &[path_arg(dir.path()), "--fit"],
        home.path(),
        &[("FCPREVIEW_FREECAD", "fcpreview-env-tool")],
    );

    assert!(!output.status.success());
    assert!(describe(&output).contains("fcpreview-env-tool"), "{}", describe(&output));
}

#[cfg(unix)]
#[test]
fn fit_command_from_config_file_augments_copy() {
    let home = TempDir::new().unwrap();
    let tools = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();

    let augmented = tools.path().join("augmented.FCStd");
    write_fcstd(&augmented, b"\x89PNGisometric");
    let script = tools.path().join("fake-freecad.sh");
    fs::write(
        &script,
        format!("#!/bin/sh\ncp '{}' \"$1\"\n", augmented.display()),
    )
    .unwrap();
    fs::write(
        home.path().join("config.toml"),
        format!(
            "[fit]\ncommand = [\"sh\", \"{}\"]\ntimeout_secs = 30\n",
            script.display()
        ),
    )
    .unwrap();

    let archive = dir.path().join("cube.FCStd");
    write_fcstd(&archive, PNG_BYTES);
    let before = fs::read(&archive).unwrap();

    let output = run_cli(&[path_arg(dir.path()), "--fit"], home.path(), &[]);

    assert!(output.status.success(), "{}", describe(&output));
    assert!(stdout(&output).contains("(with isometric fit)"));
    assert_eq!(
        fs::read(dir.path().join("cube-preview.png")).unwrap(),
        b"\x89PNGisometric"
    );
    assert_eq!(fs::read(&archive).unwrap(), before);
    assert!(home
        .path()
        .join("macros")
        .join(env!("CARGO_PKG_VERSION"))
        .join("isofit.FCMacro")
        .exists());
}

#[test]
fn single_file_default_and_custom_output() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("part.FCStd");
    write_fcstd(&archive, PNG_BYTES);

    let output = run_cli(&[path_arg(&archive)], home.path(), &[]);
    assert!(output.status.success(), "{}", describe(&output));
    assert_eq!(fs::read(dir.path().join("part-preview.png")).unwrap(), PNG_BYTES);

    let custom = dir.path().join("renders/part.png");
    let output = run_cli(
        &[path_arg(&archive), "-o", path_arg(&custom)],
        home.path(),
        &[],
    );
    assert!(output.status.success(), "{}", describe(&output));
    assert_eq!(fs::read(&custom).unwrap(), PNG_BYTES);
    assert!(stdout(&output).contains("Saved preview to"));
}

#[test]
fn single_file_failures_are_specific() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("ghost.FCStd");
    let output = run_cli(&[path_arg(&missing)], home.path(), &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("File not found"), "{}", describe(&output));

    let text = dir.path().join("notes.txt");
    fs::write(&text, "hello").unwrap();
    let output = run_cli(&[path_arg(&text)], home.path(), &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Not a .FCStd file"), "{}", describe(&output));

    let plain = dir.path().join("plain.FCStd");
    write_archive(&plain, &[("Document.xml", b"<Document/>".as_slice())]);
    let output = run_cli(&[path_arg(&plain)], home.path(), &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No thumbnail found"), "{}", describe(&output));
    assert!(!dir.path().join("plain-preview.png").exists());
}

#[test]
fn missing_directory_is_fatal() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();

    let output = run_cli(&[path_arg(&dir.path().join("nowhere"))], home.path(), &[]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Path not found"), "{}", describe(&output));
}

#[test]
fn json_report_for_batch() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("a.FCStd"), PNG_BYTES);
    fs::write(dir.path().join("b.FCStd"), [0u8; 10]).unwrap();

    let output = run_cli(&[path_arg(dir.path()), "--json"], home.path(), &[]);
    assert!(!output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)
        .unwrap_or_else(|err| panic!("invalid JSON: {}\n{}", err, describe(&output)));
    assert_eq!(value["success"], false);
    assert_eq!(value["discovered"], 2);
    assert_eq!(value["tally"]["succeeded"], 1);
    assert_eq!(value["tally"]["failed"], 1);
    assert!(value["failures"][0]["path"]
        .as_str()
        .unwrap()
        .ends_with("b.FCStd"));
}

#[test]
fn json_result_for_single_file() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("cube.FCStd");
    write_fcstd(&archive, PNG_BYTES);

    let output = run_cli(&[path_arg(&archive), "--json"], home.path(), &[]);
    assert!(output.status.success(), "{}", describe(&output));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["success"], true);
    assert!(value["output"].as_str().unwrap().ends_with("cube-preview.png"));
}

#[test]
fn malformed_config_is_fatal() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("a.FCStd"), PNG_BYTES);
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[fit\n").unwrap();

    let output = run_cli(
        &[path_arg(dir.path()), "--config", path_arg(&config)],
        home.path(),
        &[],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Cannot parse config"), "{}", describe(&output));
    assert!(!dir.path().join("a-preview.png").exists());
}

#[test]
fn logs_are_written_under_home() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_fcstd(&dir.path().join("a.FCStd"), PNG_BYTES);

    let output = run_cli(&[path_arg(dir.path())], home.path(), &[]);
    assert!(output.status.success(), "{}", describe(&output));

    let log = fs::read_to_string(home.path().join("logs/fcpreview.log")).unwrap();
    assert!(log.contains("Extracted thumbnail"), "{}", log);
}
