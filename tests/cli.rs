use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn lecsum(config_home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lecsum").unwrap();
    // Keep config reads and writes inside the test sandbox
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    cmd.env("HOME", config_home.path());
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    lecsum(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("deps"));
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    lecsum(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lecsum"));
}

#[test]
fn test_unsupported_format_is_a_client_error() {
    let home = tempfile::tempdir().unwrap();
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"not media").unwrap();
    file.flush().unwrap();

    lecsum(&home)
        .args(["summarize", &file.path().to_string_lossy()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_unrecognized_url_is_a_client_error() {
    let home = tempfile::tempdir().unwrap();
    lecsum(&home)
        .args(["summarize", "https://example.com/video"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_missing_file_is_treated_as_bad_input() {
    let home = tempfile::tempdir().unwrap();
    lecsum(&home)
        .args(["summarize", "/nonexistent/lecture.mp4"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_config_show() {
    let home = tempfile::tempdir().unwrap();
    lecsum(&home)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Max Upload"));
}
