use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::time::Duration;

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bf").unwrap();
    cmd.env("BF_CONFIG", "/nonexistent/bf.toml")
        .env_remove("BF_SCRIPTS_DIR")
        .env_remove("BF_LOG_FILE")
        .timeout(Duration::from_secs(10));
    cmd
}

fn scripts_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("zeta.bf"), "+").unwrap();
    fs::write(dir.path().join("alpha.bf"), "+.").unwrap();
    fs::write(dir.path().join("readme.txt"), "not a script").unwrap();
    dir
}

#[test]
fn list_prints_sorted_script_names() {
    let dir = scripts_dir();
    cargo_bin()
        .arg("list")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout("alpha\nzeta\n");
}

#[test]
fn list_uses_scripts_dir_from_environment() {
    let dir = scripts_dir();
    cargo_bin()
        .env("BF_SCRIPTS_DIR", dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"));
}

#[test]
fn bundled_scripts_are_listed() {
    cargo_bin()
        .args(["list", "--dir", "scripts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello").and(predicate::str::contains("breakpoint")));
}

#[test]
fn missing_directory_fails() {
    let dir = scripts_dir();
    cargo_bin()
        .arg("list")
        .arg("--dir")
        .arg(dir.path().join("absent"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to list scripts"));
}

#[test]
fn log_file_receives_json_execution_records() {
    let dir = scripts_dir();
    let log = dir.path().join("runs.log");
    cargo_bin()
        .arg("run")
        .arg("--log-file")
        .arg(&log)
        .arg("--dir")
        .arg(dir.path())
        .arg("alpha")
        .assert()
        .success();

    let records = fs::read_to_string(&log).expect("log file written");
    assert!(records.contains("running script"), "{records}");
    assert!(records.contains("execution finished"), "{records}");
    assert!(records.contains("\"level\":\"INFO\""), "{records}");
}

#[test]
fn missing_script_is_logged() {
    let dir = scripts_dir();
    let log = dir.path().join("runs.log");
    cargo_bin()
        .env("BF_LOG_FILE", &log)
        .args(["run", "--dir"])
        .arg(dir.path())
        .arg("ghost")
        .assert()
        .code(1);

    let records = fs::read_to_string(&log).expect("log file written");
    assert!(records.contains("script not found"), "{records}");
    assert!(records.contains("\"level\":\"WARN\""), "{records}");
}
