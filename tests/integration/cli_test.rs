//! CLI surface tests: usage errors, help, completions and config handling.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{fixture_path, write_config};

fn ptyrec() -> Command {
    let mut cmd = Command::cargo_bin("ptyrec").expect("binary built");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_exits_zero() {
    ptyrec()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("capture"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn version_exits_zero() {
    ptyrec()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    ptyrec().arg("replay").assert().code(64);
}

#[test]
fn capture_without_output_is_a_usage_error() {
    ptyrec()
        .args(["capture", "--", "true"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("--out"));
}

#[test]
fn malformed_env_pair_is_a_usage_error() {
    ptyrec()
        .args(["capture", "-o", "unused.jsonl", "--env", "NOEQUALS", "--", "true"])
        .assert()
        .code(64);
}

#[test]
fn completions_mention_subcommands() {
    ptyrec()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ptyrec"))
        .stdout(predicate::str::contains("capture"));
}

#[test]
fn invalid_config_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, "[capture]\nmax_chunk = 0\n");
    ptyrec()
        .arg("--config")
        .arg(&config)
        .arg("render")
        .arg(fixture_path("hello_b64.jsonl"))
        .assert()
        .code(64)
        .stderr(predicate::str::contains("max_chunk"));
}

#[test]
fn config_can_make_rendering_strict() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, "[render]\non_error = \"abort\"\n");
    ptyrec()
        .arg("--config")
        .arg(&config)
        .arg("render")
        .arg(fixture_path("malformed.jsonl"))
        .assert()
        .code(65)
        .stdout("first\n");
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    ptyrec()
        .arg("--config")
        .arg(temp.path().join("nope.toml"))
        .arg("render")
        .arg(fixture_path("hello_b64.jsonl"))
        .assert()
        .success()
        .stdout("hello");
}
