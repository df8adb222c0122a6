//! `ptyrec render` against fixture logs.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::helpers::{fixture_path, load_fixture};

fn ptyrec() -> Command {
    Command::cargo_bin("ptyrec").expect("binary built")
}

#[test]
fn renders_base64_fixture() {
    ptyrec()
        .arg("render")
        .arg(fixture_path("hello_b64.jsonl"))
        .assert()
        .success()
        .stdout("hello");
}

#[test]
fn renders_from_stdin_with_dash() {
    ptyrec()
        .args(["render", "-"])
        .write_stdin(load_fixture("shell_session.jsonl"))
        .assert()
        .success()
        .stdout("dev@box:~$ ls\nCargo.toml  src\ndev@box:~$ exit\n");
}

#[test]
fn malformed_lines_are_reported_and_skipped() {
    ptyrec()
        .arg("render")
        .arg(fixture_path("malformed.jsonl"))
        .assert()
        .success()
        .stdout("first\nsecond\n")
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn strict_stops_at_first_malformed_line() {
    ptyrec()
        .args(["render", "--strict"])
        .arg(fixture_path("malformed.jsonl"))
        .assert()
        .code(65)
        .stdout("first\n")
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn missing_log_exits_74() {
    ptyrec()
        .args(["render", "/nonexistent/ptyrec/session.jsonl"])
        .assert()
        .code(74)
        .stderr(predicate::str::contains("/nonexistent/ptyrec/session.jsonl"));
}
