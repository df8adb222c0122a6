//! `ptyrec render --follow` against a log that grows while it is read.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;

fn append(path: &std::path::Path, line: &str) {
    let mut f = OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(line.as_bytes()).unwrap();
}

#[test]
fn follow_streams_new_lines_until_interrupted() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("live.jsonl");
    fs::write(
        &log,
        "{\"v\":1,\"t_ms\":1,\"type\":\"stdout\",\"n\":6,\"data\":\"early\\n\"}\n",
    )
    .unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_ptyrec"))
        .args(["render", "--follow"])
        .arg(&log)
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn ptyrec");
    let mut stdout = BufReader::new(child.stdout.take().unwrap());

    let mut line = String::new();
    stdout.read_line(&mut line).unwrap();
    assert_eq!(line, "early\n");

    std::thread::sleep(Duration::from_millis(50));
    append(
        &log,
        "{\"v\":1,\"t_ms\":2,\"type\":\"stdout\",\"n\":5,\"data\":\"late\\n\"}\n",
    );
    line.clear();
    stdout.read_line(&mut line).unwrap();
    assert_eq!(line, "late\n");

    append(
        &log,
        "{\"v\":1,\"t_ms\":3,\"type\":\"stdout\",\"n\":7,\"data\":\"partial\"}\n",
    );
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGINT) }, 0);

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(0));
    assert_eq!(rest, "partial");
}
