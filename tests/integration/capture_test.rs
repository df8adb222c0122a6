//! End-to-end capture tests: run a command under `ptyrec capture`, then
//! inspect the log and its rendering.

use std::fs;
use std::io::Read;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::process::{Child, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use tempfile::TempDir;

use ptyrec::capture::pty::{open_pty, set_window_size, WindowSize};
use ptyrec::render_log;
use ptyrec::wire::{Event, EventKind, ExitHow, LogLines};

fn ptyrec() -> Command {
    Command::cargo_bin("ptyrec").expect("binary built")
}

/// Run `ptyrec capture -o <log> [extra] -- <command>` and return the exit code.
fn capture(log: &Path, extra: &[&str], command: &[&str]) -> i32 {
    let output = ptyrec()
        .arg("capture")
        .arg("-o")
        .arg(log)
        .args(extra)
        .arg("--")
        .args(command)
        .output()
        .expect("Failed to execute ptyrec");
    output.status.code().unwrap_or(-1)
}

fn read_events(log: &Path) -> Vec<Event> {
    let bytes = fs::read(log).expect("log exists");
    LogLines::new(&bytes[..])
        .map(|line| Event::from_json_line(&line.unwrap().1).expect("well-formed event"))
        .collect()
}

fn rendered(log: &Path) -> String {
    render_log(&fs::read(log).expect("log exists"))
}

#[test]
fn echo_renders_exactly_its_output() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("echo.jsonl");

    assert_eq!(capture(&log, &[], &["echo", "hello world"]), 0);
    assert_eq!(rendered(&log), "hello world\n");
}

#[test]
fn log_is_framed_by_start_and_exit() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("framed.jsonl");

    assert_eq!(capture(&log, &["--no-inherit-size"], &["echo", "hi"]), 0);
    let events = read_events(&log);
    match &events.first().unwrap().kind {
        EventKind::Start {
            cols, rows, argv, pid, ..
        } => {
            assert_eq!((*cols, *rows), (80, 24));
            assert_eq!(argv, &vec!["echo".to_string(), "hi".to_string()]);
            assert!(*pid > 0);
        }
        other => panic!("expected start, got {:?}", other),
    }
    assert_eq!(
        events.last().unwrap().kind,
        EventKind::Exit {
            how: ExitHow::Code,
            code: 0
        }
    );
    assert!(events.windows(2).all(|w| w[0].t_ms <= w[1].t_ms));
}

#[test]
fn exit_status_is_propagated() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("status.jsonl");

    assert_eq!(capture(&log, &[], &["sh", "-c", "exit 3"]), 3);
    assert_eq!(
        read_events(&log).last().unwrap().kind,
        EventKind::Exit {
            how: ExitHow::Code,
            code: 3
        }
    );
}

#[test]
fn signal_death_maps_to_128_plus_signo() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("signal.jsonl");

    assert_eq!(capture(&log, &[], &["sh", "-c", "kill -TERM $$"]), 143);
    assert_eq!(
        read_events(&log).last().unwrap().kind,
        EventKind::Exit {
            how: ExitHow::Signal,
            code: 15
        }
    );
}

#[test]
fn missing_command_exits_127_with_a_well_formed_log() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("missing.jsonl");

    let code = capture(&log, &[], &["ptyrec-test-no-such-command"]);
    assert_eq!(code, 127);
    let events = read_events(&log);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0].kind, EventKind::Start { pid: 0, .. }));
    assert_eq!(
        events[1].kind,
        EventKind::Exit {
            how: ExitHow::Code,
            code: 127
        }
    );
}

#[test]
fn non_executable_file_exits_126() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("noexec.jsonl");
    let script = temp.path().join("script.sh");
    fs::write(&script, "#!/bin/sh\necho nope\n").unwrap();

    let code = capture(&log, &[], &[script.to_str().unwrap()]);
    assert_eq!(code, 126);
}

#[test]
fn unopenable_log_exits_74() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("no/such/dir/log.jsonl");

    ptyrec()
        .arg("capture")
        .arg("-o")
        .arg(&log)
        .args(["--", "true"])
        .assert()
        .code(74)
        .stderr(predicates::str::contains("cannot open log"));
}

#[test]
fn cwd_and_env_reach_the_child() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("env.jsonl");
    let work = temp.path().join("work");
    fs::create_dir(&work).unwrap();
    let work = work.canonicalize().unwrap();

    let code = capture(
        &log,
        &[
            "--cwd",
            work.to_str().unwrap(),
            "--env",
            "PTYREC_GREETING=hi there",
        ],
        &["sh", "-c", "pwd; echo \"$PTYREC_GREETING\""],
    );
    assert_eq!(code, 0);
    assert_eq!(
        rendered(&log),
        format!("{}\nhi there\n", work.display())
    );
}

#[test]
fn append_keeps_earlier_sessions() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("append.jsonl");

    assert_eq!(capture(&log, &[], &["echo", "one"]), 0);
    assert_eq!(capture(&log, &["--append"], &["echo", "two"]), 0);
    let starts = read_events(&log)
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Start { .. }))
        .count();
    assert_eq!(starts, 2);
    assert_eq!(rendered(&log), "one\ntwo\n");

    assert_eq!(capture(&log, &[], &["echo", "three"]), 0);
    assert_eq!(rendered(&log), "three\n");
}

#[test]
fn colored_output_is_base64_and_renders_clean() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("color.jsonl");

    let code = capture(&log, &[], &["printf", "\\033[1;31mred\\033[0m plain\\n"]);
    assert_eq!(code, 0);
    let events = read_events(&log);
    let stdout: Vec<_> = events.iter().filter(|e| e.is_stdout()).collect();
    assert!(stdout.iter().any(|e| e.chunk().unwrap().is_base64()));
    assert_eq!(rendered(&log), "red plain\n");
}

#[test]
fn small_max_chunk_keeps_utf8_intact() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("utf8.jsonl");

    let code = capture(&log, &["--max-chunk", "1"], &["echo", "naïve → ✓"]);
    assert_eq!(code, 0);
    assert_eq!(rendered(&log), "naïve → ✓\n");
    for event in read_events(&log) {
        if let Some(chunk) = event.chunk() {
            if !chunk.is_base64() {
                assert_eq!(chunk.n, chunk.data.len());
            }
        }
    }
}

#[test]
fn input_fifo_feeds_the_child_and_is_recorded() {
    use std::ffi::CString;
    use std::io::Write;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let log = temp.path().join("fifo.jsonl");
    let fifo = temp.path().join("input");
    let c_path = CString::new(fifo.as_os_str().as_bytes()).unwrap();
    assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) }, 0);

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_ptyrec"))
        .arg("capture")
        .arg("-o")
        .arg(&log)
        .arg("--input-fifo")
        .arg(&fifo)
        .args(["--", "head", "-n", "1"])
        .stdin(Stdio::null())
        .spawn()
        .expect("Failed to spawn ptyrec");

    // Opening for write blocks until ptyrec has the FIFO open.
    let mut writer = fs::OpenOptions::new().write(true).open(&fifo).unwrap();
    writer.write_all(b"ping\n").unwrap();
    drop(writer);

    let status = child.wait().unwrap();
    assert_eq!(status.code(), Some(0));

    let events = read_events(&log);
    let injected: Vec<u8> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Stdin(_)))
        .flat_map(|e| e.chunk().unwrap().decode().unwrap())
        .collect();
    assert_eq!(injected, b"ping\n");
    assert!(rendered(&log).contains("ping"));
}

#[test]
fn no_stdin_leaves_input_out_of_the_log() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("nostdin.jsonl");

    let output = ptyrec()
        .arg("capture")
        .arg("-o")
        .arg(&log)
        .args(["--no-stdin", "--", "sh", "-c", "sleep 0.3"])
        .write_stdin("typed\n")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(read_events(&log)
        .iter()
        .all(|e| !matches!(e.kind, EventKind::Stdin(_))));
}

/// Start `ptyrec capture -o <log> -- <command>` in the background with its
/// stdout piped back to the test.
fn spawn_capture(log: &Path, command: &[&str], stdin: Stdio) -> Child {
    std::process::Command::new(env!("CARGO_BIN_EXE_ptyrec"))
        .arg("capture")
        .arg("-o")
        .arg(log)
        .arg("--")
        .args(command)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn ptyrec")
}

/// Block until the relayed output contains `marker`. ptyrec writes output to
/// its stdout before recording it, and installs its signal handlers before
/// the child starts, so seeing the marker means both are in place.
fn wait_for_output(child: &mut Child, marker: &str) {
    let stdout = child.stdout.as_mut().expect("stdout is piped");
    let mut seen = Vec::new();
    let mut buf = [0u8; 256];
    while !String::from_utf8_lossy(&seen).contains(marker) {
        let n = stdout.read(&mut buf).unwrap();
        assert!(n > 0, "output ended before {marker:?}: {seen:?}");
        seen.extend_from_slice(&buf[..n]);
    }
}

fn send_signal(child: &Child, signo: libc::c_int) {
    assert_eq!(unsafe { libc::kill(child.id() as libc::pid_t, signo) }, 0);
}

/// Re-read the log until `done` accepts its events or the deadline passes.
fn wait_for_events(log: &Path, done: impl Fn(&[Event]) -> bool) -> Vec<Event> {
    let deadline = Instant::now() + Duration::from_millis(1500);
    loop {
        let events = if log.exists() { read_events(log) } else { Vec::new() };
        if done(&events) || Instant::now() >= deadline {
            return events;
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn is_stdout(event: &Event, text: &str) -> bool {
    matches!(event.kind, EventKind::Stdout(_))
        && event.chunk().unwrap().decode().unwrap() == text.as_bytes()
}

#[test]
fn sigusr1_flushes_a_partial_line_while_the_child_runs() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("usr1.jsonl");

    let mut child = spawn_capture(&log, &["sh", "-c", "printf prompt; sleep 2"], Stdio::null());
    wait_for_output(&mut child, "prompt");
    send_signal(&child, libc::SIGUSR1);

    let events = wait_for_events(&log, |events| events.iter().any(|e| is_stdout(e, "prompt")));
    assert!(events.iter().any(|e| is_stdout(e, "prompt")), "{events:?}");
    assert!(events
        .iter()
        .all(|e| !matches!(e.kind, EventKind::Exit { .. })));

    assert_eq!(child.wait().unwrap().code(), Some(0));
    let events = read_events(&log);
    assert!(matches!(
        events.last().unwrap().kind,
        EventKind::Exit {
            how: ExitHow::Code,
            code: 0
        }
    ));
    // The flushed text is not written a second time at exit.
    assert_eq!(rendered(&log), "prompt");
}

#[test]
fn sigterm_is_forwarded_and_recorded_as_the_disposition() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("term.jsonl");

    let mut child = spawn_capture(&log, &["sh", "-c", "printf ready; sleep 5"], Stdio::null());
    wait_for_output(&mut child, "ready");
    send_signal(&child, libc::SIGTERM);

    assert_eq!(child.wait().unwrap().code(), Some(143));
    let events = read_events(&log);
    assert_eq!(
        events.last().unwrap().kind,
        EventKind::Exit {
            how: ExitHow::Signal,
            code: 15
        }
    );
    assert!(events.iter().any(|e| is_stdout(e, "ready")));
}

#[test]
fn sigwinch_copies_the_new_size_and_logs_a_resize() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("winch.jsonl");

    let terminal = open_pty(WindowSize { cols: 80, rows: 24 }).unwrap();
    let mut child = spawn_capture(
        &log,
        &["sh", "-c", "printf ready; sleep 1"],
        Stdio::from(terminal.slave),
    );
    wait_for_output(&mut child, "ready");

    set_window_size(
        terminal.master.as_raw_fd(),
        WindowSize {
            cols: 100,
            rows: 33,
        },
    )
    .unwrap();
    send_signal(&child, libc::SIGWINCH);

    let resized = EventKind::Resize {
        cols: 100,
        rows: 33,
    };
    let events = wait_for_events(&log, |events| events.iter().any(|e| e.kind == resized));
    assert!(events.iter().any(|e| e.kind == resized), "{events:?}");

    assert_eq!(child.wait().unwrap().code(), Some(0));
    let events = read_events(&log);
    match &events[0].kind {
        EventKind::Start { cols, rows, .. } => assert_eq!((*cols, *rows), (80, 24)),
        other => panic!("expected start, got {other:?}"),
    }
    drop(terminal.master);
}
