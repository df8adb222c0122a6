//! Unit tests for the session log format shared by capture and render

use ptyrec::wire::{Event, EventKind, ExitDisposition, ExitHow, LogLines, LogWriter};
use ptyrec::render_log;

use crate::helpers::load_fixture;

fn written_session(write: impl FnOnce(&mut LogWriter<Vec<u8>>)) -> Vec<u8> {
    let mut writer = LogWriter::new(Vec::new());
    write(&mut writer);
    writer.into_inner()
}

fn events(log: &[u8]) -> Vec<Event> {
    LogLines::new(log)
        .map(|line| Event::from_json_line(&line.unwrap().1).unwrap())
        .collect()
}

#[test]
fn writer_output_renders_back() {
    let log = written_session(|w| {
        w.write_start(80, 24, &["sh".to_string()], "/tmp", 99).unwrap();
        w.write_stdout(b"plain line\r\n").unwrap();
        w.write_stdout(b"\x1b[31mred\x1b[0m\r\n").unwrap();
        w.write_stdin(b"q").unwrap();
        w.write_exit(ExitDisposition::Exited(0)).unwrap();
    });
    assert_eq!(render_log(&log), "plain line\nred\n");
}

#[test]
fn every_line_is_a_versioned_event() {
    let log = written_session(|w| {
        w.write_start(80, 24, &["sh".to_string()], "/", 1).unwrap();
        w.write_resize(120, 40).unwrap();
        w.write_exit(ExitDisposition::Signaled(9)).unwrap();
    });
    let events = events(&log);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.v == 1));
    assert!(events.windows(2).all(|w| w[0].t_ms <= w[1].t_ms));
    assert_eq!(
        events[2].kind,
        EventKind::Exit {
            how: ExitHow::Signal,
            code: 9
        }
    );
}

#[test]
fn binary_payload_survives_the_log() {
    let bytes = [0xff, 0x00, 0x1b, b'x'];
    let log = written_session(|w| w.write_stdout(&bytes).unwrap());
    let events = events(&log);
    let chunk = events[0].chunk().unwrap();
    assert!(chunk.is_base64());
    assert_eq!(chunk.decode().unwrap(), bytes);
}

#[test]
fn legacy_fixture_parses() {
    let fixture = load_fixture("legacy_signal_exit.jsonl");
    let events = events(fixture.as_bytes());
    assert_eq!(events.len(), 4);
    assert_eq!(events[1].kind, EventKind::Other);
    assert_eq!(
        events[3].kind,
        EventKind::Exit {
            how: ExitHow::Signal,
            code: 15
        }
    );
}
