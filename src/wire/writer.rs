//! Session log writer.
//!
//! Every event is serialized to a complete line and handed to the sink with a
//! single `write_all`, so a reader never observes half an event even if the
//! writer is killed between events.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;

use super::types::{Chunk, Event, EventKind, ExitDisposition};

impl Event {
    /// Serialize the event as one JSON line, newline included.
    pub fn to_json_line(&self) -> Vec<u8> {
        // Event contains only strings, integers and enums; serialization cannot fail.
        let mut line = serde_json::to_vec(self).unwrap_or_default();
        line.push(b'\n');
        line
    }
}

/// Append-only event sink that stamps each event with a non-decreasing
/// millisecond timestamp.
pub struct LogWriter<W: Write> {
    out: W,
    last_ms: u64,
}

impl LogWriter<File> {
    /// Open (or create) a log file.
    ///
    /// The file is always opened with `O_APPEND`, so writes land at the
    /// current end of file even if a collaborator truncates it mid-session.
    /// When `append` is false any previous content is discarded first.
    pub fn open<P: AsRef<Path>>(path: P, append: bool) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        if !append {
            file.set_len(0)?;
        }
        Ok(Self::new(file))
    }

    /// Flush file contents to stable storage.
    pub fn sync(&mut self) -> io::Result<()> {
        self.out.sync_data()
    }
}

impl<W: Write> LogWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, last_ms: 0 }
    }

    fn stamp(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last_ms = self.last_ms.max(now);
        self.last_ms
    }

    /// Write one event of the given kind.
    pub fn write_event(&mut self, kind: EventKind) -> io::Result<()> {
        let event = Event::new(self.stamp(), kind);
        self.out.write_all(&event.to_json_line())?;
        self.out.flush()
    }

    pub fn write_start(
        &mut self,
        cols: u16,
        rows: u16,
        argv: &[String],
        cwd: &str,
        pid: u32,
    ) -> io::Result<()> {
        self.write_event(EventKind::Start {
            cols,
            rows,
            argv: argv.to_vec(),
            cwd: cwd.to_string(),
            pid,
        })
    }

    pub fn write_stdin(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_event(EventKind::Stdin(Chunk::encode(data)))
    }

    pub fn write_stdout(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_event(EventKind::Stdout(Chunk::encode(data)))
    }

    pub fn write_resize(&mut self, cols: u16, rows: u16) -> io::Result<()> {
        self.write_event(EventKind::Resize { cols, rows })
    }

    pub fn write_exit(&mut self, disposition: ExitDisposition) -> io::Result<()> {
        self.write_event(disposition.to_event_kind())
    }

    /// Consume the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}
