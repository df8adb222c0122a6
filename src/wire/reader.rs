//! Session log parser.
//!
//! Parses single NDJSON lines into [`Event`]s. Lines arrive as raw bytes so
//! that invalid UTF-8 is reported as a format error of that line instead of
//! an I/O error of the whole stream.
//!
//! # Example
//!
//! ```
//! use ptyrec::wire::{Event, EventKind};
//!
//! let event = Event::from_json_line(br#"{"v":1,"t_ms":5,"type":"stdout","n":5,"data":"aGVsbG8=","enc":"b64"}"#)?;
//! let chunk = event.chunk().unwrap();
//! assert_eq!(chunk.decode()?, b"hello");
//! # Ok::<(), ptyrec::wire::WireError>(())
//! ```

use std::io::{self, BufRead};

use super::error::WireError;
use super::types::{Event, SCHEMA_VERSION};

impl Event {
    /// Parse an event from one log line (with or without its trailing newline).
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not UTF-8, not a JSON event object,
    /// or carries a schema version other than [`SCHEMA_VERSION`].
    pub fn from_json_line(line: &[u8]) -> Result<Self, WireError> {
        let text = std::str::from_utf8(line)?;
        let event: Event = serde_json::from_str(text.trim_end_matches(['\n', '\r']))?;
        if event.v != SCHEMA_VERSION {
            return Err(WireError::UnsupportedVersion(event.v));
        }
        Ok(event)
    }
}

/// Iterates over raw newline-delimited lines of any buffered reader.
///
/// Each item is the line without its terminator, paired with its 1-based
/// line number. A final line lacking a newline is still yielded.
pub struct LogLines<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> LogLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }
}

impl<R: BufRead> Iterator for LogLines<R> {
    type Item = io::Result<(usize, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                if buf.ends_with(b"\n") {
                    buf.pop();
                }
                Some(Ok((self.line_no, buf)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
