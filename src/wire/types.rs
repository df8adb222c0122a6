//! Type definitions for the session log format.
//!
//! A session log is NDJSON: every line is one self-contained JSON object
//! describing a single event. There is no header line; the `start` event
//! carries the session metadata.
//!
//! # Example
//!
//! ```text
//! {"v":1,"t_ms":1700000000000,"type":"start","cols":80,"rows":24,"argv":["echo","hi"],"cwd":"/tmp","pid":4242}
//! {"v":1,"t_ms":1700000000003,"type":"stdout","n":4,"data":"hi\r\n"}
//! {"v":1,"t_ms":1700000000004,"type":"stdout","n":4,"data":"G1swbQ==","enc":"b64"}
//! {"v":1,"t_ms":1700000000005,"type":"exit","how":"code","code":0}
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::error::WireError;
use crate::capture::classify::{classify, Classification};

/// Schema version written into every event.
pub const SCHEMA_VERSION: u32 = 1;

/// One line of a session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Schema version (always [`SCHEMA_VERSION`] for events we write).
    pub v: u32,

    /// Milliseconds since the Unix epoch. Non-decreasing within one writer.
    pub t_ms: u64,

    /// The event payload, tagged by the `type` field.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(t_ms: u64, kind: EventKind) -> Self {
        Self {
            v: SCHEMA_VERSION,
            t_ms,
            kind,
        }
    }

    /// Check if this is a stdout event.
    pub fn is_stdout(&self) -> bool {
        matches!(self.kind, EventKind::Stdout(_))
    }

    /// The payload chunk for stdin/stdout events.
    pub fn chunk(&self) -> Option<&Chunk> {
        match &self.kind {
            EventKind::Stdin(chunk) | EventKind::Stdout(chunk) => Some(chunk),
            _ => None,
        }
    }
}

/// Event variants, keyed by the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    /// Opens a session: initial geometry, command line, working directory and child pid.
    Start {
        cols: u16,
        rows: u16,
        argv: Vec<String>,
        cwd: String,
        pid: u32,
    },

    /// Bytes read from the real terminal (or input FIFO) and forwarded to the child.
    Stdin(Chunk),

    /// Bytes the child wrote to its terminal.
    Stdout(Chunk),

    /// The real terminal was resized and the new geometry applied to the PTY.
    Resize { cols: u16, rows: u16 },

    /// Closes a session with the child's disposition.
    Exit {
        how: ExitHow,
        #[serde(alias = "signal")]
        code: i32,
    },

    /// Any event type this reader does not know about.
    #[serde(other)]
    Other,
}

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitHow {
    /// Normal exit; `code` is the exit status.
    Code,
    /// Killed by a signal; `code` is the signal number.
    Signal,
}

/// Payload encoding tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "b64")]
    Base64,
}

/// Payload of a stdin/stdout event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Decoded byte length, not the JSON string length.
    pub n: usize,

    /// Verbatim text, or base64 when `enc` is set.
    pub data: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc: Option<Encoding>,
}

impl Chunk {
    /// Encode raw bytes, choosing verbatim text or base64 by [`classify`].
    pub fn encode(bytes: &[u8]) -> Self {
        match classify(bytes) {
            Classification::Text(text) => Self {
                n: bytes.len(),
                data: text.to_string(),
                enc: None,
            },
            Classification::Binary => Self {
                n: bytes.len(),
                data: STANDARD.encode(bytes),
                enc: Some(Encoding::Base64),
            },
        }
    }

    /// Decode the payload back into raw bytes, checking the declared length.
    pub fn decode(&self) -> Result<Vec<u8>, WireError> {
        let bytes = match self.enc {
            None => self.data.as_bytes().to_vec(),
            Some(Encoding::Base64) => STANDARD.decode(self.data.as_bytes())?,
        };
        if bytes.len() != self.n {
            return Err(WireError::LengthMismatch {
                declared: self.n,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    pub fn is_base64(&self) -> bool {
        self.enc == Some(Encoding::Base64)
    }
}

/// Final disposition of the wrapped child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    Exited(i32),
    Signaled(i32),
}

impl ExitDisposition {
    /// Status for a wrapper process to exit with: the code itself, or
    /// `128 + signo` for signal deaths (shell convention).
    pub fn wrapper_exit_code(&self) -> i32 {
        match *self {
            ExitDisposition::Exited(code) => code,
            ExitDisposition::Signaled(signo) => 128 + signo,
        }
    }

    pub fn to_event_kind(self) -> EventKind {
        match self {
            ExitDisposition::Exited(code) => EventKind::Exit {
                how: ExitHow::Code,
                code,
            },
            ExitDisposition::Signaled(signo) => EventKind::Exit {
                how: ExitHow::Signal,
                code: signo,
            },
        }
    }
}
