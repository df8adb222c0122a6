//! Capture error types.

use std::io;

use thiserror::Error;

/// Failure of a capture session before the child's disposition is known.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The log, input FIFO or working directory could not be used.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// PTY allocation, spawn, signal or terminal-mode failure.
    #[error("{context}: {source}")]
    Process {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("cannot execute {program}: {source}")]
    NotExecutable {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl CaptureError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        CaptureError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn process(context: impl Into<String>, source: io::Error) -> Self {
        CaptureError::Process {
            context: context.into(),
            source,
        }
    }

    /// Exit status a wrapper should terminate with (sysexits / shell conventions).
    pub fn exit_code(&self) -> i32 {
        match self {
            CaptureError::Io { .. } => 74,
            CaptureError::Process { .. } => 70,
            CaptureError::CommandNotFound { .. } => 127,
            CaptureError::NotExecutable { .. } => 126,
        }
    }
}
