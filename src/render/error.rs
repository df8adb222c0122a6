//! Render error types.

use std::io;

use thiserror::Error;

use crate::wire::WireError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot write rendered output: {0}")]
    Write(#[source] io::Error),

    /// A malformed line under the abort policy.
    #[error("line {line}: {source}")]
    Format {
        line: usize,
        #[source]
        source: WireError,
    },
}

impl RenderError {
    /// Exit status for the CLI (sysexits conventions).
    pub fn exit_code(&self) -> i32 {
        match self {
            RenderError::Read { .. } | RenderError::Write(_) => 74,
            RenderError::Format { .. } => 65,
        }
    }
}
