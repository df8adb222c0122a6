//! Format errors raised while reading a session log.

/// A single log line could not be turned into a usable event.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("line is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload length mismatch: declared {declared} bytes, decoded {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}
