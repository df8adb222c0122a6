//! Terminal escape sequence handlers.
//!
//! This module contains handlers for the escape sequence categories the
//! line model supports:
//! - cursor: Cursor movement on the current line
//! - editing: Erase, delete and insert operations

pub mod cursor;
pub mod editing;

use tracing::trace;

/// Log an unhandled CSI sequence for debugging.
pub fn log_unhandled_csi(action: char, params: &[u16], private: Option<u8>, intermediates: &[u8]) {
    trace!(
        action = %action,
        params = ?params,
        private = ?private.map(char::from),
        intermediates = ?intermediates,
        "Unhandled CSI sequence"
    );
}

/// Log an unhandled ESC sequence for debugging.
pub fn log_unhandled_esc(byte: u8, intermediates: &[u8]) {
    trace!(
        byte = byte,
        byte_char = %char::from(byte),
        intermediates = ?intermediates,
        "Unhandled ESC sequence"
    );
}
