//! Raw-mode handling for the real terminal.

use std::io;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Keeps the real terminal in raw mode for as long as it lives.
///
/// Keystrokes must reach the child untouched (Ctrl+C included), so line
/// discipline is switched off on our side of the relay. A no-op when stdin
/// is not a terminal.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        if !atty::is(atty::Stream::Stdin) {
            return Ok(Self { active: false });
        }
        enable_raw_mode()?;
        tracing::debug!("raw mode enabled");
        Ok(Self { active: true })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
            tracing::debug!("raw mode restored");
        }
    }
}
