//! Signal flags for the capture loop.
//!
//! Handlers only set atomic flags; the loop polls and clears them between
//! `poll(2)` rounds, so no real work ever happens in signal context.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::flag::register;

#[derive(Debug, Default)]
pub struct SignalFlags {
    winch: Arc<AtomicBool>,
    flush: Arc<AtomicBool>,
    term: Arc<AtomicBool>,
    hup: Arc<AtomicBool>,
}

impl SignalFlags {
    /// Register SIGWINCH, SIGUSR1, SIGTERM and SIGHUP handlers.
    pub fn register() -> io::Result<Self> {
        let flags = Self::default();
        register(libc::SIGWINCH, Arc::clone(&flags.winch))?;
        register(libc::SIGUSR1, Arc::clone(&flags.flush))?;
        register(libc::SIGTERM, Arc::clone(&flags.term))?;
        register(libc::SIGHUP, Arc::clone(&flags.hup))?;
        Ok(flags)
    }

    /// The real terminal was resized since the last call.
    pub fn take_winch(&self) -> bool {
        self.winch.swap(false, Ordering::SeqCst)
    }

    /// A flush was requested since the last call.
    pub fn take_flush(&self) -> bool {
        self.flush.swap(false, Ordering::SeqCst)
    }

    /// A termination signal to forward to the child, if one arrived.
    pub fn take_termination(&self) -> Option<libc::c_int> {
        if self.term.swap(false, Ordering::SeqCst) {
            Some(libc::SIGTERM)
        } else if self.hup.swap(false, Ordering::SeqCst) {
            Some(libc::SIGHUP)
        } else {
            None
        }
    }
}
