//! Cooperative cancellation for long-running loops.
//!
//! Termination signals set a shared flag instead of killing the process, so
//! the loop can finish its current step and flush what it holds:
//! - SIGINT (Ctrl+C) via ctrlc handler
//! - SIGTERM and SIGHUP via signal_hook

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route SIGINT, SIGTERM and SIGHUP to this token.
    ///
    /// Only the first token in a process can own the Ctrl+C handler; later
    /// registrations of SIGINT are ignored.
    pub fn register_signal_handlers(&self) {
        let flag = Arc::clone(&self.cancelled);
        if ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)).is_err() {
            tracing::debug!("ctrl-c handler already installed");
        }

        #[cfg(unix)]
        {
            use signal_hook::flag::register;
            for signal in [libc::SIGTERM, libc::SIGHUP] {
                if let Err(e) = register(signal, Arc::clone(&self.cancelled)) {
                    tracing::warn!("failed to register handler for signal {}: {}", signal, e);
                }
            }
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
