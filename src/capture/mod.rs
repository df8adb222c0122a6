//! Session capture.
//!
//! Runs a command inside a pseudo-terminal, relays bytes between the real
//! terminal and the child, and appends every event to a session log.
//!
//! # Structure
//!
//! - `classify` - Text/binary decision for captured chunks
//! - `text_buffer` - Per-stream line buffering
//! - `pty` - PTY allocation, spawning and descriptor I/O
//! - `signals` - Signal flags polled by the relay loop
//! - `term` - Raw mode for the real terminal
//! - `session` - The relay loop itself

pub mod classify;
mod error;
pub mod pty;
mod session;
mod signals;
mod term;
mod text_buffer;

pub use classify::{classify, Classification};
pub use error::CaptureError;
pub use pty::WindowSize;
pub use text_buffer::TextBuffer;

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::wire::{ExitDisposition, LogWriter};
use session::{Recorder, Session};
use signals::SignalFlags;
use term::RawModeGuard;

/// Default read size for every source.
pub const DEFAULT_MAX_CHUNK: usize = 32 * 1024;

/// Everything a capture needs; path and config resolution happen in the CLI.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Command line of the child; `argv[0]` is resolved against `PATH`.
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Extra environment for the child, applied on top of ours.
    pub env: Vec<(String, String)>,
    pub output: PathBuf,
    pub append: bool,
    /// Record real-stdin bytes in the log. They are forwarded regardless.
    pub record_stdin: bool,
    /// Take the PTY geometry from the real terminal and follow its resizes.
    pub inherit_size: bool,
    /// Geometry used when not inheriting, or when stdin is not a terminal.
    pub default_size: WindowSize,
    pub max_chunk: usize,
    pub poll_timeout: Duration,
    /// FIFO whose bytes are injected into the child as input.
    pub input_fifo: Option<PathBuf>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            argv: Vec::new(),
            cwd: None,
            env: Vec::new(),
            output: PathBuf::from("session.jsonl"),
            append: false,
            record_stdin: true,
            inherit_size: true,
            default_size: WindowSize { cols: 80, rows: 24 },
            max_chunk: DEFAULT_MAX_CHUNK,
            poll_timeout: Duration::from_millis(50),
            input_fifo: None,
        }
    }
}

impl CaptureOptions {
    fn initial_size(&self) -> WindowSize {
        if self.inherit_size {
            pty::window_size(0).unwrap_or(self.default_size)
        } else {
            self.default_size
        }
    }

    /// `PATH` the child will see, honouring an override in `env`.
    fn search_path(&self) -> Option<OsString> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == "PATH")
            .map(|(_, v)| OsString::from(v))
            .or_else(|| std::env::var_os("PATH"))
    }

    fn cwd_display(&self) -> String {
        self.cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

/// Run a capture session to completion.
///
/// Returns the child's disposition once its `exit` event is in the log.
/// A command that cannot be found or executed still leaves a start/exit
/// pair behind (exit code 127 or 126) before the error is returned.
pub fn capture(opts: &CaptureOptions) -> Result<ExitDisposition, CaptureError> {
    let program = opts.argv.first().cloned().unwrap_or_default();

    let mut log = LogWriter::open(&opts.output, opts.append).map_err(|e| {
        CaptureError::io(format!("cannot open log {}", opts.output.display()), e)
    })?;

    if let Some(dir) = &opts.cwd {
        if !dir.is_dir() {
            return Err(CaptureError::io(
                format!("cannot use working directory {}", dir.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
    }

    let fifo = opts.input_fifo.as_deref().map(open_fifo).transpose()?;
    let size = opts.initial_size();
    let search_path = opts.search_path();

    let resolved =
        match pty::resolve_program(&program, opts.cwd.as_deref(), search_path.as_deref()) {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!("cannot start {}: {}", program, err);
                record_failed_start(&mut log, opts, size, err.exit_code());
                return Err(err);
            }
        };

    let signals = SignalFlags::register()
        .map_err(|e| CaptureError::process("failed to register signal handlers", e))?;
    let _raw = RawModeGuard::enable()
        .map_err(|e| CaptureError::process("failed to enable raw mode", e))?;
    let pair =
        pty::open_pty(size).map_err(|e| CaptureError::process("failed to allocate pty", e))?;
    pty::set_nonblocking(pair.master.as_raw_fd())
        .map_err(|e| CaptureError::process("failed to configure pty", e))?;

    let request = pty::SpawnRequest {
        program: &resolved,
        argv: &opts.argv,
        cwd: opts.cwd.as_deref(),
        env: &opts.env,
    };
    let child = match pty::spawn_on_pty(&pair, &request) {
        Ok(child) => child,
        Err(err) => {
            record_failed_start(&mut log, opts, size, err.exit_code());
            return Err(err);
        }
    };
    let pty::PtyPair { master, slave } = pair;
    drop(slave);

    tracing::debug!(
        "spawned {} (pid {}) at {}x{}",
        program,
        child.id(),
        size.cols,
        size.rows
    );
    let started = log.write_start(
        size.cols,
        size.rows,
        &opts.argv,
        &opts.cwd_display(),
        child.id(),
    );
    if let Err(e) = started {
        tracing::warn!("failed to write session log: {}", e);
    }

    let recorder = Recorder::new(log, opts.record_stdin);
    Session {
        child,
        master,
        fifo,
        recorder,
        signals,
        max_chunk: opts.max_chunk.max(1),
        poll_timeout: opts.poll_timeout,
        track_resize: opts.inherit_size,
    }
    .run()
}

/// Open the input FIFO read/write so it never reports EOF while idle.
fn open_fifo(path: &Path) -> Result<File, CaptureError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
        .map_err(|e| CaptureError::io(format!("cannot open input fifo {}", path.display()), e))
}

/// Keep the log well-formed when the child never started.
fn record_failed_start(
    log: &mut LogWriter<File>,
    opts: &CaptureOptions,
    size: WindowSize,
    code: i32,
) {
    let result = log
        .write_start(size.cols, size.rows, &opts.argv, &opts.cwd_display(), 0)
        .and_then(|()| log.write_exit(ExitDisposition::Exited(code)));
    if let Err(e) = result {
        tracing::warn!("failed to write session log: {}", e);
    }
}
