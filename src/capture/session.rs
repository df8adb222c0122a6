//! The capture relay loop.
//!
//! One thread multiplexes the PTY master, the real stdin and the optional
//! input FIFO with `poll(2)`. Signal flags are checked between rounds.

use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ExitStatus};
use std::time::Duration;

use super::error::CaptureError;
use super::pty::{self, read_fd, write_all_fd};
use super::signals::SignalFlags;
use super::text_buffer::TextBuffer;
use crate::wire::{ExitDisposition, LogWriter};

const STDIN_FD: RawFd = 0;

/// Which log stream a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdin,
    Fifo,
    Stdout,
}

/// Log writer plus one line buffer per captured stream.
pub(super) struct Recorder {
    log: LogWriter<File>,
    stdin: TextBuffer,
    fifo: TextBuffer,
    stdout: TextBuffer,
    record_stdin: bool,
    write_failed: bool,
}

impl Recorder {
    pub(super) fn new(log: LogWriter<File>, record_stdin: bool) -> Self {
        Self {
            log,
            stdin: TextBuffer::new(),
            fifo: TextBuffer::new(),
            stdout: TextBuffer::new(),
            record_stdin,
            write_failed: false,
        }
    }

    /// Report a failed log write once; the relay keeps running regardless.
    fn check(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if !self.write_failed {
                tracing::warn!("failed to write session log: {}", e);
                self.write_failed = true;
            }
        }
    }

    fn buffer(&mut self, stream: Stream) -> &mut TextBuffer {
        match stream {
            Stream::Stdin => &mut self.stdin,
            Stream::Fifo => &mut self.fifo,
            Stream::Stdout => &mut self.stdout,
        }
    }

    fn emit(&mut self, stream: Stream, payload: &[u8]) {
        let result = match stream {
            Stream::Stdin if !self.record_stdin => return,
            Stream::Stdin | Stream::Fifo => self.log.write_stdin(payload),
            Stream::Stdout => self.log.write_stdout(payload),
        };
        self.check(result);
    }

    fn record(&mut self, stream: Stream, data: &[u8]) {
        for payload in self.buffer(stream).append(data) {
            self.emit(stream, &payload);
        }
    }

    /// Flush pending text of every stream (SIGUSR1) and sync the file.
    fn flush(&mut self) {
        for stream in [Stream::Stdin, Stream::Fifo, Stream::Stdout] {
            if let Some(payload) = self.buffer(stream).flush() {
                self.emit(stream, &payload);
            }
        }
        let result = self.log.sync();
        self.check(result);
    }

    /// Flush everything, including split codepoints, at end of session.
    fn finish(&mut self, stream: Stream) {
        if let Some(payload) = self.buffer(stream).finish() {
            self.emit(stream, &payload);
        }
    }

    fn resize(&mut self, size: pty::WindowSize) {
        let result = self.log.write_resize(size.cols, size.rows);
        self.check(result);
    }

    pub(super) fn close(mut self, disposition: ExitDisposition) {
        for stream in [Stream::Stdin, Stream::Fifo, Stream::Stdout] {
            self.finish(stream);
        }
        let result = self.log.write_exit(disposition);
        self.check(result);
        let result = self.log.sync();
        self.check(result);
    }
}

/// Outcome of one non-blocking read.
enum ReadOutcome {
    Data(usize),
    WouldBlock,
    Closed,
}

fn read_once(fd: RawFd, buf: &mut [u8]) -> ReadOutcome {
    match read_fd(fd, buf) {
        Ok(0) => ReadOutcome::Closed,
        Ok(n) => ReadOutcome::Data(n),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => ReadOutcome::WouldBlock,
        // EIO on the master once the slave side is gone; any other error ends the source too.
        Err(e) => {
            tracing::debug!("read on fd {} ended: {}", fd, e);
            ReadOutcome::Closed
        }
    }
}

/// Live state of a running capture.
pub(super) struct Session {
    pub(super) child: Child,
    pub(super) master: OwnedFd,
    pub(super) fifo: Option<File>,
    pub(super) recorder: Recorder,
    pub(super) signals: SignalFlags,
    pub(super) max_chunk: usize,
    pub(super) poll_timeout: Duration,
    pub(super) track_resize: bool,
}

impl Session {
    /// Relay until the child exits; returns its disposition.
    pub(super) fn run(mut self) -> Result<ExitDisposition, CaptureError> {
        let mut buf = vec![0u8; self.max_chunk];
        let mut master_open = true;
        let mut stdin_open = true;
        let mut fifo_open = self.fifo.is_some();
        let timeout = i32::try_from(self.poll_timeout.as_millis()).unwrap_or(i32::MAX);

        let status = loop {
            self.handle_signals();

            let exited = self
                .child
                .try_wait()
                .map_err(|e| CaptureError::process("failed to query child status", e))?;
            if let Some(status) = exited {
                if master_open {
                    self.drain_master(&mut buf, timeout);
                }
                break status;
            }

            let mut fds: Vec<(Source, libc::pollfd)> = Vec::with_capacity(3);
            if master_open {
                fds.push((Source::Master, pollfd(self.master.as_raw_fd())));
            }
            if stdin_open {
                fds.push((Source::Stdin, pollfd(STDIN_FD)));
            }
            if let (true, Some(fifo)) = (fifo_open, &self.fifo) {
                fds.push((Source::Fifo, pollfd(fifo.as_raw_fd())));
            }

            let mut raw: Vec<libc::pollfd> = fds.iter().map(|(_, p)| *p).collect();
            let rc = unsafe { libc::poll(raw.as_mut_ptr(), raw.len() as libc::nfds_t, timeout) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(CaptureError::process("poll failed", err));
            }
            if rc == 0 {
                continue;
            }

            for ((source, _), polled) in fds.iter().zip(&raw) {
                if polled.revents & READY == 0 {
                    continue;
                }
                match source {
                    Source::Master => master_open = self.on_master(&mut buf),
                    Source::Stdin => stdin_open = self.on_input(Stream::Stdin, STDIN_FD, &mut buf),
                    Source::Fifo => {
                        if let Some(fd) = self.fifo.as_ref().map(AsRawFd::as_raw_fd) {
                            fifo_open = self.on_input(Stream::Fifo, fd, &mut buf);
                        }
                    }
                }
            }
        };

        let disposition = disposition_of(status);
        tracing::debug!("child exited: {:?}", disposition);
        self.recorder.close(disposition);
        Ok(disposition)
    }

    fn handle_signals(&mut self) {
        if self.signals.take_winch() && self.track_resize {
            if let Some(size) = pty::window_size(STDIN_FD) {
                match pty::set_window_size(self.master.as_raw_fd(), size) {
                    Ok(()) => self.recorder.resize(size),
                    Err(e) => tracing::warn!("failed to resize pty: {}", e),
                }
            }
        }
        if self.signals.take_flush() {
            tracing::debug!("flush requested");
            self.recorder.flush();
        }
        while let Some(signo) = self.signals.take_termination() {
            tracing::debug!("forwarding signal {} to child", signo);
            let pid = self.child.id() as libc::pid_t;
            if unsafe { libc::kill(pid, signo) } != 0 {
                tracing::warn!(
                    "failed to forward signal {}: {}",
                    signo,
                    io::Error::last_os_error()
                );
            }
        }
    }

    /// Returns whether the master is still open.
    fn on_master(&mut self, buf: &mut [u8]) -> bool {
        match read_once(self.master.as_raw_fd(), buf) {
            ReadOutcome::Data(n) => {
                self.relay_output(&buf[..n]);
                true
            }
            ReadOutcome::WouldBlock => true,
            ReadOutcome::Closed => false,
        }
    }

    /// Forward input from the real stdin or the FIFO to the child.
    /// Returns whether the source is still open.
    fn on_input(&mut self, stream: Stream, fd: RawFd, buf: &mut [u8]) -> bool {
        match read_once(fd, buf) {
            ReadOutcome::Data(n) => {
                let data = &buf[..n];
                if let Err(e) = write_all_fd(self.master.as_raw_fd(), data) {
                    tracing::warn!("failed to forward input to child: {}", e);
                }
                self.recorder.record(stream, data);
                true
            }
            ReadOutcome::WouldBlock => true,
            ReadOutcome::Closed => {
                tracing::debug!("{:?} reached end of input", stream);
                self.recorder.finish(stream);
                false
            }
        }
    }

    fn relay_output(&mut self, data: &[u8]) {
        let mut out = io::stdout().lock();
        if let Err(e) = out.write_all(data).and_then(|()| out.flush()) {
            tracing::trace!("stdout write failed: {}", e);
        }
        self.recorder.record(Stream::Stdout, data);
    }

    /// Collect output still in flight after the child exited.
    ///
    /// The line discipline hands data to the master asynchronously, so keep
    /// reading until the slave side reports EOF/EIO or nothing arrives for
    /// one poll interval (a grandchild may still hold the slave open).
    fn drain_master(&mut self, buf: &mut [u8], timeout: i32) {
        let fd = self.master.as_raw_fd();
        loop {
            match read_once(fd, buf) {
                ReadOutcome::Data(n) => self.relay_output(&buf[..n]),
                ReadOutcome::Closed => break,
                ReadOutcome::WouldBlock => {
                    let mut pfd = [pollfd(fd)];
                    let rc = unsafe { libc::poll(pfd.as_mut_ptr(), 1, timeout) };
                    if rc == 0 {
                        tracing::debug!("pty still open after child exit, stopping drain");
                        break;
                    }
                    if rc < 0 && io::Error::last_os_error().kind() != io::ErrorKind::Interrupted {
                        break;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Master,
    Stdin,
    Fifo,
}

const READY: libc::c_short = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;

fn pollfd(fd: RawFd) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }
}

pub(super) fn disposition_of(status: ExitStatus) -> ExitDisposition {
    match (status.code(), status.signal()) {
        (Some(code), _) => ExitDisposition::Exited(code),
        (None, Some(signo)) => ExitDisposition::Signaled(signo),
        (None, None) => ExitDisposition::Exited(1),
    }
}
