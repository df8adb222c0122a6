//! Where log lines come from.
//!
//! A [`ReaderSource`] reads any buffered reader to its end. A
//! [`FollowSource`] tails a growing file until it is cancelled.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::CancelToken;
use crate::wire::LogLines;

/// A stream of numbered raw log lines.
pub trait LineSource {
    /// The next line (1-based number, bytes without the newline), or `None`
    /// when the source is exhausted or cancelled.
    fn next_line(&mut self) -> io::Result<Option<(usize, Vec<u8>)>>;

    /// Human-readable name for error messages.
    fn name(&self) -> &str;
}

/// Reads a finite stream once.
pub struct ReaderSource<R> {
    lines: LogLines<R>,
    name: String,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            lines: LogLines::new(reader),
            name: name.into(),
        }
    }
}

impl ReaderSource<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> io::Result<Option<(usize, Vec<u8>)>> {
        self.lines.next().transpose()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Backoff bounds for polling a file that has no new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBackoff {
    pub min: Duration,
    pub max: Duration,
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(10),
            max: Duration::from_millis(250),
        }
    }
}

impl PollBackoff {
    /// Next delay after `current` came up empty.
    pub fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).clamp(self.min, self.max)
    }
}

/// Tails a log file: yields complete lines as they are appended, waits with
/// bounded exponential backoff at end of file, and starts over from the
/// beginning when the file shrinks.
pub struct FollowSource {
    reader: BufReader<File>,
    path: PathBuf,
    name: String,
    /// Bytes consumed so far (complete lines plus `partial`).
    offset: u64,
    /// An unterminated line seen at end of file, waiting for its newline.
    partial: Vec<u8>,
    line_no: usize,
    backoff: PollBackoff,
    cancel: CancelToken,
}

impl FollowSource {
    pub fn open(path: &Path, backoff: PollBackoff, cancel: CancelToken) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            name: path.display().to_string(),
            offset: 0,
            partial: Vec::new(),
            line_no: 0,
            backoff,
            cancel,
        })
    }

    /// Restart from the top if the file is now shorter than what we read.
    fn check_truncation(&mut self) -> io::Result<()> {
        let len = std::fs::metadata(&self.path)?.len();
        if len < self.offset {
            tracing::warn!(
                "{} shrank from {} to {} bytes, restarting from the beginning",
                self.name,
                self.offset,
                len
            );
            self.reader.seek(SeekFrom::Start(0))?;
            self.offset = 0;
            self.partial.clear();
            self.line_no = 0;
        }
        Ok(())
    }
}

impl LineSource for FollowSource {
    fn next_line(&mut self) -> io::Result<Option<(usize, Vec<u8>)>> {
        let mut delay = self.backoff.min;
        loop {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }

            let n = self.reader.read_until(b'\n', &mut self.partial)?;
            self.offset += n as u64;
            if self.partial.ends_with(b"\n") {
                let mut line = std::mem::take(&mut self.partial);
                line.pop();
                self.line_no += 1;
                return Ok(Some((self.line_no, line)));
            }

            if n > 0 {
                delay = self.backoff.min;
            }
            self.check_truncation()?;
            std::thread::sleep(delay);
            delay = self.backoff.next(delay);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
