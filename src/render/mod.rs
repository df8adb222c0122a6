//! Session log rendering.
//!
//! Replays a session log through the [`Screen`] interpreter and writes the
//! visible text: every completed line followed by `\n`, and at the end any
//! pending partial line as-is.
//!
//! # Structure
//!
//! - `source` - Finite and follow-mode line sources
//! - `error` - Render errors and their exit codes

mod error;
mod source;

pub use error::RenderError;
pub use source::{FollowSource, LineSource, PollBackoff, ReaderSource};

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::terminal::Screen;
use crate::wire::{Event, EventKind, WireError};

/// What to do with a malformed log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Report the line and continue with the next one.
    #[default]
    Skip,
    /// Report the line and stop.
    Abort,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub on_error: ErrorPolicy,
}

/// A malformed line, as handed to the report callback.
#[derive(Debug)]
pub struct FormatIssue {
    pub line: usize,
    pub error: WireError,
}

/// Counters for a finished render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Well-formed events read.
    pub events: usize,
    /// Lines written to the output (the final partial line included).
    pub lines: usize,
    /// Malformed lines skipped.
    pub skipped: usize,
    /// The log contained an `exit` event.
    pub saw_exit: bool,
}

/// Decode one log line, along with the bytes of its stdout payload (empty
/// for other event kinds).
fn decode_line(line: &[u8]) -> Result<(Event, Vec<u8>), WireError> {
    let event = Event::from_json_line(line)?;
    let data = match &event.kind {
        EventKind::Stdout(chunk) => chunk.decode()?,
        _ => Vec::new(),
    };
    Ok((event, data))
}

/// Render every line `source` yields into `out`.
///
/// Malformed lines are passed to `report` and then skipped or turned into
/// [`RenderError::Format`] according to the policy. Output already written
/// stays written either way.
pub fn render<S, W>(
    source: &mut S,
    out: &mut W,
    opts: &RenderOptions,
    report: &mut dyn FnMut(&FormatIssue),
) -> Result<RenderSummary, RenderError>
where
    S: LineSource + ?Sized,
    W: Write + ?Sized,
{
    let mut screen = Screen::new();
    let mut summary = RenderSummary::default();

    loop {
        let next = source.next_line().map_err(|e| RenderError::Read {
            path: source.name().to_string(),
            source: e,
        })?;
        let Some((line_no, bytes)) = next else { break };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let (event, data) = match decode_line(&bytes) {
            Ok(decoded) => decoded,
            Err(error) => {
                let issue = FormatIssue {
                    line: line_no,
                    error,
                };
                report(&issue);
                match opts.on_error {
                    ErrorPolicy::Skip => {
                        summary.skipped += 1;
                        continue;
                    }
                    ErrorPolicy::Abort => {
                        out.flush().map_err(RenderError::Write)?;
                        return Err(RenderError::Format {
                            line: issue.line,
                            source: issue.error,
                        });
                    }
                }
            }
        };

        summary.events += 1;
        match event.kind {
            EventKind::Stdout(_) => {
                write_lines(&mut screen, &data, out, &mut summary).map_err(RenderError::Write)?;
            }
            EventKind::Exit { .. } => summary.saw_exit = true,
            _ => {}
        }
    }

    if let Some(rest) = screen.finish() {
        out.write_all(rest.as_bytes()).map_err(RenderError::Write)?;
        summary.lines += 1;
    }
    out.flush().map_err(RenderError::Write)?;

    if screen.dropped_bytes() > 0 {
        tracing::debug!("dropped {} invalid UTF-8 bytes", screen.dropped_bytes());
    }
    Ok(summary)
}

fn write_lines<W: Write + ?Sized>(
    screen: &mut Screen,
    data: &[u8],
    out: &mut W,
    summary: &mut RenderSummary,
) -> io::Result<()> {
    let mut result = Ok(());
    screen.process(data, &mut |line| {
        if result.is_ok() {
            result = out
                .write_all(line.as_bytes())
                .and_then(|()| out.write_all(b"\n"));
            summary.lines += 1;
        }
    });
    result?;
    out.flush()
}

/// Render a complete in-memory log, skipping malformed lines.
pub fn render_log(log: &[u8]) -> String {
    let mut source = ReaderSource::new(log, "<memory>");
    let mut out = Vec::new();
    // Reading from memory and writing to a Vec cannot fail; skip never aborts.
    let _ = render(&mut source, &mut out, &RenderOptions::default(), &mut |_| {});
    String::from_utf8_lossy(&out).into_owned()
}
