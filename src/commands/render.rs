//! Render command handler

use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::Result;

use ptyrec::render::{
    self, ErrorPolicy, FollowSource, LineSource, ReaderSource, RenderError, RenderOptions,
};
use ptyrec::utils::CancelToken;
use ptyrec::Config;

/// Render a log (or stdin for `-`) to stdout and return the exit code.
#[cfg(not(tarpaulin_include))]
pub fn handle(file: &Path, follow: bool, strict: bool, config: &Config) -> Result<i32> {
    let opts = RenderOptions {
        on_error: if strict {
            ErrorPolicy::Abort
        } else {
            config.render.on_error
        },
    };

    let mut source = match open_source(file, follow, config) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("ptyrec: {}", e);
            return Ok(e.exit_code());
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut report = |issue: &render::FormatIssue| {
        eprintln!("ptyrec: line {}: {}", issue.line, issue.error);
    };

    match render::render(source.as_mut(), &mut out, &opts, &mut report) {
        Ok(summary) => {
            tracing::debug!(
                "rendered {} events into {} lines, skipped {}",
                summary.events,
                summary.lines,
                summary.skipped
            );
            Ok(0)
        }
        Err(e @ RenderError::Format { .. }) => Ok(e.exit_code()),
        Err(e) => {
            eprintln!("ptyrec: {}", e);
            Ok(e.exit_code())
        }
    }
}

fn open_source(
    file: &Path,
    follow: bool,
    config: &Config,
) -> Result<Box<dyn LineSource>, RenderError> {
    let read_err = |source: io::Error| RenderError::Read {
        path: file.display().to_string(),
        source,
    };

    if file == Path::new("-") {
        if follow {
            tracing::debug!("--follow has no effect on stdin");
        }
        let stdin = io::stdin().lock();
        return Ok(Box::new(ReaderSource::new(stdin, "<stdin>")));
    }

    if follow {
        let cancel = CancelToken::new();
        cancel.register_signal_handlers();
        let source =
            FollowSource::open(file, config.render.backoff(), cancel).map_err(read_err)?;
        Ok(Box::new(source))
    } else {
        Ok(Box::new(ReaderSource::open(file).map_err(read_err)?))
    }
}
