//! Capture command handler

use std::path::PathBuf;

use anyhow::Result;

use ptyrec::capture::{self, CaptureOptions};
use ptyrec::Config;

/// Arguments of `ptyrec capture` after parsing.
pub struct CaptureArgs {
    pub out: PathBuf,
    pub append: bool,
    pub no_stdin: bool,
    pub no_inherit_size: bool,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub input_fifo: Option<PathBuf>,
    pub max_chunk: Option<u64>,
    pub command: Vec<String>,
}

/// Command to run when none was given: `$SHELL`, else `/bin/sh`.
fn default_command() -> Vec<String> {
    let shell = std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string());
    vec![shell]
}

/// Build capture options from flags, falling back to config values.
pub fn options(args: CaptureArgs, config: &Config) -> CaptureOptions {
    let argv = if args.command.is_empty() {
        default_command()
    } else {
        args.command
    };
    let max_chunk = args
        .max_chunk
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(config.capture.max_chunk);

    CaptureOptions {
        argv,
        cwd: args.cwd,
        env: args.env,
        output: args.out,
        append: args.append,
        record_stdin: !args.no_stdin,
        inherit_size: !args.no_inherit_size,
        default_size: config.capture.default_size(),
        max_chunk,
        poll_timeout: config.capture.poll_timeout(),
        input_fifo: args.input_fifo,
    }
}

/// Run the capture and return the exit code ptyrec should exit with.
///
/// Capture errors are reported here rather than propagated, since each
/// carries its own exit code.
#[cfg(not(tarpaulin_include))]
pub fn handle(args: CaptureArgs, config: &Config) -> Result<i32> {
    let opts = options(args, config);
    tracing::debug!("capturing {:?} into {}", opts.argv, opts.output.display());

    match capture::capture(&opts) {
        Ok(disposition) => Ok(disposition.wrapper_exit_code()),
        Err(e) => {
            eprintln!("ptyrec: {}", e);
            Ok(e.exit_code())
        }
    }
}
