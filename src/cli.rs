//! CLI definitions for ptyrec
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so the completions command can build the command tree.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// Build clap styles.
///
/// - Green: headers, usage, command names
/// - White: descriptions, placeholders (renders as light gray on dark terminals)
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "ptyrec")]
#[command(about = "Record terminal sessions to an NDJSON log and render them back as text")]
#[command(
    long_about = "ptyrec - Record terminal sessions to an NDJSON log and render them back as text.

A capture runs a command inside a pseudo-terminal, relays everything between
your terminal and the command, and appends timestamped events to a session log.
Rendering replays the log's output through a small line-oriented terminal
interpreter and prints the visible text.

QUICK START:
    ptyrec capture -o session.jsonl            Record an interactive shell
    ptyrec capture -o build.jsonl -- make      Record a single command
    ptyrec render session.jsonl                Print what the session showed
    ptyrec render --follow session.jsonl       Tail a live session"
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Config file to use instead of ~/.config/ptyrec/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a command in a PTY and record the session
    #[command(long_about = "Run a command inside a pseudo-terminal and record the session.

Every chunk of output, every keystroke, window resizes and the final exit
status are appended to the log as one JSON object per line. ptyrec exits
with the command's own status (128 + signal number for signal deaths).

Send SIGUSR1 to flush buffered partial lines to the log.

EXAMPLES:
    ptyrec capture -o session.jsonl
    ptyrec capture -o ci.jsonl --no-stdin -- cargo test
    ptyrec capture -o run.jsonl --append --env TERM=dumb -- ./deploy.sh
    ptyrec capture -o bot.jsonl --input-fifo /tmp/keys -- python3")]
    Capture {
        /// Session log to write
        #[arg(short, long, value_name = "LOG")]
        out: PathBuf,
        /// Append to an existing log instead of truncating it
        #[arg(long)]
        append: bool,
        /// Forward keystrokes but leave them out of the log
        #[arg(long)]
        no_stdin: bool,
        /// Use the configured default size instead of the terminal's, and ignore resizes
        #[arg(long)]
        no_inherit_size: bool,
        /// Working directory for the command
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,
        /// Extra environment variable for the command (repeatable)
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
        /// FIFO whose bytes are sent to the command as input
        #[arg(long, value_name = "PATH")]
        input_fifo: Option<PathBuf>,
        /// Largest single read in bytes
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        max_chunk: Option<u64>,
        /// Command to run (defaults to $SHELL, then /bin/sh)
        #[arg(last = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Render a session log as plain text
    #[command(long_about = "Render a session log as plain text.

Output events are replayed through a line-oriented terminal interpreter:
cursor movement and erasures within the current line are applied, styling
and other escape sequences are dropped. Malformed log lines are reported
on stderr and skipped unless --strict is given.

EXAMPLES:
    ptyrec render session.jsonl
    ptyrec render --strict session.jsonl
    cat session.jsonl | ptyrec render -
    ptyrec render --follow session.jsonl")]
    Render {
        /// Session log to read, or - for stdin
        #[arg(value_name = "LOG")]
        file: PathBuf,
        /// Keep reading as the log grows, until interrupted
        #[arg(short, long)]
        follow: bool,
        /// Stop at the first malformed line (exit 65)
        #[arg(long)]
        strict: bool,
    },

    /// Generate shell completions
    #[command(long_about = "Generate a shell completion script on stdout.

EXAMPLES:
    ptyrec completions bash > ~/.local/share/bash-completion/completions/ptyrec
    ptyrec completions zsh > ~/.zfunc/_ptyrec")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

/// Parse a `KEY=VALUE` pair. The value may be empty or contain `=`.
pub fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("missing variable name in '{}'", s)),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}
