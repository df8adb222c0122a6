//! ptyrec - CLI entry point

mod cli;
mod commands;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;

use cli::{Cli, Commands};
use commands::capture::CaptureArgs;
use ptyrec::{logging, Config};

/// Exit code for command-line and config errors.
const EXIT_USAGE: i32 = 64;
const EXIT_IO: i32 = 74;

#[cfg(not(tarpaulin_include))]
fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_USAGE,
            };
            // Printing help or a usage error to a closed stream is not worth reporting.
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ptyrec: {:#}", e);
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

#[cfg(not(tarpaulin_include))]
fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init_tracing(&config.logging.level);

    match cli.command {
        Commands::Capture {
            out,
            append,
            no_stdin,
            no_inherit_size,
            cwd,
            env,
            input_fifo,
            max_chunk,
            command,
        } => commands::capture::handle(
            CaptureArgs {
                out,
                append,
                no_stdin,
                no_inherit_size,
                cwd,
                env,
                input_fifo,
                max_chunk,
                command,
            },
            &config,
        ),
        Commands::Render {
            file,
            follow,
            strict,
        } => commands::render::handle(&file, follow, strict, &config),
        Commands::Completions { shell } => {
            commands::completions::handle::<Cli>(shell)?;
            Ok(0)
        }
    }
}

/// Errors that escape a handler are either config problems (usage) or I/O.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.is::<toml::de::Error>()) {
        return EXIT_USAGE;
    }
    if err.chain().any(|cause| cause.is::<std::io::Error>()) {
        return EXIT_IO;
    }
    EXIT_USAGE
}
