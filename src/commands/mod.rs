//! Command handlers for the ptyrec CLI.
//!
//! Each submodule handles one subcommand and returns the process exit code.
//! The main dispatch logic remains in main.rs.

pub mod capture;
pub mod completions;
pub mod render;
