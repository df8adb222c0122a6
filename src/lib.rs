//! ptyrec Library
//!
//! Records terminal sessions run inside a pseudo-terminal to an NDJSON
//! session log, and renders those logs back into plain text.
//!
//! - [`capture`] - the Capturer: PTY relay and event recording
//! - [`render`] - the Renderer: log replay through [`terminal::Screen`]
//! - [`wire`] - the session log format shared by both

pub mod capture;
pub mod config;
pub mod logging;
pub mod render;
pub mod terminal;
pub mod utils;
pub mod wire;

pub use capture::{capture, CaptureError, CaptureOptions};
pub use config::Config;
pub use render::{render, render_log, ErrorPolicy, RenderError, RenderOptions};
pub use terminal::Screen;
pub use wire::{Event, EventKind, ExitDisposition, LogWriter};
