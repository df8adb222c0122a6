//! Session log wire format.
//!
//! The capturer writes and the renderer reads newline-delimited JSON, one
//! event per line. Neither side owns the format; this module is the shared
//! contract.
//!
//! # Structure
//!
//! - `types` - Event model and payload encoding
//! - `reader` - Parsing log lines
//! - `writer` - Appending events to a log
//! - `error` - Format errors

mod error;
mod reader;
mod types;
mod writer;

pub use error::WireError;
pub use reader::LogLines;
pub use types::{Chunk, Encoding, Event, EventKind, ExitDisposition, ExitHow, SCHEMA_VERSION};
pub use writer::LogWriter;
