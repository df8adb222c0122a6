//! Virtual line interpreter.
//!
//! Reconstructs the visible text of a terminal byte stream. The model is a
//! single virtual line with a cursor column: text overwrites at the cursor,
//! CSI cursor and erase sequences edit the line, and a newline emits it.
//! Styling, OSC/DCS strings and private modes are parsed and discarded.
//!
//! Rows, scroll regions and the alternate screen are not modelled.

mod handlers;
mod interpreter;
mod types;


pub use types::{
    CsiParams, LineBuffer, ParserState, StringKind, Utf8Decoder, Utf8Step, MAX_LINE_WIDTH,
};

use std::fmt;

use interpreter::Interpreter;

/// Interpreter state plus the line being edited.
///
/// State survives across [`Screen::process`] calls, so an escape sequence or
/// a UTF-8 codepoint split between two payloads is handled transparently.
#[derive(Debug, Default)]
pub struct Screen {
    line: LineBuffer,
    interpreter: Interpreter,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed output bytes. `on_line` receives each completed line (without
    /// its newline) as soon as the newline is seen.
    pub fn process(&mut self, data: &[u8], on_line: &mut dyn FnMut(String)) {
        for &byte in data {
            self.interpreter.advance(&mut self.line, byte, on_line);
        }
    }

    /// End of input: returns the pending line if it has any content and
    /// resets the interpreter. An unfinished sequence is discarded.
    pub fn finish(&mut self) -> Option<String> {
        self.interpreter.dropped += self.interpreter.utf8.reset();
        self.interpreter.state = ParserState::Ground;
        if self.line.is_empty() {
            self.line.reset();
            None
        } else {
            Some(self.line.take())
        }
    }

    /// Interpret a complete byte stream in one go.
    ///
    /// Completed lines are newline-terminated; a trailing partial line is
    /// appended as-is.
    pub fn render(data: &[u8]) -> String {
        let mut screen = Screen::new();
        let mut out = String::new();
        screen.process(data, &mut |line| {
            out.push_str(&line);
            out.push('\n');
        });
        if let Some(rest) = screen.finish() {
            out.push_str(&rest);
        }
        out
    }

    /// Get the current cursor column (0-indexed).
    pub fn cursor_col(&self) -> usize {
        self.line.col()
    }

    pub fn state(&self) -> &ParserState {
        &self.interpreter.state
    }

    /// Invalid UTF-8 bytes dropped so far.
    pub fn dropped_bytes(&self) -> usize {
        self.interpreter.dropped
    }
}

impl fmt::Display for Screen {
    /// The pending (not yet emitted) line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.line.fmt(f)
    }
}
