//! Cursor movement handlers.
//!
//! Handles CSI sequences for cursor control on the virtual line:
//! - C: Cursor Forward
//! - D: Cursor Back
//! - G: Cursor Horizontal Absolute
//! - H/f: Cursor Position, reduced to "start of the current line"

use super::super::types::LineBuffer;

impl LineBuffer {
    /// Move cursor back by n columns (CSI D). Stops at column 0.
    pub fn handle_cursor_back(&mut self, n: usize) {
        self.col = self.col.saturating_sub(n);
    }

    /// Move cursor forward by n columns (CSI C). May pass the end of the
    /// line, up to the width limit.
    pub fn handle_cursor_forward(&mut self, n: usize) {
        self.col = self.col.saturating_add(n).min(self.width_limit());
    }

    /// Set cursor column (CSI G).
    /// Parameter is 1-indexed, converted to 0-indexed internally.
    pub fn handle_cursor_horizontal_absolute(&mut self, col: usize) {
        self.col = col.saturating_sub(1).min(self.width_limit());
    }

    /// Cursor position (CSI H / CSI f). Rows are not modelled, so any
    /// target returns to the start of the current virtual line.
    pub fn handle_cursor_position(&mut self) {
        self.col = 0;
    }
}
