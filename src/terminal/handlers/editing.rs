//! Erase and delete operation handlers.
//!
//! Handles CSI sequences for editing:
//! - J: Erase in Display
//! - K: Erase in Line
//! - P: Delete Characters
//! - @: Insert Characters
//! - X: Erase Characters

use super::super::types::LineBuffer;

impl LineBuffer {
    /// Handle Erase in Line (CSI K).
    /// Mode 0: Erase from cursor to end of line
    /// Mode 1: Erase from start of line to cursor
    /// Mode 2: Erase entire line
    pub fn handle_erase_line(&mut self, mode: u16) {
        match mode {
            0 => self.erase_to_eol(),
            1 => self.erase_from_sol(),
            2 => self.chars.clear(),
            _ => {}
        }
    }

    /// Handle Erase in Display (CSI J).
    /// Only the current line exists, so modes 0 and 1 act like their line
    /// counterparts. Mode 2/3 clears everything and homes the cursor.
    pub fn handle_erase_display(&mut self, mode: u16) {
        match mode {
            0 => self.erase_to_eol(),
            1 => self.erase_from_sol(),
            2 | 3 => self.reset(),
            _ => {}
        }
    }

    fn erase_to_eol(&mut self) {
        self.chars.truncate(self.col);
    }

    /// Blank from start of line to cursor (inclusive).
    fn erase_from_sol(&mut self) {
        if self.chars.is_empty() {
            return;
        }
        let end = self.col.min(self.chars.len() - 1);
        self.chars[..=end].fill(' ');
    }

    /// Handle Delete Characters (CSI P): shift the rest of the line left.
    pub fn handle_delete_chars(&mut self, n: usize) {
        if self.col < self.chars.len() {
            let end = self.col.saturating_add(n).min(self.chars.len());
            self.chars.drain(self.col..end);
        }
    }

    /// Handle Insert Characters (CSI @): shift the rest of the line right.
    /// Characters pushed past the width limit fall off the end.
    pub fn handle_insert_chars(&mut self, n: usize) {
        if self.col < self.chars.len() {
            let limit = self.width_limit();
            let n = n.min(limit - self.col);
            self.chars
                .splice(self.col..self.col, std::iter::repeat(' ').take(n));
            self.chars.truncate(limit);
        }
    }

    /// Handle Erase Characters (CSI X).
    /// Replaces n characters with spaces starting at cursor, without moving cursor.
    pub fn handle_erase_chars(&mut self, n: usize) {
        if self.col < self.chars.len() {
            let end = self.col.saturating_add(n).min(self.chars.len());
            self.chars[self.col..end].fill(' ');
        }
    }
}
