//! Line buffering for captured streams.
//!
//! Text is held until a newline arrives so that log lines stay readable.
//! Anything that is not plain text bypasses the buffer and is emitted
//! immediately: an escape sequence may never be followed by a newline.

use super::classify::{classify, incomplete_utf8_tail};

/// Pending-text accumulator for one captured stream.
#[derive(Debug, Default)]
pub struct TextBuffer {
    /// Validated text not yet newline-terminated.
    pending: Vec<u8>,
    /// Leading bytes of a codepoint split across reads.
    partial: Vec<u8>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly read bytes.
    ///
    /// Returns the payloads that are ready to be logged, in order: one per
    /// completed text line, or a single binary chunk holding the pending text
    /// together with the new bytes.
    pub fn append(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut incoming = std::mem::take(&mut self.partial);
        incoming.extend_from_slice(data);

        let keep = incomplete_utf8_tail(&incoming);
        self.partial = incoming.split_off(incoming.len() - keep);
        if incoming.is_empty() {
            return Vec::new();
        }

        if classify(&incoming).is_text() {
            self.pending.extend_from_slice(&incoming);
            self.take_lines()
        } else {
            let mut chunk = std::mem::take(&mut self.pending);
            chunk.extend_from_slice(&incoming);
            vec![chunk]
        }
    }

    fn take_lines(&mut self) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            lines.push(self.pending.drain(..=pos).collect());
        }
        lines
    }

    /// Flush pending text on request, keeping a split codepoint for the next read.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    /// Flush everything at end of stream, including an unfinished codepoint.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let mut rest = std::mem::take(&mut self.pending);
        rest.append(&mut self.partial);
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.partial.is_empty()
    }
}
