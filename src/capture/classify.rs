//! Text/binary classification of captured chunks.
//!
//! A chunk is text when it is valid UTF-8 and contains no control characters
//! other than `\n`, `\r` and `\t`. Everything else (escape sequences, raw
//! bytes, broken UTF-8) is binary and gets logged base64-encoded.

/// Result of classifying a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Safe to store verbatim; borrows the decoded text.
    Text(&'a str),
    Binary,
}

impl Classification<'_> {
    pub fn is_text(&self) -> bool {
        matches!(self, Classification::Text(_))
    }
}

/// Classify a chunk as text or binary. Pure; the empty chunk is text.
pub fn classify(bytes: &[u8]) -> Classification<'_> {
    match std::str::from_utf8(bytes) {
        Ok(text) if text.chars().all(is_allowed_char) => Classification::Text(text),
        _ => Classification::Binary,
    }
}

fn is_allowed_char(c: char) -> bool {
    !c.is_control() || matches!(c, '\n' | '\r' | '\t')
}

/// Length of a trailing, not yet complete UTF-8 sequence.
///
/// Returns 0 when the chunk ends on a codepoint boundary or when the tail
/// could never become valid UTF-8 (so holding it back would not help).
pub fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let needed = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        return if back < needed { back } else { 0 };
    }
    0
}
