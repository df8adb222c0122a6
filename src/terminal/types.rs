//! Terminal data types.
//!
//! Contains the core data structures of the interpreter:
//! - ParserState: The escape-sequence state machine's states
//! - CsiParams: Parameters collected while inside a CSI sequence
//! - LineBuffer: The virtual line being edited, with its cursor column
//! - Utf8Decoder: Incremental codepoint assembly across payloads

/// Kind of string sequence being discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// `ESC ]` operating system command
    Osc,
    /// `ESC P` device control string
    Dcs,
    /// `ESC X`, `ESC ^`, `ESC _` (SOS, PM, APC)
    Other,
}

/// Interpreter state. Each variant owns the data it needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Plain text and C0 controls.
    #[default]
    Ground,
    /// After `ESC`.
    Escape,
    /// After `ESC` and one or more intermediates (e.g. `ESC (`).
    EscapeIntermediate(Vec<u8>),
    /// Inside `ESC [`, collecting parameters.
    Csi(CsiParams),
    /// Inside a string sequence; terminated by BEL or ST (`ESC \`).
    OscString {
        kind: StringKind,
        /// Payload bytes seen so far (the payload itself is discarded).
        len: usize,
        /// The previous byte was `ESC`; a `\` completes ST.
        esc: bool,
    },
}

/// Most parameters kept per CSI sequence; the rest are dropped.
pub const MAX_PARAMS: usize = 16;

/// Parameters of a CSI sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsiParams {
    /// Completed parameters. An empty field is recorded as 0.
    pub params: Vec<u16>,
    /// Parameter currently being accumulated.
    pub current: Option<u16>,
    /// Private marker (`?`, `<`, `=`, `>`) if the sequence started with one.
    pub private: Option<u8>,
    pub intermediates: Vec<u8>,
    /// The sequence is malformed and must not be dispatched.
    pub ignore: bool,
}

impl CsiParams {
    pub fn push_digit(&mut self, digit: u8) {
        let value = self.current.unwrap_or(0);
        self.current = Some(
            value
                .saturating_mul(10)
                .saturating_add(u16::from(digit - b'0')),
        );
    }

    pub fn next_param(&mut self) {
        let value = self.current.take().unwrap_or(0);
        if self.params.len() < MAX_PARAMS {
            self.params.push(value);
        }
    }

    /// Close the trailing parameter before dispatch.
    pub fn finish(&mut self) {
        if self.current.is_some() || !self.params.is_empty() {
            self.next_param();
        }
    }

    /// Parameter `idx`, or `default` when absent or zero.
    pub fn get_or(&self, idx: usize, default: u16) -> u16 {
        match self.params.get(idx) {
            Some(&0) | None => default,
            Some(&v) => v,
        }
    }

    /// Parameter `idx` as a count (absent or zero means 1).
    pub fn count(&self, idx: usize) -> usize {
        usize::from(self.get_or(idx, 1))
    }

    /// Parameter `idx` as a mode selector (absent means 0).
    pub fn mode(&self, idx: usize) -> u16 {
        self.params.get(idx).copied().unwrap_or(0)
    }

    pub fn is_private(&self) -> bool {
        self.private.is_some()
    }
}

/// Furthest column cursor movement can reach past the end of the line.
///
/// Printed text may make a line longer; only jumps and inserted blanks are
/// held to this width.
pub const MAX_LINE_WIDTH: usize = 4096;

/// The current virtual line: characters plus a cursor column.
///
/// The cursor may sit past the end of the line (after `CSI C` or `CSI G`),
/// up to [`MAX_LINE_WIDTH`]; writing there pads the gap with spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    pub(crate) chars: Vec<char>,
    pub(crate) col: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a character at the cursor, overwriting, and advance.
    pub fn put(&mut self, c: char) {
        if self.col < self.chars.len() {
            self.chars[self.col] = c;
        } else {
            self.chars.resize(self.col, ' ');
            self.chars.push(c);
        }
        self.col += 1;
    }

    pub fn carriage_return(&mut self) {
        self.col = 0;
    }

    /// Backspace: remove the character before the cursor, shifting the rest
    /// of the line left, and move left.
    pub fn backspace(&mut self) {
        if self.col == 0 {
            return;
        }
        if self.col <= self.chars.len() {
            self.chars.remove(self.col - 1);
        }
        self.col -= 1;
    }

    /// Rightmost column the cursor may be moved to.
    pub(crate) fn width_limit(&self) -> usize {
        MAX_LINE_WIDTH.max(self.chars.len())
    }

    /// Take the line's contents, leaving it empty with the cursor at 0.
    pub fn take(&mut self) -> String {
        self.col = 0;
        std::mem::take(&mut self.chars).into_iter().collect()
    }

    pub fn reset(&mut self) {
        self.chars.clear();
        self.col = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn col(&self) -> usize {
        self.col
    }
}

impl std::fmt::Display for LineBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// Result of feeding one byte (0x80 and above) to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Step {
    /// More continuation bytes are needed.
    Pending,
    Char(char),
    /// The byte (and any partial sequence before it) was not valid UTF-8.
    Invalid,
}

/// Assembles multi-byte codepoints, keeping partial sequences across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Utf8Decoder {
    buf: [u8; 4],
    len: usize,
    need: usize,
}

impl Utf8Decoder {
    /// Feed one non-ASCII byte.
    pub fn push(&mut self, byte: u8) -> Utf8Step {
        if self.need == 0 {
            self.need = match byte {
                0xC2..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF4 => 4,
                _ => return Utf8Step::Invalid,
            };
            self.buf[0] = byte;
            self.len = 1;
            return Utf8Step::Pending;
        }

        if byte & 0xC0 != 0x80 {
            // A new lead byte cuts the partial sequence short; restart with it.
            self.reset();
            return match self.push(byte) {
                Utf8Step::Pending => Utf8Step::Invalid,
                other => other,
            };
        }

        self.buf[self.len] = byte;
        self.len += 1;
        if self.len < self.need {
            return Utf8Step::Pending;
        }

        let step = match std::str::from_utf8(&self.buf[..self.len]) {
            Ok(s) => s.chars().next().map_or(Utf8Step::Invalid, Utf8Step::Char),
            Err(_) => Utf8Step::Invalid,
        };
        self.reset();
        step
    }

    /// Whether a partial sequence is waiting for continuation bytes.
    pub fn in_progress(&self) -> bool {
        self.need != 0
    }

    /// Drop any partial sequence, returning how many bytes were discarded.
    pub fn reset(&mut self) -> usize {
        let dropped = self.len;
        self.len = 0;
        self.need = 0;
        dropped
    }
}
