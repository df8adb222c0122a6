//! Escape-sequence state machine.
//!
//! Bytes are consumed one at a time; each state returns the next one.
//! CSI sequences are dispatched through a table indexed by the final byte.

use super::handlers::{log_unhandled_csi, log_unhandled_esc};
use super::types::{CsiParams, LineBuffer, ParserState, StringKind, Utf8Decoder, Utf8Step};

const BEL: u8 = 0x07;
const BS: u8 = 0x08;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;

/// Action selected by a CSI final byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CsiAction {
    CursorBack,
    CursorForward,
    CursorColumn,
    CursorPosition,
    EraseLine,
    EraseDisplay,
    DeleteChars,
    InsertChars,
    EraseChars,
    /// SGR: parsed and discarded.
    Style,
    Unhandled,
}

const fn build_csi_table() -> [CsiAction; 0x3F] {
    let mut table = [CsiAction::Unhandled; 0x3F];
    table[(b'@' - 0x40) as usize] = CsiAction::InsertChars;
    table[(b'C' - 0x40) as usize] = CsiAction::CursorForward;
    table[(b'D' - 0x40) as usize] = CsiAction::CursorBack;
    table[(b'G' - 0x40) as usize] = CsiAction::CursorColumn;
    table[(b'H' - 0x40) as usize] = CsiAction::CursorPosition;
    table[(b'J' - 0x40) as usize] = CsiAction::EraseDisplay;
    table[(b'K' - 0x40) as usize] = CsiAction::EraseLine;
    table[(b'P' - 0x40) as usize] = CsiAction::DeleteChars;
    table[(b'X' - 0x40) as usize] = CsiAction::EraseChars;
    table[(b'f' - 0x40) as usize] = CsiAction::CursorPosition;
    table[(b'm' - 0x40) as usize] = CsiAction::Style;
    table
}

/// Dispatch table for final bytes 0x40..=0x7E.
static CSI_TABLE: [CsiAction; 0x3F] = build_csi_table();

pub(crate) fn csi_action(final_byte: u8) -> CsiAction {
    match final_byte {
        0x40..=0x7E => CSI_TABLE[usize::from(final_byte - 0x40)],
        _ => CsiAction::Unhandled,
    }
}

/// Parser state plus the UTF-8 assembler for ground text.
#[derive(Debug, Default)]
pub(crate) struct Interpreter {
    pub state: ParserState,
    pub utf8: Utf8Decoder,
    /// Invalid UTF-8 bytes dropped so far.
    pub dropped: usize,
}

impl Interpreter {
    /// Consume one byte, editing `line` and emitting completed lines.
    pub fn advance(&mut self, line: &mut LineBuffer, byte: u8, on_line: &mut dyn FnMut(String)) {
        let state = std::mem::take(&mut self.state);
        self.state = match state {
            ParserState::Ground => self.ground(line, byte, on_line),
            ParserState::Escape => self.escape(line, byte, on_line),
            ParserState::EscapeIntermediate(intermediates) => {
                self.escape_intermediate(line, byte, on_line, intermediates)
            }
            ParserState::Csi(params) => self.csi(line, byte, on_line, params),
            ParserState::OscString { kind, len, esc } => {
                self.string(line, byte, on_line, kind, len, esc)
            }
        };
    }

    fn ground(
        &mut self,
        line: &mut LineBuffer,
        byte: u8,
        on_line: &mut dyn FnMut(String),
    ) -> ParserState {
        if byte >= 0x80 {
            match self.utf8.push(byte) {
                Utf8Step::Pending => {}
                // C1 controls decode fine but are not printable.
                Utf8Step::Char(c) if c.is_control() => {}
                Utf8Step::Char(c) => line.put(c),
                Utf8Step::Invalid => self.dropped += 1,
            }
            return ParserState::Ground;
        }

        if self.utf8.in_progress() {
            self.dropped += self.utf8.reset();
        }

        match byte {
            ESC => ParserState::Escape,
            0x20..=0x7E => {
                line.put(char::from(byte));
                ParserState::Ground
            }
            _ => {
                execute(line, byte, on_line);
                ParserState::Ground
            }
        }
    }

    fn escape(
        &mut self,
        line: &mut LineBuffer,
        byte: u8,
        on_line: &mut dyn FnMut(String),
    ) -> ParserState {
        match byte {
            ESC => ParserState::Escape,
            CAN | SUB => ParserState::Ground,
            0x00..=0x1F => {
                execute(line, byte, on_line);
                ParserState::Escape
            }
            b'[' => ParserState::Csi(CsiParams::default()),
            b']' => string_state(StringKind::Osc),
            b'P' => string_state(StringKind::Dcs),
            b'X' | b'^' | b'_' => string_state(StringKind::Other),
            0x20..=0x2F => ParserState::EscapeIntermediate(vec![byte]),
            DEL => ParserState::Escape,
            0x30..=0x7E => {
                log_unhandled_esc(byte, &[]);
                ParserState::Ground
            }
            _ => self.ground(line, byte, on_line),
        }
    }

    fn escape_intermediate(
        &mut self,
        line: &mut LineBuffer,
        byte: u8,
        on_line: &mut dyn FnMut(String),
        mut intermediates: Vec<u8>,
    ) -> ParserState {
        match byte {
            ESC => ParserState::Escape,
            CAN | SUB => ParserState::Ground,
            0x00..=0x1F => {
                execute(line, byte, on_line);
                ParserState::EscapeIntermediate(intermediates)
            }
            0x20..=0x2F => {
                intermediates.push(byte);
                ParserState::EscapeIntermediate(intermediates)
            }
            0x30..=0x7E => {
                // Charset designations and the like have no effect on text.
                log_unhandled_esc(byte, &intermediates);
                ParserState::Ground
            }
            DEL => ParserState::EscapeIntermediate(intermediates),
            _ => self.ground(line, byte, on_line),
        }
    }

    fn csi(
        &mut self,
        line: &mut LineBuffer,
        byte: u8,
        on_line: &mut dyn FnMut(String),
        mut params: CsiParams,
    ) -> ParserState {
        match byte {
            ESC => return ParserState::Escape,
            CAN | SUB => return ParserState::Ground,
            0x00..=0x1F => execute(line, byte, on_line),
            b'0'..=b'9' if params.intermediates.is_empty() => params.push_digit(byte),
            b';' | b':' if params.intermediates.is_empty() => params.next_param(),
            b'<' | b'=' | b'>' | b'?' => {
                let at_start = params.params.is_empty()
                    && params.current.is_none()
                    && params.private.is_none()
                    && params.intermediates.is_empty();
                if at_start {
                    params.private = Some(byte);
                } else {
                    params.ignore = true;
                }
            }
            0x20..=0x2F => params.intermediates.push(byte),
            0x30..=0x3F => params.ignore = true,
            0x40..=0x7E => {
                params.finish();
                if !params.ignore {
                    dispatch_csi(line, &params, byte);
                }
                return ParserState::Ground;
            }
            _ => {}
        }
        ParserState::Csi(params)
    }

    fn string(
        &mut self,
        line: &mut LineBuffer,
        byte: u8,
        on_line: &mut dyn FnMut(String),
        kind: StringKind,
        len: usize,
        esc: bool,
    ) -> ParserState {
        if esc {
            tracing::trace!(kind = ?kind, len, "Discarded string sequence");
            if byte == b'\\' {
                return ParserState::Ground;
            }
            // Anything but ST ends the string and starts a new escape.
            return self.escape(line, byte, on_line);
        }
        match byte {
            BEL => {
                tracing::trace!(kind = ?kind, len, "Discarded string sequence");
                ParserState::Ground
            }
            ESC => ParserState::OscString {
                kind,
                len,
                esc: true,
            },
            CAN | SUB => ParserState::Ground,
            _ => ParserState::OscString {
                kind,
                len: len + 1,
                esc: false,
            },
        }
    }
}

fn string_state(kind: StringKind) -> ParserState {
    ParserState::OscString {
        kind,
        len: 0,
        esc: false,
    }
}

/// C0 control in any state.
fn execute(line: &mut LineBuffer, byte: u8, on_line: &mut dyn FnMut(String)) {
    match byte {
        b'\n' => on_line(line.take()),
        b'\r' => line.carriage_return(),
        BS => line.backspace(),
        b'\t' => line.put('\t'),
        _ => {}
    }
}

fn dispatch_csi(line: &mut LineBuffer, params: &CsiParams, final_byte: u8) {
    // DEC private modes (?25h, ?1049h, ...) and mouse reports (<...) carry
    // nothing for text rendering.
    if params.is_private() || !params.intermediates.is_empty() {
        return;
    }

    match csi_action(final_byte) {
        CsiAction::CursorBack => line.handle_cursor_back(params.count(0)),
        CsiAction::CursorForward => line.handle_cursor_forward(params.count(0)),
        CsiAction::CursorColumn => line.handle_cursor_horizontal_absolute(params.count(0)),
        CsiAction::CursorPosition => line.handle_cursor_position(),
        CsiAction::EraseLine => line.handle_erase_line(params.mode(0)),
        CsiAction::EraseDisplay => line.handle_erase_display(params.mode(0)),
        CsiAction::DeleteChars => line.handle_delete_chars(params.count(0)),
        CsiAction::InsertChars => line.handle_insert_chars(params.count(0)),
        CsiAction::EraseChars => line.handle_erase_chars(params.count(0)),
        CsiAction::Style => {}
        CsiAction::Unhandled => log_unhandled_csi(
            char::from(final_byte),
            &params.params,
            params.private,
            &params.intermediates,
        ),
    }
}
