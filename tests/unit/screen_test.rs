//! Unit tests for the line interpreter's public surface

use ptyrec::Screen;

#[test]
fn cursor_back_without_erase_keeps_text() {
    assert_eq!(Screen::render(b"hello\x1b[3D"), "hello");
}

#[test]
fn cursor_back_then_erase_truncates() {
    assert_eq!(Screen::render(b"hello\x1b[3D\x1b[K"), "he");
}

#[test]
fn overwrite_final_characters() {
    assert_eq!(Screen::render(b"progress 10%\x1b[3D55%"), "progress 55%");
}

#[test]
fn clear_screen_and_home_discard_the_line() {
    assert_eq!(Screen::render(b"stale\x1b[2J\x1b[H"), "");
    assert_eq!(Screen::render(b"stale\x1b[2Jfresh"), "fresh");
}

#[test]
fn osc_titles_are_elided() {
    assert_eq!(Screen::render(b"\x1b]0;title\x07a\x1b]2;other\x1b\\b"), "ab");
}

#[test]
fn styling_leaves_no_escape_bytes() {
    let out = Screen::render(b"\x1b[1;4;38;5;196mloud\x1b[0m and \x1b[?25lquiet\x1b[?25h");
    assert_eq!(out, "loud and quiet");
}

#[test]
fn lines_stream_through_the_callback() {
    let mut screen = Screen::new();
    let mut lines = Vec::new();
    screen.process(b"one\r\ntw", &mut |l| lines.push(l));
    screen.process(b"o\r\nthree", &mut |l| lines.push(l));
    assert_eq!(lines, vec!["one", "two"]);
    assert_eq!(screen.finish().as_deref(), Some("three"));
    assert_eq!(screen.finish(), None);
}

#[test]
fn utf8_split_across_chunks_is_intact() {
    let text = "naïve → ✓\n".as_bytes();
    let mut screen = Screen::new();
    let mut lines = Vec::new();
    for byte in text {
        screen.process(std::slice::from_ref(byte), &mut |l| lines.push(l));
    }
    assert_eq!(lines, vec!["naïve → ✓"]);
    assert_eq!(screen.dropped_bytes(), 0);
}
