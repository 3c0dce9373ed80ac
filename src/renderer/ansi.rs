//! ANSI/ECMA-48 escape sequence builders.
//!
//! Adapted from the teacher's `packages/spark-tui/rust/src/renderer/ansi.rs`
//! (a `Write`-targeting escape-sequence library); here the builders append
//! to a reused `String` scratch buffer instead of writing to an `io::Write`
//! directly, matching the differential-render algorithm's "single atomic
//! write" design.

use crate::style::{sgr_bg_params, sgr_fg_params, Attrs, StyleAttributes};

pub const ENTER_ALT_SCREEN: &str = "\x1b[?1049h";
pub const EXIT_ALT_SCREEN: &str = "\x1b[?1049l";
pub const CURSOR_SHOW: &str = "\x1b[?25h";
pub const CURSOR_HIDE: &str = "\x1b[?25l";
pub const CLEAR_SCREEN_HOME: &str = "\x1b[2J\x1b[H";
pub const SGR_RESET: &str = "\x1b[0m";

/// Append a 1-based cursor-position (CUP) sequence for 0-based `(x, y)`.
pub fn push_cursor_to(buf: &mut String, x: u16, y: u16) {
    use std::fmt::Write as _;
    let _ = write!(buf, "\x1b[{};{}H", y + 1, x + 1);
}

/// Append the SGR sequence selecting `style`, attributes first.
pub fn push_style(buf: &mut String, style: StyleAttributes) {
    let mut params: Vec<u16> = Vec::with_capacity(8);

    if style.attrs.contains(Attrs::BOLD) {
        params.push(1);
    }
    if style.attrs.contains(Attrs::FAINT) {
        params.push(2);
    }
    if style.attrs.contains(Attrs::ITALIC) {
        params.push(3);
    }
    if style.attrs.contains(Attrs::UNDERLINE) {
        params.push(4);
    }
    if style.attrs.contains(Attrs::BLINK) {
        params.push(5);
    }
    if style.attrs.contains(Attrs::INVERSE) {
        params.push(7);
    }
    if style.attrs.contains(Attrs::HIDDEN) {
        params.push(8);
    }
    if style.attrs.contains(Attrs::STRIKETHROUGH) {
        params.push(9);
    }

    params.extend(sgr_fg_params(style.fg));
    params.extend(sgr_bg_params(style.bg));

    buf.push_str("\x1b[");
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            buf.push(';');
        }
        use std::fmt::Write as _;
        let _ = write!(buf, "{p}");
    }
    buf.push('m');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, NamedColor};

    #[test]
    fn cursor_to_is_one_based() {
        let mut buf = String::new();
        push_cursor_to(&mut buf, 0, 0);
        assert_eq!(buf, "\x1b[1;1H");
    }

    #[test]
    fn style_with_bold_and_named_colors() {
        let mut buf = String::new();
        let style = StyleAttributes::new(Color::Named(NamedColor::Red), Color::Default, Attrs::BOLD);
        push_style(&mut buf, style);
        assert_eq!(buf, "\x1b[1;31;49m");
    }

    #[test]
    fn normal_style_is_reset_fg_bg_only() {
        let mut buf = String::new();
        push_style(&mut buf, StyleAttributes::NORMAL);
        assert_eq!(buf, "\x1b[39;49m");
    }
}
