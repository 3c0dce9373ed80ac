//! The structured draw-command surface consumed by [`super::Container`].
//!
//! One variant per recognized command; unknown/missing fields are a
//! type-level impossibility here (unlike a loosely-typed wire record), but
//! the *execution* side still follows the "malformed arguments are silently
//! ignored" failure semantics, e.g. a `draw_box` whose `render_rect` is
//! disjoint from `rect` is a no-op render rather than a panic.

use crate::container::draw::{BoxStyle, TextAlign, TitlePos};
use crate::container::Rect;
use crate::style::StyleAttributes;

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Clear,
    Print {
        text: String,
        style: StyleAttributes,
        newline: bool,
    },
    PrintAt {
        x: u16,
        y: u16,
        text: String,
        style: StyleAttributes,
    },
    MoveCursor {
        x: u16,
        y: u16,
    },
    ShowCursor,
    HideCursor,
    /// Clear the row the cursor currently sits on.
    ClearLine,
    /// Clear an arbitrary row by index, independent of the cursor.
    ClearLineAt {
        y: u16,
    },
    ClearRegion {
        rect: Rect,
    },
    DrawBox {
        rect: Rect,
        render_rect: Option<Rect>,
        title: Option<String>,
        title_pos: TitlePos,
        style: BoxStyle,
        border_style: StyleAttributes,
    },
    DrawHLine {
        x: u16,
        y: u16,
        len: u16,
        glyph: char,
        style: StyleAttributes,
    },
    DrawVLine {
        x: u16,
        y: u16,
        len: u16,
        glyph: char,
        style: StyleAttributes,
    },
    FillRegion {
        rect: Rect,
        codepoint: char,
        style: StyleAttributes,
    },
    DrawPanel {
        rect: Rect,
        title: Option<String>,
        style: BoxStyle,
        border_style: StyleAttributes,
        fill_style: StyleAttributes,
    },
    DrawBorderedText {
        rect: Rect,
        text: String,
        style: BoxStyle,
        border_style: StyleAttributes,
        text_style: StyleAttributes,
    },
    DrawButton {
        x: u16,
        y: u16,
        label: String,
        selected: bool,
        style: StyleAttributes,
        selected_style: StyleAttributes,
    },
    DrawProgressBar {
        x: u16,
        y: u16,
        width: u16,
        progress: f32,
        style: StyleAttributes,
    },
    DrawTextBlock {
        rect: Rect,
        text: String,
        align: TextAlign,
        style: StyleAttributes,
    },
    ShadeRegion {
        rect: Rect,
        glyph: char,
        style: StyleAttributes,
    },
}
