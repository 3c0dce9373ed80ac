//! Drawing primitives and the dispatcher that executes a [`DrawCommand`]
//! against a container's buffer and cursor.
//!
//! The primitives themselves (text, boxes with sub-region clipping, panels,
//! buttons, progress bars, shaded fills) are generalized from the teacher's
//! `FrameBuffer` drawing methods (`rust/src/renderer/buffer.rs`:
//! `draw_text`, `draw_border`, `draw_progress`, `draw_hline`/`draw_vline`)
//! onto this crate's `Cell`/`StyleAttributes` types, with the single-buffer
//! no-alpha model this spec calls for in place of the teacher's RGBA
//! blending.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::buffer::Rect;
use super::commands::DrawCommand;
use super::{Container, Inner};
use crate::cell::Cell;
use crate::style::StyleAttributes;

/// The six glyphs a box border is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxStyle {
    pub h: char,
    pub v: char,
    pub tl: char,
    pub tr: char,
    pub bl: char,
    pub br: char,
}

impl BoxStyle {
    pub const SINGLE: BoxStyle = BoxStyle {
        h: '─',
        v: '│',
        tl: '┌',
        tr: '┐',
        bl: '└',
        br: '┘',
    };

    pub const DOUBLE: BoxStyle = BoxStyle {
        h: '═',
        v: '║',
        tl: '╔',
        tr: '╗',
        bl: '╚',
        br: '╝',
    };
}

/// Vertical × horizontal placement of a box's title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitlePos {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl TitlePos {
    fn row(self, rect: Rect) -> u16 {
        match self {
            TitlePos::TopLeft | TitlePos::TopCenter | TitlePos::TopRight => rect.y,
            TitlePos::CenterLeft | TitlePos::CenterCenter | TitlePos::CenterRight => {
                rect.y + rect.height / 2
            }
            TitlePos::BottomLeft | TitlePos::BottomCenter | TitlePos::BottomRight => {
                rect.y + rect.height.saturating_sub(1)
            }
        }
    }

    fn start_col(self, rect: Rect, text_width: u16) -> u16 {
        let inner_width = rect.width.saturating_sub(2);
        match self {
            TitlePos::TopLeft | TitlePos::CenterLeft | TitlePos::BottomLeft => rect.x + 1,
            TitlePos::TopCenter | TitlePos::CenterCenter | TitlePos::BottomCenter => {
                rect.x + 1 + inner_width.saturating_sub(text_width) / 2
            }
            TitlePos::TopRight | TitlePos::CenterRight | TitlePos::BottomRight => {
                rect.x + 1 + inner_width.saturating_sub(text_width)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

const PROGRESS_GLYPHS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

impl Container {
    pub(super) fn execute_on_executor(&self, cmd: DrawCommand) {
        let mut guard = self.inner.lock().unwrap();
        match cmd {
            DrawCommand::Clear => clear(&mut guard),
            DrawCommand::Print { text, style, newline } => print(&mut guard, &text, style, newline),
            DrawCommand::PrintAt { x, y, text, style } => print_at(&mut guard, x, y, &text, style),
            DrawCommand::MoveCursor { x, y } => move_cursor(&mut guard, x, y),
            DrawCommand::ShowCursor => guard.cursor_visible = true,
            DrawCommand::HideCursor => guard.cursor_visible = false,
            DrawCommand::ClearLine => {
                let y = guard.cursor_y;
                clear_line(&mut guard, y)
            }
            DrawCommand::ClearLineAt { y } => clear_line(&mut guard, y),
            DrawCommand::ClearRegion { rect } => fill_region(&mut guard, rect, ' ', StyleAttributes::NORMAL),
            DrawCommand::DrawBox {
                rect,
                render_rect,
                title,
                title_pos,
                style,
                border_style,
            } => draw_box(&mut guard, rect, render_rect, title.as_deref(), title_pos, style, border_style),
            DrawCommand::DrawHLine { x, y, len, glyph, style } => draw_hline(&mut guard, x, y, len, glyph, style),
            DrawCommand::DrawVLine { x, y, len, glyph, style } => draw_vline(&mut guard, x, y, len, glyph, style),
            DrawCommand::FillRegion { rect, codepoint, style } => fill_region(&mut guard, rect, codepoint, style),
            DrawCommand::DrawPanel {
                rect,
                title,
                style,
                border_style,
                fill_style,
            } => {
                let interior = Rect::new(
                    rect.x + 1,
                    rect.y + 1,
                    rect.width.saturating_sub(2),
                    rect.height.saturating_sub(2),
                );
                fill_region(&mut guard, interior, ' ', fill_style);
                draw_box(&mut guard, rect, None, title.as_deref(), TitlePos::TopLeft, style, border_style);
            }
            DrawCommand::DrawBorderedText {
                rect,
                text,
                style,
                border_style,
                text_style,
            } => {
                draw_box(&mut guard, rect, None, None, TitlePos::TopLeft, style, border_style);
                let interior = Rect::new(
                    rect.x + 1,
                    rect.y + 1,
                    rect.width.saturating_sub(2),
                    rect.height.saturating_sub(2),
                );
                draw_text_block(&mut guard, interior, &text, TextAlign::Left, text_style);
            }
            DrawCommand::DrawButton {
                x,
                y,
                label,
                selected,
                style,
                selected_style,
            } => draw_button(&mut guard, x, y, &label, selected, style, selected_style),
            DrawCommand::DrawProgressBar { x, y, width, progress, style } => {
                draw_progress_bar(&mut guard, x, y, width, progress, style)
            }
            DrawCommand::DrawTextBlock { rect, text, align, style } => {
                draw_text_block(&mut guard, rect, &text, align, style)
            }
            DrawCommand::ShadeRegion { rect, glyph, style } => fill_region(&mut guard, rect, glyph, style),
        }
    }
}

/// Convenience wrappers: build the command and run it through the
/// container's serialized executor, matching the "operation completing
/// when serialized" contract via `execute`'s blocking `submit_wait`.
impl Container {
    pub fn clear(self: &std::sync::Arc<Self>) {
        self.execute(DrawCommand::Clear);
    }

    pub fn print(self: &std::sync::Arc<Self>, text: impl Into<String>, style: StyleAttributes, newline: bool) {
        self.execute(DrawCommand::Print {
            text: text.into(),
            style,
            newline,
        });
    }

    pub fn print_at(self: &std::sync::Arc<Self>, x: u16, y: u16, text: impl Into<String>, style: StyleAttributes) {
        self.execute(DrawCommand::PrintAt {
            x,
            y,
            text: text.into(),
            style,
        });
    }

    pub fn move_cursor(self: &std::sync::Arc<Self>, x: u16, y: u16) {
        self.execute(DrawCommand::MoveCursor { x, y });
    }

    pub fn show_cursor(self: &std::sync::Arc<Self>) {
        self.execute(DrawCommand::ShowCursor);
    }

    pub fn hide_cursor(self: &std::sync::Arc<Self>) {
        self.execute(DrawCommand::HideCursor);
    }

    pub fn draw_box(
        self: &std::sync::Arc<Self>,
        rect: Rect,
        render_rect: Option<Rect>,
        title: Option<String>,
        title_pos: TitlePos,
        style: BoxStyle,
        border_style: StyleAttributes,
    ) {
        self.execute(DrawCommand::DrawBox {
            rect,
            render_rect,
            title,
            title_pos,
            style,
            border_style,
        });
    }

    pub fn draw_progress_bar(self: &std::sync::Arc<Self>, x: u16, y: u16, width: u16, progress: f32, style: StyleAttributes) {
        self.execute(DrawCommand::DrawProgressBar { x, y, width, progress, style });
    }
}

fn clear(inner: &mut Inner) {
    inner.cells.clear();
    inner.cursor_x = 0;
    inner.cursor_y = 0;
}

fn move_cursor(inner: &mut Inner, x: u16, y: u16) {
    inner.cursor_x = x.min(inner.cells.width().saturating_sub(1));
    inner.cursor_y = y.min(inner.cells.height().saturating_sub(1));
}

fn clear_line(inner: &mut Inner, y: u16) {
    let width = inner.cells.width();
    fill_region(inner, Rect::new(0, y, width, 1), ' ', StyleAttributes::NORMAL);
}

/// Write `text` at the cursor, wrapping at the right edge and stopping
/// (never scrolling) at the bottom edge.
fn print(inner: &mut Inner, text: &str, style: StyleAttributes, newline: bool) {
    let width = inner.cells.width();
    let height = inner.cells.height();
    let (mut x, mut y) = (inner.cursor_x, inner.cursor_y);

    for grapheme in text.graphemes(true) {
        if y >= height {
            break;
        }
        if x >= width {
            x = 0;
            y += 1;
            if y >= height {
                break;
            }
        }
        let ch = grapheme.chars().next().unwrap_or(' ');
        inner.cells.set(x, y, Cell::new(ch, style), None);
        x += 1;
    }

    if newline && y < height {
        x = 0;
        y += 1;
    }

    inner.cursor_x = x.min(width.saturating_sub(1));
    inner.cursor_y = y.min(height.saturating_sub(1));
}

fn print_at(inner: &mut Inner, x: u16, y: u16, text: &str, style: StyleAttributes) {
    let width = inner.cells.width();
    let mut col = x;
    for grapheme in text.graphemes(true) {
        if col >= width {
            break;
        }
        let ch = grapheme.chars().next().unwrap_or(' ');
        inner.cells.set(col, y, Cell::new(ch, style), None);
        col += 1;
    }
}

fn draw_hline(inner: &mut Inner, x: u16, y: u16, len: u16, glyph: char, style: StyleAttributes) {
    for col in x..x.saturating_add(len) {
        inner.cells.set(col, y, Cell::new(glyph, style), None);
    }
}

fn draw_vline(inner: &mut Inner, x: u16, y: u16, len: u16, glyph: char, style: StyleAttributes) {
    for row in y..y.saturating_add(len) {
        inner.cells.set(x, row, Cell::new(glyph, style), None);
    }
}

fn fill_region(inner: &mut Inner, rect: Rect, codepoint: char, style: StyleAttributes) {
    if rect.is_empty() {
        return;
    }
    let cell = Cell::new(codepoint, style);
    for y in rect.y..rect.y.saturating_add(rect.height) {
        for x in rect.x..rect.x.saturating_add(rect.width) {
            inner.cells.set(x, y, cell, None);
        }
    }
}

/// Draw a box border, with optional sub-region clipping and a title.
///
/// A `render_rect` disjoint from `rect` clips every write away: the whole
/// call becomes a no-op render.
fn draw_box(
    inner: &mut Inner,
    rect: Rect,
    render_rect: Option<Rect>,
    title: Option<&str>,
    title_pos: TitlePos,
    style: BoxStyle,
    border_style: StyleAttributes,
) {
    if rect.width < 2 || rect.height < 2 {
        return;
    }
    let clip = render_rect.map(|r| rect.intersect(&r));
    if let Some(clip) = &clip {
        if clip.is_empty() {
            return;
        }
    }

    let x2 = rect.x + rect.width - 1;
    let y2 = rect.y + rect.height - 1;

    inner.cells.set(rect.x, rect.y, Cell::new(style.tl, border_style), clip.as_ref());
    inner.cells.set(x2, rect.y, Cell::new(style.tr, border_style), clip.as_ref());
    inner.cells.set(rect.x, y2, Cell::new(style.bl, border_style), clip.as_ref());
    inner.cells.set(x2, y2, Cell::new(style.br, border_style), clip.as_ref());

    for x in (rect.x + 1)..x2 {
        inner.cells.set(x, rect.y, Cell::new(style.h, border_style), clip.as_ref());
        inner.cells.set(x, y2, Cell::new(style.h, border_style), clip.as_ref());
    }
    for y in (rect.y + 1)..y2 {
        inner.cells.set(rect.x, y, Cell::new(style.v, border_style), clip.as_ref());
        inner.cells.set(x2, y, Cell::new(style.v, border_style), clip.as_ref());
    }

    if let Some(title) = title {
        if !title.is_empty() {
            let text_width = title.width().min(rect.width.saturating_sub(2) as usize) as u16;
            let truncated: String = title.graphemes(true).take(text_width as usize).collect();
            let row = title_pos.row(rect);
            let col = title_pos.start_col(rect, text_width);
            print_at_clipped(inner, col, row, &truncated, border_style, clip.as_ref());
        }
    }
}

fn print_at_clipped(inner: &mut Inner, x: u16, y: u16, text: &str, style: StyleAttributes, clip: Option<&Rect>) {
    let width = inner.cells.width();
    let mut col = x;
    for grapheme in text.graphemes(true) {
        if col >= width {
            break;
        }
        let ch = grapheme.chars().next().unwrap_or(' ');
        inner.cells.set(col, y, Cell::new(ch, style), clip);
        col += 1;
    }
}

fn draw_button(inner: &mut Inner, x: u16, y: u16, label: &str, selected: bool, style: StyleAttributes, selected_style: StyleAttributes) {
    let text = format!("[{label}]");
    let style = if selected { selected_style } else { style };
    print_at(inner, x, y, &text, style);
}

/// Eighth-resolution progress bar using the nine `" ▏▎▍▌▋▊▉█"` glyphs.
fn draw_progress_bar(inner: &mut Inner, x: u16, y: u16, width: u16, progress: f32, style: StyleAttributes) {
    let progress = progress.clamp(0.0, 1.0);
    let full_blocks = (progress * width as f32).floor() as u16;
    let partial_index = ((progress * width as f32 - full_blocks as f32) * 8.0).round() as usize;

    for col in 0..full_blocks.min(width) {
        inner.cells.set(x + col, y, Cell::new(PROGRESS_GLYPHS[8], style), None);
    }
    if full_blocks < width && partial_index > 0 {
        inner.cells.set(x + full_blocks, y, Cell::new(PROGRESS_GLYPHS[partial_index.min(8)], style), None);
        for col in (full_blocks + 1)..width {
            inner.cells.set(x + col, y, Cell::new(' ', StyleAttributes::NORMAL), None);
        }
    } else {
        for col in full_blocks..width {
            inner.cells.set(x + col, y, Cell::new(' ', StyleAttributes::NORMAL), None);
        }
    }
}

/// Greedy word-wrap: pack as many whole words per line as fit in
/// `rect.width`; a single word longer than the width is placed alone on its
/// line (never split). Lines beyond `rect.height` are dropped.
fn draw_text_block(inner: &mut Inner, rect: Rect, text: &str, align: TextAlign, style: StyleAttributes) {
    if rect.is_empty() {
        return;
    }
    let lines = wrap_text(text, rect.width);
    for (i, line) in lines.iter().enumerate().take(rect.height as usize) {
        let line_width = line.width() as u16;
        let col = match align {
            TextAlign::Left => rect.x,
            TextAlign::Center => rect.x + rect.width.saturating_sub(line_width) / 2,
            TextAlign::Right => rect.x + rect.width.saturating_sub(line_width),
        };
        print_at_clipped(inner, col, rect.y + i as u16, line, style, Some(&rect));
    }
}

fn wrap_text(text: &str, width: u16) -> Vec<String> {
    let width = width as usize;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate_width = if current.is_empty() {
            word.width()
        } else {
            current.width() + 1 + word.width()
        };
        if candidate_width <= width || current.is_empty() {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            if current.width() > width {
                lines.push(current.clone());
                current.clear();
            }
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use std::sync::Arc;

    fn container(w: u16, h: u16) -> Arc<Container> {
        Arc::new(Container::new("t", "/owner", "r1", w, h, Arc::new(|_| {})))
    }

    #[test]
    fn s5_box_with_sub_region_clip() {
        let c = container(20, 5);
        c.draw_box(
            Rect::new(0, 0, 20, 5),
            Some(Rect::new(5, 0, 10, 5)),
            None,
            TitlePos::TopLeft,
            BoxStyle::SINGLE,
            StyleAttributes::NORMAL,
        );
        let snap = c.snapshot_renderable_state(0);
        let width = 20usize;
        let at = |x: u16, y: u16| snap.cells[y as usize * width + x as usize];

        for x in 5..15 {
            assert_eq!(at(x, 0).as_char(), '─', "top row x={x}");
            assert_eq!(at(x, 4).as_char(), '─', "bottom row x={x}");
        }
        // Corners and the vertical edges sit outside the clip and must be
        // untouched.
        assert!(at(0, 0).is_empty());
        assert!(at(19, 0).is_empty());
        assert!(at(0, 2).is_empty());
        assert!(at(19, 2).is_empty());
        for x in 0..5 {
            assert!(at(x, 0).is_empty(), "x={x} outside clip on top row");
        }
        for x in 15..20 {
            assert!(at(x, 0).is_empty(), "x={x} outside clip on top row");
        }
    }

    #[test]
    fn s6_progress_bar_eighth_resolution() {
        let c = container(8, 1);
        c.draw_progress_bar(0, 0, 8, 0.4375, StyleAttributes::NORMAL);
        let snap = c.snapshot_renderable_state(0);
        for x in 0..3 {
            assert_eq!(snap.cells[x].as_char(), '█', "full block at {x}");
        }
        assert_eq!(snap.cells[3].as_char(), '▌');
        for x in 4..8 {
            assert_eq!(snap.cells[x].as_char(), ' ', "empty tail at {x}");
            assert_eq!(snap.cells[x].style, StyleAttributes::NORMAL);
        }
    }

    #[test]
    fn draw_box_disjoint_render_rect_is_a_no_op() {
        let c = container(10, 5);
        c.draw_box(
            Rect::new(0, 0, 10, 5),
            Some(Rect::new(20, 20, 5, 5)),
            None,
            TitlePos::TopLeft,
            BoxStyle::SINGLE,
            StyleAttributes::NORMAL,
        );
        let snap = c.snapshot_renderable_state(0);
        assert!(snap.cells.iter().all(|c| c.is_empty()));
    }

    #[test]
    fn print_wraps_at_right_edge_and_stops_at_bottom() {
        let c = container(3, 2);
        c.print("abcdefgh", StyleAttributes::NORMAL, false);
        let snap = c.snapshot_renderable_state(0);
        let text: String = snap.cells.iter().map(|c| c.as_char()).collect();
        // 3x2 = 6 cells; only the first 6 graphemes ("abcdef") fit, the
        // rest is dropped at the bottom edge rather than scrolling.
        assert_eq!(text, "abcdef");
    }

    #[test]
    fn print_at_clips_to_width() {
        let c = container(4, 1);
        c.print_at(2, 0, "hello", StyleAttributes::NORMAL);
        let snap = c.snapshot_renderable_state(0);
        assert_eq!(snap.cells[2].as_char(), 'h');
        assert_eq!(snap.cells[3].as_char(), 'e');
    }

    #[test]
    fn wrap_text_never_splits_a_word() {
        let lines = wrap_text("a bb ccc dddd", 4);
        for line in &lines {
            for word in line.split_whitespace() {
                assert!(word.len() <= 4 || line == word);
            }
        }
        assert!(lines.iter().any(|l| l == "dddd"));
    }
}
