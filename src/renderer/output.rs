//! Differential-render output buffer.
//!
//! Grounded on the teacher's `OutputBuffer` (`rust/src/renderer/output.rs`):
//! accumulate the whole frame's bytes in one reused buffer, then issue a
//! single write, to keep syscalls (and the visible update) as close to
//! atomic as the TTY allows.

use crate::cell::Cell;
use crate::style::StyleAttributes;

use super::ansi;

/// A reused scratch buffer that renders one frame's worth of ANSI deltas.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    buf: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self { buf: String::with_capacity(16 * 1024) }
    }

    /// Build the delta stream for one frame per the fixed algorithm:
    /// hide cursor, walk cells row-major emitting only changed ones (with a
    /// CUP move and an SGR change only when the style actually differs from
    /// the last emitted one), reset SGR, then restore the cursor.
    pub fn render_diff(
        &mut self,
        cells: &[Cell],
        prev_cells: &[Cell],
        width: u16,
        height: u16,
        cursor_x: u16,
        cursor_y: u16,
        cursor_visible: bool,
    ) -> &str {
        self.buf.clear();
        self.buf.push_str(ansi::CURSOR_HIDE);

        let mut current_style: Option<StyleAttributes> = None;

        for y in 0..height {
            for x in 0..width {
                let idx = y as usize * width as usize + x as usize;
                if cells[idx] == prev_cells[idx] {
                    continue;
                }
                ansi::push_cursor_to(&mut self.buf, x, y);
                if current_style != Some(cells[idx].style) {
                    self.buf.push_str(ansi::SGR_RESET);
                    ansi::push_style(&mut self.buf, cells[idx].style);
                    current_style = Some(cells[idx].style);
                }
                let glyph = if cells[idx].is_empty() { ' ' } else { cells[idx].as_char() };
                self.buf.push(glyph);
            }
        }

        self.buf.push_str(ansi::SGR_RESET);

        if cursor_visible {
            ansi::push_cursor_to(&mut self.buf, cursor_x, cursor_y);
            self.buf.push_str(ansi::CURSOR_SHOW);
        }

        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleAttributes;

    #[test]
    fn identical_buffers_emit_no_cell_writes() {
        let cells = vec![Cell::EMPTY; 4];
        let prev = cells.clone();
        let mut out = OutputBuffer::new();
        let rendered = out.render_diff(&cells, &prev, 2, 2, 0, 0, false);
        assert!(!rendered.contains('H'));
    }

    #[test]
    fn single_changed_cell_emits_one_cursor_move() {
        let mut cells = vec![Cell::EMPTY; 4];
        let prev = vec![Cell::SENTINEL; 4];
        cells[0] = Cell::new('x', StyleAttributes::NORMAL);
        let mut out = OutputBuffer::new();
        let rendered = out.render_diff(&cells, &prev, 2, 2, 0, 0, false).to_string();
        // All 4 cells differ from the sentinel-seeded prev buffer, so all 4
        // positions move the cursor; at minimum the changed glyph appears.
        assert!(rendered.contains('x'));
    }

    #[test]
    fn cursor_restored_when_visible() {
        let cells = vec![Cell::EMPTY; 4];
        let prev = cells.clone();
        let mut out = OutputBuffer::new();
        let rendered = out.render_diff(&cells, &prev, 2, 2, 1, 1, true).to_string();
        assert!(rendered.ends_with(ansi::CURSOR_SHOW));
        assert!(rendered.contains("\x1b[2;2H"));
    }
}
