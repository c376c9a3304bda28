//! Per-view presentation state: the caret and the other view cursors, the
//! sticky column, folds, and the paint batch.

use crate::fold::FoldTable;
use crate::paint::PaintBatch;
use crate::projector::{CursorProjector, ScreenPos, ViewCursor, ViewOptions};
use core_text::{Buffer, BufferOperation, Position};
use tracing::trace;

/// Column that vertical motions try to return to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickyColumn {
    /// Virtual screen column (`row * width + col` on wrapped lines).
    Column(usize),
    /// Always the end of the line (set by `$`).
    EndOfLine,
}

/// Compute the desired first visible row so that `cursor_row` stays inside
/// the viewport with `margin` rows above and below it.
///
/// The margin is clamped to half the height. Returns `None` when no scroll is
/// needed.
pub fn compute_scroll_intent(first: usize, cursor_row: usize, height: usize, margin: usize) -> Option<usize> {
    if height == 0 {
        return None;
    }
    let m = margin.min(height / 2);
    let bottom = first + height;
    if cursor_row < first + m {
        let new_first = cursor_row.saturating_sub(m);
        if new_first != first {
            return Some(new_first);
        }
    } else if cursor_row + m >= bottom {
        let new_first = cursor_row + m + 1 - height;
        if new_first != first {
            return Some(new_first);
        }
    }
    None
}

#[derive(Debug, Clone)]
pub struct View {
    pub caret: ViewCursor,
    /// Visual selection anchor while a selection mode is active.
    pub anchor: Option<ViewCursor>,
    /// Top-left of the viewport.
    pub scroll: ViewCursor,
    /// Caret parked while a paint batch is open.
    pub kept: Option<ViewCursor>,
    pub sticky: Option<StickyColumn>,
    pub folds: FoldTable,
    pub paint: PaintBatch,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    pub fn new() -> Self {
        Self {
            caret: ViewCursor::origin(),
            anchor: None,
            scroll: ViewCursor::origin(),
            kept: None,
            sticky: None,
            folds: FoldTable::new(),
            paint: PaintBatch::default(),
        }
    }

    pub fn caret_pos(&self) -> Position {
        self.caret.buffer
    }

    pub fn first_row(&self) -> usize {
        self.scroll.screen.line
    }

    /// Put the caret at `pos` and remember its column for vertical motions.
    pub fn set_caret(&mut self, buffer: &Buffer, opts: ViewOptions, edit: bool, pos: Position) {
        let mut p = CursorProjector::new(buffer, &self.folds, opts, edit);
        self.caret = p.resolve(pos);
        self.sticky = Some(StickyColumn::Column(self.caret.virtual_col(&opts)));
    }

    /// Put the caret at `pos` without touching the sticky column.
    pub fn place_caret(&mut self, buffer: &Buffer, opts: ViewOptions, edit: bool, pos: Position) {
        let mut p = CursorProjector::new(buffer, &self.folds, opts, edit);
        self.caret = p.resolve(pos);
    }

    pub fn set_sticky_eol(&mut self) {
        self.sticky = Some(StickyColumn::EndOfLine);
    }

    fn sticky_or_current(&mut self, opts: &ViewOptions) -> StickyColumn {
        *self
            .sticky
            .get_or_insert(StickyColumn::Column(self.caret.virtual_col(opts)))
    }

    /// Move to buffer line `line` keeping the sticky column.
    pub fn goto_line_sticky(&mut self, buffer: &Buffer, opts: ViewOptions, edit: bool, line: usize) {
        let sticky = self.sticky_or_current(&opts);
        let mut p = CursorProjector::new(buffer, &self.folds, opts, edit);
        match sticky {
            StickyColumn::Column(v) => p.goto_screen_col_buffer_line(&mut self.caret, v, line),
            StickyColumn::EndOfLine => {
                p.goto_line_buffer(&mut self.caret, line);
                p.goto_column_buffer(&mut self.caret, usize::MAX);
            }
        }
    }

    /// Vertical motion by `delta` visible lines (`j` / `k`). Returns false when
    /// the caret could not move.
    pub fn move_lines(&mut self, buffer: &Buffer, opts: ViewOptions, edit: bool, delta: isize) -> bool {
        let from = self.caret.buffer.line;
        let target = {
            let p = CursorProjector::new(buffer, &self.folds, opts, edit);
            if delta >= 0 {
                p.line_below(from, delta.unsigned_abs())
            } else {
                p.line_above(from, delta.unsigned_abs())
            }
        };
        if target == from {
            return false;
        }
        self.goto_line_sticky(buffer, opts, edit, target);
        true
    }

    /// Vertical motion by rendered rows (`gj` / `gk`).
    pub fn move_rows(&mut self, buffer: &Buffer, opts: ViewOptions, edit: bool, delta: isize) -> bool {
        let sticky = self.sticky_or_current(&opts);
        let w = opts.columns.max(1);
        let col = match sticky {
            StickyColumn::Column(v) if opts.wrap => v % w,
            StickyColumn::Column(v) => v,
            StickyColumn::EndOfLine => usize::MAX,
        };
        let row = self.caret.screen.line;
        let target = row.saturating_add_signed(delta);
        let before = self.caret;
        let mut p = CursorProjector::new(buffer, &self.folds, opts, edit);
        p.goto_screen(&mut self.caret, ScreenPos::new(target, col));
        self.caret != before
    }

    /// Page forward or backward by `count` screens (`<CTRL>f` / `<CTRL>b`).
    pub fn page(&mut self, buffer: &Buffer, opts: ViewOptions, edit: bool, forward: bool, count: usize) {
        let step = opts.rows.saturating_sub(2).max(1) * count.max(1);
        let mut p = CursorProjector::new(buffer, &self.folds, opts, edit);
        let last_row = p.total_rows().saturating_sub(1);
        let row = if forward {
            (self.scroll.screen.line + step).min(last_row)
        } else {
            self.scroll.screen.line.saturating_sub(step)
        };
        p.goto_line_screen(&mut self.scroll, row);
        let target_row = if forward {
            self.scroll.screen.line
        } else {
            (self.scroll.screen.line + opts.rows).saturating_sub(1).min(last_row)
        };
        p.goto_line_screen(&mut self.caret, target_row);
        trace!(target: "model.project", forward, row, "page");
    }

    /// Recompute screen positions after the buffer changed. Buffer positions
    /// are clamped; a caret hidden by a closed fold moves off it.
    pub fn resync(&mut self, buffer: &Buffer, opts: ViewOptions, edit: bool) {
        let mut p = CursorProjector::new(buffer, &self.folds, opts, edit);
        self.caret = p.resolve(self.caret.buffer);
        if let Some(anchor) = self.anchor {
            let mut loose = CursorProjector::new(buffer, &self.folds, opts, true);
            self.anchor = Some(loose.resolve(anchor.buffer));
        }
        let top = p.resolve(Position::new(self.scroll.buffer.line, 0));
        let row = top.screen.line + self.scroll.row_in_line.min(top.line_height.saturating_sub(1));
        let mut scroll = top;
        p.goto_line_screen(&mut scroll, row);
        self.scroll = scroll;
    }

    /// Scroll so the caret stays inside the viewport honoring `margin`.
    pub fn scroll_to_caret(&mut self, buffer: &Buffer, opts: ViewOptions, margin: usize) -> bool {
        let Some(new_first) = compute_scroll_intent(self.first_row(), self.caret.screen.line, opts.rows, margin)
        else {
            return false;
        };
        let mut p = CursorProjector::new(buffer, &self.folds, opts, false);
        p.goto_line_screen(&mut self.scroll, new_first);
        trace!(target: "model.project", first = new_first, "scrolled");
        self.paint.damage_all();
        true
    }

    /// Ordered selection bounds `(start, end)`, both inclusive.
    pub fn selection(&self) -> Option<(Position, Position)> {
        let anchor = self.anchor?.buffer;
        let caret = self.caret.buffer;
        Some(if anchor <= caret { (anchor, caret) } else { (caret, anchor) })
    }

    pub fn swap_anchor(&mut self) {
        if let Some(anchor) = self.anchor.as_mut() {
            std::mem::swap(anchor, &mut self.caret);
            self.sticky = None;
        }
    }

    /// Shift folds and record damage for applied buffer operations.
    pub fn apply_changes(&mut self, ops: &[BufferOperation]) {
        for op in ops {
            self.folds.apply_line_change(op);
            self.paint.damage_op(op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(columns: usize) -> ViewOptions {
        ViewOptions {
            tab_width: 8,
            wrap: true,
            columns,
            rows: 5,
        }
    }

    #[test]
    fn sticky_column_survives_short_line() {
        let buf = Buffer::from_str("t", "0123456789\nabc\nabcdefghij");
        let mut v = View::new();
        v.set_caret(&buf, opts(80), false, Position::new(0, 6));
        assert_eq!(v.caret.screen.col, 6);
        assert!(v.move_lines(&buf, opts(80), false, 1));
        assert_eq!(v.caret.buffer, Position::new(1, 2));
        assert!(v.move_lines(&buf, opts(80), false, 1));
        assert_eq!(v.caret.screen.col, 6);
        assert!(v.move_lines(&buf, opts(80), false, -2));
        assert_eq!(v.caret.buffer, Position::new(0, 6));
    }

    #[test]
    fn end_of_line_sticky() {
        let buf = Buffer::from_str("t", "abc\nabcdefg\nab");
        let mut v = View::new();
        v.set_caret(&buf, opts(80), false, Position::new(0, 2));
        v.set_sticky_eol();
        v.move_lines(&buf, opts(80), false, 1);
        assert_eq!(v.caret.buffer, Position::new(1, 6));
        v.move_lines(&buf, opts(80), false, 1);
        assert_eq!(v.caret.buffer, Position::new(2, 1));
        assert!(!v.move_lines(&buf, opts(80), false, 1));
    }

    #[test]
    fn screen_rows_move_within_wrapped_line() {
        let buf = Buffer::from_str("t", "abcdefghijkl\nxy");
        let mut v = View::new();
        v.set_caret(&buf, opts(5), false, Position::new(0, 1));
        assert!(v.move_rows(&buf, opts(5), false, 1));
        assert_eq!(v.caret.buffer, Position::new(0, 6));
        v.move_rows(&buf, opts(5), false, 1);
        assert_eq!(v.caret.buffer, Position::new(0, 11));
        v.move_rows(&buf, opts(5), false, 1);
        assert_eq!(v.caret.buffer, Position::new(1, 1));
        v.move_rows(&buf, opts(5), false, -2);
        assert_eq!(v.caret.buffer, Position::new(0, 6));
    }

    #[test]
    fn vertical_motion_skips_closed_fold() {
        let text: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
        let buf = Buffer::from_str("t", &text.join("\n"));
        let mut v = View::new();
        v.folds.create(3, 7).unwrap();
        v.set_caret(&buf, opts(80), false, Position::new(2, 3));
        v.move_lines(&buf, opts(80), false, 1);
        assert_eq!(v.caret.buffer, Position::new(7, 3));
        v.move_lines(&buf, opts(80), false, -1);
        assert_eq!(v.caret.buffer, Position::new(2, 3));
    }

    #[test]
    fn scroll_follows_caret() {
        let text: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let buf = Buffer::from_str("t", &text.join("\n"));
        let mut v = View::new();
        v.set_caret(&buf, opts(80), false, Position::new(7, 0));
        assert!(v.scroll_to_caret(&buf, opts(80), 0));
        assert_eq!(v.first_row(), 3);
        assert_eq!(v.scroll.buffer.line, 3);
        assert!(!v.scroll_to_caret(&buf, opts(80), 0));
        v.set_caret(&buf, opts(80), false, Position::new(1, 0));
        v.scroll_to_caret(&buf, opts(80), 1);
        assert_eq!(v.first_row(), 0);
    }

    #[test]
    fn page_forward_moves_viewport_and_caret() {
        let text: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let buf = Buffer::from_str("t", &text.join("\n"));
        let mut v = View::new();
        v.page(&buf, opts(80), false, true, 1);
        assert_eq!(v.first_row(), 3);
        assert_eq!(v.caret.buffer.line, 3);
        v.page(&buf, opts(80), false, false, 1);
        assert_eq!(v.first_row(), 0);
        assert_eq!(v.caret.buffer.line, 4);
    }

    #[test]
    fn selection_is_ordered() {
        let buf = Buffer::from_str("t", "abc\ndef");
        let mut v = View::new();
        v.set_caret(&buf, opts(80), false, Position::new(1, 1));
        v.anchor = Some(v.caret);
        v.set_caret(&buf, opts(80), false, Position::new(0, 2));
        assert_eq!(v.selection(), Some((Position::new(0, 2), Position::new(1, 1))));
        v.swap_anchor();
        assert_eq!(v.caret.buffer, Position::new(1, 1));
    }

    #[test]
    fn scroll_intent_margins() {
        assert_eq!(compute_scroll_intent(0, 5, 10, 2), None);
        assert_eq!(compute_scroll_intent(10, 11, 6, 2), Some(9));
        assert_eq!(compute_scroll_intent(0, 4, 5, 1), Some(1));
        assert_eq!(compute_scroll_intent(0, 2, 4, 10), Some(1));
        assert_eq!(compute_scroll_intent(0, 0, 0, 0), None);
    }
}
