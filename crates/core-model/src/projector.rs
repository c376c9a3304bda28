//! Buffer ⇄ screen coordinate projection.
//!
//! Screen space lays the buffer out row by row: every visible line takes as
//! many rows as its wrapped content needs and every closed fold takes a single
//! marker row. Within a line, a character's screen position is the first cell
//! of its span. Tabs advance to the next tab stop of the unwrapped (virtual)
//! column, so a tab at a row boundary may be split and continue on the next
//! row. A wide character that does not fit on the rest of a row starts the
//! next one.
//!
//! The projector moves a working [`ViewCursor`] step by step: line steps walk
//! fold-aware units and accumulate row counts, column steps walk characters.
//! Moving to an earlier column restarts the walk at the line start.

use crate::fold::FoldTable;
use core_text::width::{cell_width, char_width, tab_advance};
use core_text::{Buffer, Position, display_width};
use tracing::{debug, trace};

/// Read-only option snapshot taken at the start of a navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub tab_width: usize,
    pub wrap: bool,
    /// Viewport width in cells.
    pub columns: usize,
    /// Text rows in the viewport.
    pub rows: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            tab_width: 8,
            wrap: true,
            columns: 80,
            rows: 23,
        }
    }
}

impl ViewOptions {
    fn width(&self) -> usize {
        self.columns.max(1)
    }
}

/// Screen coordinates: absolute row from the top of the laid-out buffer, and
/// column within the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScreenPos {
    pub line: usize,
    pub col: usize,
}

impl ScreenPos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A buffer position together with its derived screen position and the wrap
/// bookkeeping needed to continue stepping from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewCursor {
    pub buffer: Position,
    pub screen: ScreenPos,
    /// Row of the cursor within its buffer line.
    pub row_in_line: usize,
    /// Unwrapped virtual column of the character under the cursor.
    pub vcol: usize,
    /// Rows the cursor's line occupies.
    pub line_height: usize,
    /// End-of-line caret sitting at column == width of a full row.
    pub wrap_pending: bool,
    /// The character under the cursor is a tab crossing a row boundary.
    pub wrap_tab: bool,
    /// Cells at the start of this row taken by a tab continued from the row above.
    pub space_fill: usize,
}

impl ViewCursor {
    pub fn origin() -> Self {
        Self {
            line_height: 1,
            ..Self::default()
        }
    }

    /// Column counted across the rows of the line (`row * width + col`).
    pub fn virtual_col(&self, opts: &ViewOptions) -> usize {
        if opts.wrap {
            self.row_in_line * opts.width() + self.screen.col
        } else {
            self.screen.col
        }
    }
}

/// Row advance, column, and wrap-pending flag for the cell after a character
/// whose span ends (unwrapped) at `col`; `next` is the following character, or
/// `None` for the end-of-line position.
fn place_next(opts: &ViewOptions, col: usize, next: Option<char>) -> (usize, usize, bool) {
    if !opts.wrap {
        return (0, col, false);
    }
    let w = opts.width();
    match next {
        Some(ch) => {
            let mut rows = col / w;
            let mut c = col % w;
            if ch != '\t' && c > 0 && c + char_width(ch) > w {
                rows += 1;
                c = 0;
            }
            (rows, c, false)
        }
        None => {
            let mut rows = 0;
            let mut c = col;
            while c > w {
                rows += 1;
                c -= w;
            }
            (rows, c, c == w)
        }
    }
}

fn splits_tab(opts: &ViewOptions, ch: Option<char>, col: usize, vcol: usize) -> bool {
    opts.wrap && ch == Some('\t') && col + tab_advance(vcol, opts.tab_width) > opts.width()
}

/// Put `cur` on the first character of its line.
fn reset_column(opts: &ViewOptions, chars: &[char], cur: &mut ViewCursor) {
    cur.screen.line = cur.screen.line.saturating_sub(cur.row_in_line);
    cur.row_in_line = 0;
    cur.buffer.col = 0;
    cur.vcol = 0;
    cur.screen.col = 0;
    cur.wrap_pending = false;
    cur.space_fill = 0;
    cur.wrap_tab = splits_tab(opts, chars.first().copied(), 0, 0);
}

/// Advance `cur` by one character. Returns false at the end of the line.
fn step(opts: &ViewOptions, chars: &[char], cur: &mut ViewCursor) -> bool {
    let Some(&ch) = chars.get(cur.buffer.col) else {
        return false;
    };
    let adv = cell_width(ch, cur.vcol, opts.tab_width);
    let end = cur.screen.col + adv;
    let split = cur.wrap_tab;
    let next = chars.get(cur.buffer.col + 1).copied();
    let (rows, col, pending) = place_next(opts, end, next);
    cur.buffer.col += 1;
    cur.vcol += adv;
    cur.row_in_line += rows;
    cur.screen.line += rows;
    cur.screen.col = col;
    cur.wrap_pending = pending;
    cur.space_fill = if split { end % opts.width() } else { 0 };
    cur.wrap_tab = splits_tab(opts, next, col, cur.vcol);
    true
}

fn measure_height(opts: &ViewOptions, chars: &[char]) -> usize {
    if !opts.wrap {
        return 1;
    }
    let mut cur = ViewCursor::origin();
    reset_column(opts, chars, &mut cur);
    while step(opts, chars, &mut cur) {}
    cur.row_in_line + 1
}

#[derive(Debug, Default)]
struct LineCache {
    line: Option<usize>,
    chars: Vec<char>,
    /// Tab-expanded width of the whole line.
    width: usize,
    height: usize,
}

pub struct CursorProjector<'a> {
    buffer: &'a Buffer,
    folds: &'a FoldTable,
    opts: ViewOptions,
    edit: bool,
    cache: LineCache,
}

impl<'a> CursorProjector<'a> {
    /// `edit` selects the clamping rule: edit-capable modes may place the caret
    /// one column past the last character.
    pub fn new(buffer: &'a Buffer, folds: &'a FoldTable, opts: ViewOptions, edit: bool) -> Self {
        Self {
            buffer,
            folds,
            opts,
            edit,
            cache: LineCache::default(),
        }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.opts
    }

    fn load(&mut self, line: usize) {
        if self.cache.line == Some(line) {
            return;
        }
        let text = self.buffer.line_text(line).unwrap_or("");
        self.cache.chars.clear();
        self.cache.chars.extend(text.chars());
        self.cache.width = display_width(text, self.opts.tab_width);
        self.cache.height = measure_height(&self.opts, &self.cache.chars);
        self.cache.line = Some(line);
        trace!(target: "model.project", line, height = self.cache.height, "line_cached");
    }

    /// Tab-expanded width of `line`.
    pub fn display_width(&mut self, line: usize) -> usize {
        self.load(line);
        self.cache.width
    }

    fn folded(&self, line: usize) -> bool {
        self.folds.is_folded(line).is_some()
    }

    /// Rows taken by the unit (line or closed fold) headed at `line`.
    pub fn unit_height(&mut self, line: usize) -> usize {
        if self.folded(line) {
            return 1;
        }
        self.load(line);
        self.cache.height
    }

    fn unit_head(&self, line: usize) -> usize {
        self.folds.line_heading_fold(line)
    }

    fn unit_next(&self, line: usize) -> usize {
        if self.folded(line) {
            self.folds.line_after_fold(line)
        } else {
            line + 1
        }
    }

    /// Largest caret column on `line` under the current clamping rule.
    pub fn max_col(&self, line: usize) -> usize {
        if self.folded(line) {
            return 0;
        }
        let len = self.buffer.line_len(line);
        if self.edit { len } else { len.saturating_sub(1) }
    }

    fn clamp_line(&self, line: usize) -> usize {
        let last = self.buffer.last_line();
        if line > last {
            debug!(target: "model.project", requested = line, last, "line_out_of_range");
            return last;
        }
        line
    }

    /// Where a vertical move from `from` toward `target` ends when `target` is
    /// hidden by a closed fold: past the fold going down, above it going up,
    /// otherwise the opposite boundary, or `from` when neither exists.
    pub fn land(&self, from: usize, target: usize) -> usize {
        let Some(head) = self.folds.is_folded(target) else {
            return target;
        };
        let after = self.folds.line_after_fold(target);
        let after = (after < self.buffer.line_count()).then_some(after);
        let before = head.checked_sub(1);
        let landed = if target >= from {
            after.or(before).unwrap_or(from)
        } else {
            before.or(after).unwrap_or(from)
        };
        trace!(target: "model.project", from, target, landed, "fold_landing");
        landed
    }

    /// Visible line `count` lines below `line`, counting each closed fold once.
    pub fn line_below(&self, line: usize, count: usize) -> usize {
        let last = self.buffer.last_line();
        let mut at = line;
        for _ in 0..count {
            let next = self.unit_next(at);
            if next > last {
                break;
            }
            let landed = self.land(at, next);
            if landed <= at {
                break;
            }
            at = landed;
        }
        at
    }

    /// Visible line `count` lines above `line`, counting each closed fold once.
    pub fn line_above(&self, line: usize, count: usize) -> usize {
        let mut at = line;
        for _ in 0..count {
            let head = self.unit_head(at);
            let Some(prev) = head.checked_sub(1) else {
                break;
            };
            let landed = self.land(at, prev);
            if landed >= at {
                break;
            }
            at = landed;
        }
        at
    }

    /// Put `cur` at the start of its (already positioned) line.
    fn begin_line(&mut self, cur: &mut ViewCursor) {
        let line = cur.buffer.line;
        cur.line_height = self.unit_height(line);
        self.load(line);
        reset_column(&self.opts, &self.cache.chars, cur);
    }

    fn walk_to_unit(&mut self, cur: &mut ViewCursor, target: usize) {
        let mut head = self.unit_head(cur.buffer.line);
        let mut row = cur.screen.line.saturating_sub(cur.row_in_line);
        let dest = self.unit_head(target);
        while head < dest {
            row += self.unit_height(head);
            head = self.unit_next(head);
        }
        while head > dest {
            head = self.unit_head(head - 1);
            row = row.saturating_sub(self.unit_height(head));
        }
        cur.buffer.line = target;
        cur.screen.line = row;
        cur.row_in_line = 0;
        self.begin_line(cur);
    }

    /// Move `cur` to the start of buffer line `target`.
    pub fn goto_line_buffer(&mut self, cur: &mut ViewCursor, target: usize) {
        let target = self.clamp_line(target);
        let target = self.land(cur.buffer.line, target);
        self.walk_to_unit(cur, target);
    }

    /// Move `cur` to the line containing screen row `target` and return the
    /// requested row within that line.
    fn locate_row(&mut self, cur: &mut ViewCursor, target: usize) -> usize {
        let from = cur.buffer.line;
        let mut head = self.unit_head(from);
        let mut row = cur.screen.line.saturating_sub(cur.row_in_line);
        while row > target && head > 0 {
            head = self.unit_head(head - 1);
            row = row.saturating_sub(self.unit_height(head));
        }
        let last = self.buffer.last_line();
        loop {
            let h = self.unit_height(head);
            if target < row + h {
                break;
            }
            let next = self.unit_next(head);
            if next > last {
                break;
            }
            row += h;
            head = next;
        }
        let within = target.saturating_sub(row).min(self.unit_height(head) - 1);
        let landed = self.land(from, head);
        cur.buffer.line = head;
        cur.screen.line = row;
        cur.row_in_line = 0;
        if landed != head {
            self.walk_to_unit(cur, landed);
            return 0;
        }
        self.begin_line(cur);
        within
    }

    /// Move `cur` to the first character shown on screen row `target`.
    pub fn goto_line_screen(&mut self, cur: &mut ViewCursor, target: usize) {
        let within = self.locate_row(cur, target);
        let w = self.opts.width();
        self.goto_column_screen(cur, within * w);
    }

    /// Move `cur` to buffer column `target` on its line (clamped).
    pub fn goto_column_buffer(&mut self, cur: &mut ViewCursor, target: usize) {
        let line = cur.buffer.line;
        self.load(line);
        let max = self.max_col(line);
        let target = target.min(max);
        let chars = &self.cache.chars;
        if target < cur.buffer.col || cur.buffer.col > chars.len() {
            reset_column(&self.opts, chars, cur);
        }
        while cur.buffer.col < target && step(&self.opts, chars, cur) {}
    }

    /// Move `cur` to the character covering virtual screen column `target`
    /// (`row * width + col` when wrapping) on its line.
    pub fn goto_column_screen(&mut self, cur: &mut ViewCursor, target: usize) {
        let line = cur.buffer.line;
        self.load(line);
        let max = self.max_col(line);
        let chars = &self.cache.chars;
        if target < cur.virtual_col(&self.opts) || cur.buffer.col > max {
            reset_column(&self.opts, chars, cur);
        }
        while cur.buffer.col < max {
            let mut next = *cur;
            if !step(&self.opts, chars, &mut next) || target < next.virtual_col(&self.opts) {
                break;
            }
            *cur = next;
        }
    }

    /// Buffer column × buffer line.
    pub fn goto_buffer(&mut self, cur: &mut ViewCursor, pos: Position) {
        self.goto_line_buffer(cur, pos.line);
        self.goto_column_buffer(cur, pos.col);
    }

    /// Screen column × buffer line: vertical motions preserving a sticky column.
    pub fn goto_screen_col_buffer_line(&mut self, cur: &mut ViewCursor, vcol: usize, line: usize) {
        self.goto_line_buffer(cur, line);
        self.goto_column_screen(cur, vcol);
    }

    /// Buffer column × screen line.
    pub fn goto_buffer_col_screen_line(&mut self, cur: &mut ViewCursor, col: usize, row: usize) {
        self.locate_row(cur, row);
        self.goto_column_buffer(cur, col);
    }

    /// Screen column × screen line.
    pub fn goto_screen(&mut self, cur: &mut ViewCursor, screen: ScreenPos) {
        let within = self.locate_row(cur, screen.line);
        let target = if self.opts.wrap {
            within * self.opts.width() + screen.col
        } else {
            screen.col
        };
        self.goto_column_screen(cur, target);
    }

    /// Fully resolved cursor for `pos`, walking from the top of the buffer.
    pub fn resolve(&mut self, pos: Position) -> ViewCursor {
        let mut cur = ViewCursor::origin();
        self.goto_buffer(&mut cur, pos);
        cur
    }

    /// Screen row where `line` starts.
    pub fn screen_row_of(&mut self, line: usize) -> usize {
        let mut cur = ViewCursor::origin();
        self.walk_to_unit(&mut cur, self.clamp_line(line));
        cur.screen.line
    }

    /// Total rows of the laid-out buffer.
    pub fn total_rows(&mut self) -> usize {
        let last = self.buffer.last_line();
        let head = self.unit_head(last);
        self.screen_row_of(head) + self.unit_height(head)
    }
}
