//! A buffer paired with its undo history.
//!
//! All text mutation goes through [`Document`], which forwards each primitive to
//! the [`Buffer`], mirrors the resulting operations into the [`UndoLog`] and
//! appends them to a change journal. The journal is drained by the view layer
//! to shift folds and marks and to compute repaint damage.

use crate::registers::{RegisterContent, RegisterStore};
use crate::undo::{ReplayState, UndoLog};
use core_text::{Buffer, BufferOperation, Highlighter, Position};
use regex::Regex;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Document {
    buffer: Buffer,
    undo: UndoLog,
    changes: Vec<BufferOperation>,
    modified: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Buffer::default())
    }
}

impl Document {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            undo: UndoLog::new(),
            changes: Vec::new(),
            modified: false,
        }
    }

    pub fn with_undo_levels(buffer: Buffer, levels: usize) -> Self {
        Self {
            undo: UndoLog::with_limit(levels),
            ..Self::new(buffer)
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Drain the operations applied since the last call.
    pub fn take_changes(&mut self) -> Vec<BufferOperation> {
        std::mem::take(&mut self.changes)
    }

    pub fn attributes(&mut self, line: usize, hl: &dyn Highlighter) -> Option<&[u8]> {
        self.buffer.attributes(line, hl)
    }

    fn record(&mut self, op: BufferOperation) {
        self.undo.record_operation(op.clone());
        self.changes.push(op);
        self.modified = true;
    }

    fn record_all(&mut self, ops: Vec<BufferOperation>) -> bool {
        let changed = !ops.is_empty();
        for op in ops {
            self.record(op);
        }
        changed
    }

    /// Run `f` with undo recording suspended; the previous state is restored on return.
    fn replay<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = self.undo.set_state(ReplayState::Replaying);
        let out = f(self);
        self.undo.set_state(prev);
        out
    }

    pub fn insert_char(&mut self, col: usize, line: usize, text: &str) -> bool {
        match self.buffer.insert_char(col, line, text) {
            Some(op) => {
                self.record(op);
                true
            }
            None => false,
        }
    }

    /// Remove up to `count` characters, returning the removed text.
    pub fn delete_char(&mut self, col: usize, line: usize, count: usize) -> Option<String> {
        let op = self.buffer.delete_char(col, line, count)?;
        let removed = op.text.clone();
        self.record(op);
        Some(removed)
    }

    pub fn insert_new_line(&mut self, col: usize, line: usize) -> bool {
        let ops = self.buffer.insert_new_line(col, line);
        self.record_all(ops)
    }

    /// Remove `count` lines starting at `line`, storing them linewise in
    /// `registers` (under `target`, or the default slots when `None`).
    pub fn delete_line(
        &mut self,
        line: usize,
        count: usize,
        registers: &mut dyn RegisterStore,
        target: Option<char>,
    ) -> Vec<String> {
        let (removed, ops) = self.buffer.delete_line(line, count);
        self.record_all(ops);
        if !removed.is_empty() {
            registers.record_delete(target, RegisterContent::linewise(removed.clone()));
        }
        debug_assert!(self.buffer.line_count() >= 1);
        removed
    }

    pub fn replace_line(&mut self, line: usize, text: &str) -> bool {
        let ops = self.buffer.replace_line(line, text);
        self.record_all(ops)
    }

    pub fn substitute(&mut self, pattern: &Regex, replacement: &str, whole_line: bool, line: usize) -> bool {
        let (changed, ops) = self.buffer.substitute(pattern, replacement, whole_line, line);
        self.record_all(ops);
        changed
    }

    pub fn join_lines(&mut self, line: usize, separator: &str) -> bool {
        let ops = self.buffer.join_lines(line, separator);
        self.record_all(ops)
    }

    /// Insert whole lines before index `at` (`at == line_count` appends).
    pub fn insert_lines(&mut self, at: usize, lines: &[String]) -> bool {
        let at = at.min(self.buffer.line_count());
        let mut changed = false;
        for (i, text) in lines.iter().enumerate() {
            let Some(op) = self.buffer.insert_empty_line(at + i) else {
                break;
            };
            self.record(op);
            self.insert_char(0, at + i, text);
            changed = true;
        }
        changed
    }

    /// Insert text that may span several lines at `pos`. Returns the position of
    /// the last inserted character (or `pos` when nothing was inserted).
    pub fn insert_text(&mut self, pos: Position, text: &str) -> Position {
        let pos = self.buffer.clamp(pos);
        let parts: Vec<&str> = text.split('\n').collect();
        if parts.len() == 1 {
            if !self.insert_char(pos.col, pos.line, text) {
                return pos;
            }
            let n = text.chars().count();
            return Position::new(pos.line, pos.col + n.saturating_sub(1));
        }
        let tail = self.delete_char(pos.col, pos.line, usize::MAX).unwrap_or_default();
        self.insert_char(pos.col, pos.line, parts[0]);
        let mut line = pos.line;
        for part in &parts[1..] {
            line += 1;
            if let Some(op) = self.buffer.insert_empty_line(line) {
                self.record(op);
            }
            self.insert_char(0, line, part);
        }
        let last_len = self.buffer.line_len(line);
        self.insert_char(last_len, line, &tail);
        Position::new(line, last_len.saturating_sub(1))
    }

    /// Delete the characters in `[start, end)`, which may span lines, and return
    /// them joined with `\n`.
    pub fn delete_range(&mut self, start: Position, end: Position) -> String {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        let start = self.buffer.clamp(start);
        let end = self.buffer.clamp(end);
        if start.line == end.line {
            return self
                .delete_char(start.col, start.line, end.col - start.col.min(end.col))
                .unwrap_or_default();
        }
        let mut removed = self.delete_char(start.col, start.line, usize::MAX).unwrap_or_default();
        for _ in start.line + 1..end.line {
            removed.push('\n');
            removed.push_str(&self.delete_char(0, start.line + 1, usize::MAX).unwrap_or_default());
            if let Some(op) = self.buffer.remove_empty_line(start.line + 1) {
                self.record(op);
            }
        }
        removed.push('\n');
        removed.push_str(&self.delete_char(0, start.line + 1, end.col).unwrap_or_default());
        self.join_lines(start.line, "");
        removed
    }

    /// Command boundary: seal the pending undo item with the caret after the action.
    pub fn commit(&mut self, cursor: Position) {
        self.undo.commit_undo_item(cursor);
    }

    pub fn may_undo(&self) -> bool {
        self.undo.may_undo() || !self.undo.pending().is_empty()
    }

    pub fn may_redo(&self) -> bool {
        self.undo.may_redo() && self.undo.pending().is_empty()
    }

    /// Undo the last committed item. Returns the caret to restore, or `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self, cursor: Position) -> Option<Position> {
        self.commit(cursor);
        let Some((ops, start)) = self.undo.step_back() else {
            debug!(target: "state.undo", "nothing_to_undo");
            return None;
        };
        self.replay(|doc| doc.apply_all(&ops));
        Some(self.buffer.clamp(start))
    }

    /// Redo the item after the history index. Returns the caret to restore, or
    /// `None` when there is nothing to redo.
    pub fn redo(&mut self, cursor: Position) -> Option<Position> {
        self.commit(cursor);
        let Some((ops, end)) = self.undo.step_forward() else {
            debug!(target: "state.undo", "nothing_to_redo");
            return None;
        };
        self.replay(|doc| doc.apply_all(&ops));
        Some(self.buffer.clamp(end))
    }

    fn apply_all(&mut self, ops: &[BufferOperation]) {
        for op in ops {
            match self.buffer.apply(op) {
                Some(applied) => self.record(applied),
                None => debug!(target: "state.undo", line = op.line, kind = ?op.kind, "replay_skipped"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::Registers;

    fn texts(doc: &Document) -> Vec<&str> {
        doc.buffer().lines().collect()
    }

    #[test]
    fn end_to_end_insert_split_undo() {
        let mut doc = Document::default();
        doc.commit(Position::origin());
        assert!(doc.insert_char(0, 0, "ab"));
        doc.commit(Position::new(0, 2));
        assert_eq!(texts(&doc), vec!["ab"]);
        assert!(doc.insert_new_line(1, 0));
        doc.commit(Position::new(1, 0));
        assert_eq!(texts(&doc), vec!["a", "b"]);
        assert!(doc.insert_char(0, 1, "cd"));
        doc.commit(Position::new(1, 2));
        assert_eq!(texts(&doc), vec!["a", "cdb"]);

        for _ in 0..3 {
            assert!(doc.undo(Position::new(1, 2)).is_some());
        }
        assert_eq!(texts(&doc), vec![""]);
        assert_eq!(doc.buffer().line_count(), 1);
        assert!(doc.undo(Position::origin()).is_none());
    }

    #[test]
    fn redo_after_undo_restores_content_and_cursor() {
        let mut doc = Document::new(Buffer::from_str("t", "one\ntwo"));
        doc.commit(Position::origin());
        doc.insert_char(3, 0, "!");
        doc.join_lines(0, " ");
        doc.commit(Position::new(0, 4));
        assert_eq!(texts(&doc), vec!["one! two"]);
        assert_eq!(doc.undo(Position::new(0, 4)), Some(Position::origin()));
        assert_eq!(texts(&doc), vec!["one", "two"]);
        assert_eq!(doc.redo(Position::origin()), Some(Position::new(0, 4)));
        assert_eq!(texts(&doc), vec!["one! two"]);
        assert!(doc.redo(Position::origin()).is_none());
    }

    #[test]
    fn replay_does_not_grow_history() {
        let mut doc = Document::default();
        doc.insert_char(0, 0, "x");
        doc.commit(Position::new(0, 1));
        doc.undo(Position::new(0, 1));
        assert_eq!(doc.undo_log().len(), 1);
        assert!(doc.undo_log().pending().is_empty());
        assert_eq!(doc.undo_log().state(), ReplayState::Recording);
    }

    #[test]
    fn undo_commits_pending_first() {
        let mut doc = Document::default();
        doc.insert_char(0, 0, "abc");
        assert_eq!(doc.undo(Position::new(0, 3)), Some(Position::origin()));
        assert_eq!(texts(&doc), vec![""]);
    }

    #[test]
    fn delete_line_fills_registers() {
        let mut regs = Registers::new();
        let mut doc = Document::new(Buffer::from_str("t", "a\nb\nc"));
        let removed = doc.delete_line(1, 5, &mut regs, None);
        assert_eq!(removed, vec!["b", "c"]);
        assert_eq!(texts(&doc), vec!["a"]);
        let reg = regs.get_register('1').unwrap();
        assert!(reg.linewise);
        assert_eq!(reg.lines, vec!["b", "c"]);
        doc.delete_line(0, 1, &mut regs, Some('q'));
        assert_eq!(texts(&doc), vec![""]);
        assert_eq!(regs.get_register('q').unwrap().lines, vec!["a"]);
    }

    #[test]
    fn delete_range_spans_lines() {
        let mut doc = Document::new(Buffer::from_str("t", "hello\nmid\nworld"));
        let removed = doc.delete_range(Position::new(0, 2), Position::new(2, 3));
        assert_eq!(removed, "llo\nmid\nwor");
        assert_eq!(texts(&doc), vec!["held"]);
        doc.commit(Position::new(0, 2));
        doc.undo(Position::new(0, 2));
        assert_eq!(texts(&doc), vec!["hello", "mid", "world"]);
    }

    #[test]
    fn insert_text_multiline() {
        let mut doc = Document::new(Buffer::from_str("t", "abcd"));
        let end = doc.insert_text(Position::new(0, 2), "X\nYZ");
        assert_eq!(texts(&doc), vec!["abX", "YZcd"]);
        assert_eq!(end, Position::new(1, 1));
        let end = doc.insert_text(Position::new(0, 0), "q");
        assert_eq!(end, Position::new(0, 0));
    }

    #[test]
    fn insert_lines_and_change_journal() {
        let mut doc = Document::new(Buffer::from_str("t", "a"));
        doc.take_changes();
        assert!(doc.insert_lines(1, &["b".to_string(), "c".to_string()]));
        assert_eq!(texts(&doc), vec!["a", "b", "c"]);
        let changes = doc.take_changes();
        assert_eq!(changes.len(), 4);
        assert!(doc.take_changes().is_empty());
        assert!(doc.is_modified());
        doc.mark_saved();
        assert!(!doc.is_modified());
    }
}
