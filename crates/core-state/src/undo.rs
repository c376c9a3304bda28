use core_text::{BufferOperation, Position};
use tracing::{debug, trace};

/// Default number of committed items retained in undo history.
pub const UNDO_HISTORY_MAX: usize = 1000;

/// One atomically undoable group of buffer operations plus the caret before
/// and after the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoItem {
    pub operations: Vec<BufferOperation>,
    pub start: Position,
    pub end: Position,
}

impl UndoItem {
    fn starting_at(start: Position) -> Self {
        Self {
            operations: Vec::new(),
            start,
            end: start,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Whether mutations are being recorded or are replays of recorded history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    Recording,
    Replaying,
}

/// Linear undo history: committed items, the current index, and the pending
/// item accumulating operations until the next command boundary.
///
/// Invariant: `index <= items.len()`. Undo is legal iff `index > 0`, redo iff
/// `index < items.len()`.
#[derive(Debug, Clone)]
pub struct UndoLog {
    items: Vec<UndoItem>,
    index: usize,
    pending: UndoItem,
    state: ReplayState,
    limit: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoLog {
    pub fn new() -> Self {
        Self::with_limit(UNDO_HISTORY_MAX)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            index: 0,
            pending: UndoItem::default(),
            state: ReplayState::Recording,
            limit: limit.max(1),
        }
    }

    pub fn may_undo(&self) -> bool {
        self.index > 0
    }
    pub fn may_redo(&self) -> bool {
        self.index < self.items.len()
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn items(&self) -> &[UndoItem] {
        &self.items
    }
    pub fn pending(&self) -> &UndoItem {
        &self.pending
    }
    pub fn state(&self) -> ReplayState {
        self.state
    }
    pub fn is_replaying(&self) -> bool {
        self.state == ReplayState::Replaying
    }

    /// Seal the pending item with `cursor_after` and append it at the current
    /// index, discarding any redo tail. An empty pending item only has its
    /// start cursor refreshed, so repeated commits never create empty entries.
    pub fn commit_undo_item(&mut self, cursor_after: Position) {
        if self.is_replaying() {
            return;
        }
        if self.pending.is_empty() {
            self.pending.start = cursor_after;
            self.pending.end = cursor_after;
            return;
        }
        self.items.truncate(self.index);
        let mut item = std::mem::replace(&mut self.pending, UndoItem::starting_at(cursor_after));
        item.end = cursor_after;
        let ops = item.operations.len();
        self.items.push(item);
        if self.items.len() > self.limit {
            self.items.remove(0);
            trace!(target: "state.undo", "undo_history_trimmed");
        }
        self.index = self.items.len();
        debug!(target: "state.undo", index = self.index, ops, "commit_undo_item");
    }

    /// Append `op` to the pending item. A new edit invalidates the redo tail.
    pub fn record_operation(&mut self, op: BufferOperation) {
        if self.is_replaying() {
            return;
        }
        if self.items.len() > self.index {
            trace!(target: "state.undo", dropped = self.items.len() - self.index, "redo_tail_discarded");
            self.items.truncate(self.index);
        }
        self.pending.operations.push(op);
    }

    /// Operations that undo the item before the index, in replay order (reverse,
    /// each inverted). Moves the index back. `None` when nothing can be undone.
    pub(crate) fn step_back(&mut self) -> Option<(Vec<BufferOperation>, Position)> {
        if !self.may_undo() {
            return None;
        }
        self.index -= 1;
        let item = &self.items[self.index];
        let ops = item.operations.iter().rev().map(BufferOperation::inverse).collect();
        trace!(target: "state.undo", index = self.index, "undo_step");
        Some((ops, item.start))
    }

    /// Operations that redo the item at the index, in original order. Moves the
    /// index forward. `None` when nothing can be redone.
    pub(crate) fn step_forward(&mut self) -> Option<(Vec<BufferOperation>, Position)> {
        if !self.may_redo() {
            return None;
        }
        let item = &self.items[self.index];
        let ops = item.operations.clone();
        let end = item.end;
        self.index += 1;
        trace!(target: "state.undo", index = self.index, "redo_step");
        Some((ops, end))
    }

    pub(crate) fn set_state(&mut self, state: ReplayState) -> ReplayState {
        std::mem::replace(&mut self.state, state)
    }
}
