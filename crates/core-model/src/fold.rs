//! Collapsible line ranges.
//!
//! Folds are keyed by their head line and never overlap. A closed fold hides
//! every line of `[from, to)` from caret navigation and is drawn as a single
//! marker row.

use core_text::{BufferOperation, OperationKind};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fold {
    pub from: usize,
    pub to: usize,
    pub closed: bool,
}

impl Fold {
    pub fn contains(&self, line: usize) -> bool {
        self.from <= line && line < self.to
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FoldError {
    #[error("empty fold range {0}..{1}")]
    Empty(usize, usize),
    #[error("fold {from}..{to} overlaps the fold at line {head}")]
    Overlap { from: usize, to: usize, head: usize },
}

#[derive(Debug, Default, Clone)]
pub struct FoldTable {
    folds: BTreeMap<usize, Fold>,
}

impl FoldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fold> {
        self.folds.values()
    }

    /// Register a closed fold over `[from, to)`.
    pub fn create(&mut self, from: usize, to: usize) -> Result<(), FoldError> {
        if to <= from {
            return Err(FoldError::Empty(from, to));
        }
        if let Some(head) = self
            .folds
            .values()
            .find(|f| f.from < to && from < f.to)
            .map(|f| f.from)
        {
            return Err(FoldError::Overlap { from, to, head });
        }
        self.folds.insert(from, Fold { from, to, closed: true });
        debug!(target: "model.fold", from, to, "fold_created");
        Ok(())
    }

    pub fn is_head(&self, line: usize) -> bool {
        self.folds.contains_key(&line)
    }

    /// Fold record covering `line`, open or closed.
    pub fn fold_at(&self, line: usize) -> Option<&Fold> {
        self.folds
            .range(..=line)
            .next_back()
            .map(|(_, f)| f)
            .filter(|f| f.contains(line))
    }

    /// Head line of the fold covering `line`, if any.
    pub fn contains(&self, line: usize) -> Option<usize> {
        self.fold_at(line).map(|f| f.from)
    }

    /// Head line of the closed fold covering `line`, if any.
    pub fn is_folded(&self, line: usize) -> Option<usize> {
        self.fold_at(line).filter(|f| f.closed).map(|f| f.from)
    }

    /// First line after the closed fold covering `line`, or `line` itself.
    pub fn line_after_fold(&self, line: usize) -> usize {
        match self.fold_at(line) {
            Some(f) if f.closed => f.to,
            _ => line,
        }
    }

    /// Head of the closed fold covering `line`, or `line` itself.
    pub fn line_heading_fold(&self, line: usize) -> usize {
        self.is_folded(line).unwrap_or(line)
    }

    fn with_fold(&mut self, line: usize, f: impl FnOnce(&mut Fold)) -> bool {
        let Some(head) = self.contains(line) else {
            return false;
        };
        match self.folds.get_mut(&head) {
            Some(fold) => {
                f(fold);
                trace!(target: "model.fold", head, closed = fold.closed, "fold_state");
                true
            }
            None => false,
        }
    }

    pub fn open(&mut self, line: usize) -> bool {
        self.with_fold(line, |f| f.closed = false)
    }

    pub fn close(&mut self, line: usize) -> bool {
        self.with_fold(line, |f| f.closed = true)
    }

    pub fn toggle(&mut self, line: usize) -> bool {
        self.with_fold(line, |f| f.closed = !f.closed)
    }

    pub fn remove(&mut self, line: usize) -> Option<Fold> {
        let head = self.contains(line)?;
        self.folds.remove(&head)
    }

    pub fn clear(&mut self) {
        self.folds.clear();
    }

    pub fn open_all(&mut self) {
        self.folds.values_mut().for_each(|f| f.closed = false);
    }

    pub fn close_all(&mut self) {
        self.folds.values_mut().for_each(|f| f.closed = true);
    }

    /// Drop folds starting past the end of the buffer and trim the rest.
    pub fn clamp_to(&mut self, line_count: usize) {
        self.folds.retain(|&from, _| from < line_count);
        for f in self.folds.values_mut() {
            f.to = f.to.min(line_count);
        }
        self.folds.retain(|_, f| !f.is_empty());
    }

    /// Shift folds for a line inserted or removed by a buffer operation.
    pub fn apply_line_change(&mut self, op: &BufferOperation) {
        let at = op.line;
        let shifted: Vec<Fold> = match op.kind {
            OperationKind::InsertLine => self
                .folds
                .values()
                .map(|&f| {
                    if f.from >= at {
                        Fold { from: f.from + 1, to: f.to + 1, ..f }
                    } else if at < f.to {
                        Fold { to: f.to + 1, ..f }
                    } else {
                        f
                    }
                })
                .collect(),
            OperationKind::DeleteLine => self
                .folds
                .values()
                .map(|&f| {
                    if f.from > at {
                        Fold { from: f.from - 1, to: f.to - 1, ..f }
                    } else if at < f.to {
                        Fold { to: f.to - 1, ..f }
                    } else {
                        f
                    }
                })
                .filter(|f| {
                    if f.is_empty() {
                        debug!(target: "model.fold", head = f.from, "fold_dropped");
                    }
                    !f.is_empty()
                })
                .collect(),
            _ => return,
        };
        self.folds = shifted.into_iter().map(|f| (f.from, f)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_empty_and_overlap() {
        let mut t = FoldTable::new();
        assert_eq!(t.create(3, 3), Err(FoldError::Empty(3, 3)));
        t.create(3, 7).unwrap();
        assert!(matches!(t.create(6, 9), Err(FoldError::Overlap { head: 3, .. })));
        assert!(matches!(t.create(0, 4), Err(FoldError::Overlap { head: 3, .. })));
        t.create(7, 9).unwrap();
        t.create(0, 3).unwrap();
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn point_queries() {
        let mut t = FoldTable::new();
        t.create(3, 7).unwrap();
        assert!(t.is_head(3));
        assert!(!t.is_head(4));
        assert_eq!(t.contains(6), Some(3));
        assert_eq!(t.contains(7), None);
        assert_eq!(t.is_folded(5), Some(3));
        assert_eq!(t.line_after_fold(4), 7);
        assert_eq!(t.line_heading_fold(4), 3);
        assert_eq!(t.line_after_fold(2), 2);
        t.open(5);
        assert_eq!(t.is_folded(5), None);
        assert_eq!(t.contains(5), Some(3));
        assert_eq!(t.line_after_fold(4), 4);
        assert!(t.toggle(3));
        assert_eq!(t.is_folded(3), Some(3));
    }

    #[test]
    fn folds_follow_line_changes() {
        let mut t = FoldTable::new();
        t.create(3, 5).unwrap();
        t.apply_line_change(&BufferOperation::insert_line(0));
        assert_eq!(t.fold_at(4).map(|f| (f.from, f.to)), Some((4, 6)));
        t.apply_line_change(&BufferOperation::insert_line(5));
        assert_eq!(t.fold_at(4).map(|f| (f.from, f.to)), Some((4, 7)));
        t.apply_line_change(&BufferOperation::delete_line(4));
        t.apply_line_change(&BufferOperation::delete_line(4));
        assert_eq!(t.fold_at(4).map(|f| (f.from, f.to)), Some((4, 5)));
        t.apply_line_change(&BufferOperation::delete_line(4));
        assert!(t.is_empty());
    }

    #[test]
    fn bulk_operations() {
        let mut t = FoldTable::new();
        t.create(0, 2).unwrap();
        t.create(4, 9).unwrap();
        t.open_all();
        assert!(t.iter().all(|f| !f.closed));
        t.close_all();
        assert!(t.iter().all(|f| f.closed));
        t.clamp_to(6);
        assert_eq!(t.fold_at(5).map(|f| f.to), Some(6));
        assert!(t.remove(1).is_some());
        assert_eq!(t.len(), 1);
        t.clear();
        assert!(t.is_empty());
    }
}
