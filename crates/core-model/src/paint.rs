//! Renderer contract and paint batching.
//!
//! Mutations never talk to the renderer directly. They record damaged line
//! ranges, the cursor to show and the mode label into a [`PaintBatch`]; the
//! batch is flushed to a [`RenderSink`] only when its outermost scope closes,
//! which happens between key events.

use crate::projector::ScreenPos;
use core_text::{BufferOperation, OperationKind, Position};
use std::ops::Range;
use tracing::trace;

/// External renderer callbacks.
pub trait RenderSink {
    /// Lines `from.line..to.line` (end exclusive; `usize::MAX` means to the
    /// end of the buffer) need repainting.
    fn request_repaint(&mut self, from: Position, to: Position);
    fn notify_cursor_moved(&mut self, screen: ScreenPos);
    fn notify_mode_changed(&mut self, label: &str);
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn request_repaint(&mut self, _from: Position, _to: Position) {}
    fn notify_cursor_moved(&mut self, _screen: ScreenPos) {}
    fn notify_mode_changed(&mut self, _label: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Repaint { from: usize, to: usize },
    CursorMoved(ScreenPos),
    ModeChanged(String),
}

/// Sink that keeps every notification, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<RenderEvent>,
}

impl RecordingSink {
    pub fn take(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }
}

impl RenderSink for RecordingSink {
    fn request_repaint(&mut self, from: Position, to: Position) {
        self.events.push(RenderEvent::Repaint {
            from: from.line,
            to: to.line,
        });
    }
    fn notify_cursor_moved(&mut self, screen: ScreenPos) {
        self.events.push(RenderEvent::CursorMoved(screen));
    }
    fn notify_mode_changed(&mut self, label: &str) {
        self.events.push(RenderEvent::ModeChanged(label.to_string()));
    }
}

/// Reference-counted paint scope with accumulated damage.
#[derive(Debug, Default, Clone)]
pub struct PaintBatch {
    depth: usize,
    damage: Vec<Range<usize>>,
    cursor: Option<ScreenPos>,
    mode: Option<&'static str>,
}

impl PaintBatch {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Close one scope. Returns true when the outermost scope closed and the
    /// batch should be flushed.
    pub fn end(&mut self) -> bool {
        debug_assert!(self.depth > 0, "unbalanced paint scope");
        self.depth = self.depth.saturating_sub(1);
        self.depth == 0
    }

    /// Damage lines `[from, to)`, merging with overlapping or adjacent ranges.
    pub fn damage_lines(&mut self, from: usize, to: usize) {
        if to <= from {
            return;
        }
        let mut merged = from..to;
        self.damage.retain(|r| {
            if r.start <= merged.end && merged.start <= r.end {
                merged = merged.start.min(r.start)..merged.end.max(r.end);
                false
            } else {
                true
            }
        });
        self.damage.push(merged);
        self.damage.sort_by_key(|r| r.start);
    }

    pub fn damage_from(&mut self, from: usize) {
        self.damage_lines(from, usize::MAX);
    }

    pub fn damage_all(&mut self) {
        self.damage_from(0);
    }

    /// Damage implied by one applied buffer operation.
    pub fn damage_op(&mut self, op: &BufferOperation) {
        match op.kind {
            OperationKind::InsertText | OperationKind::DeleteText => self.damage_lines(op.line, op.line + 1),
            OperationKind::InsertLine | OperationKind::DeleteLine => self.damage_from(op.line),
        }
    }

    pub fn damaged(&self) -> &[Range<usize>] {
        &self.damage
    }

    /// Keep `screen` as the cursor to report at flush time.
    pub fn keep_cursor(&mut self, screen: ScreenPos) {
        self.cursor = Some(screen);
    }

    pub fn set_mode(&mut self, label: &'static str) {
        self.mode = Some(label);
    }

    /// Deliver accumulated notifications. Only valid outside any scope.
    pub fn flush(&mut self, sink: &mut dyn RenderSink) {
        debug_assert_eq!(self.depth, 0, "flush inside an open paint scope");
        let ranges = std::mem::take(&mut self.damage);
        for r in &ranges {
            sink.request_repaint(Position::new(r.start, 0), Position::new(r.end, 0));
        }
        if let Some(label) = self.mode.take() {
            sink.notify_mode_changed(label);
        }
        if let Some(screen) = self.cursor.take() {
            sink.notify_cursor_moved(screen);
        }
        trace!(target: "model.paint", ranges = ranges.len(), "paint_flushed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_ranges_merge() {
        let mut b = PaintBatch::default();
        b.damage_lines(5, 6);
        b.damage_lines(1, 2);
        b.damage_lines(6, 8);
        assert_eq!(b.damaged(), &[1..2, 5..8]);
        b.damage_from(7);
        assert_eq!(b.damaged(), &[1..2, 5..usize::MAX]);
    }

    #[test]
    fn nested_scopes_flush_once() {
        let mut b = PaintBatch::default();
        let mut sink = RecordingSink::default();
        b.begin();
        b.begin();
        b.damage_op(&BufferOperation::insert_text(0, 3, "x"));
        assert!(!b.end());
        b.keep_cursor(ScreenPos::new(3, 1));
        b.set_mode("INSERT");
        assert!(b.end());
        b.flush(&mut sink);
        assert_eq!(
            sink.take(),
            vec![
                RenderEvent::Repaint { from: 3, to: 4 },
                RenderEvent::ModeChanged("INSERT".into()),
                RenderEvent::CursorMoved(ScreenPos::new(3, 1)),
            ]
        );
        b.flush(&mut sink);
        assert!(sink.events.is_empty());
    }
}
