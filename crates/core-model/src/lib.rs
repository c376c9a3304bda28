//! Editor model: editing state plus the single view presenting it.
//!
//! `core-state` owns text and history; this crate owns everything derived from
//! screen geometry:
//! * [`CursorProjector`] maps buffer positions to screen positions under tab
//!   expansion, wrapping and folds.
//! * [`View`] holds the caret, the visual anchor, the scroll anchor, the kept
//!   cursor, the sticky column, the [`FoldTable`] and the [`PaintBatch`].
//! * [`RenderSink`] is the renderer contract notified when a batch flushes.
//!
//! Invariants after every public call:
//! * the caret's buffer position is inside the buffer and not hidden by a
//!   closed fold (unless every line is folded);
//! * the caret's screen position is derived from its buffer position under the
//!   options last passed to [`EditorModel::sync_view`].

use core_state::EditorState;
use core_text::Position;

pub mod fold;
pub mod paint;
pub mod projector;
pub mod view;

pub use fold::{Fold, FoldError, FoldTable};
pub use paint::{NullSink, PaintBatch, RecordingSink, RenderEvent, RenderSink};
pub use projector::{CursorProjector, ScreenPos, ViewCursor, ViewOptions};
pub use view::{StickyColumn, View, compute_scroll_intent};

pub struct EditorModel {
    state: EditorState,
    view: View,
}

impl EditorModel {
    pub fn new(state: EditorState) -> Self {
        Self {
            state,
            view: View::new(),
        }
    }

    /// Model with a prepared view (caret, folds) injected.
    pub fn with_view(view: View, state: EditorState) -> Self {
        Self { state, view }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// Disjoint mutable access to the state and the view.
    pub fn split(&mut self) -> (&mut EditorState, &mut View) {
        (&mut self.state, &mut self.view)
    }

    pub fn caret(&self) -> Position {
        self.view.caret_pos()
    }

    /// Whether the current mode lets the caret sit past the last character.
    pub fn edit_capable(&self) -> bool {
        self.state.mode().is_edit_mode()
    }

    /// Feed journaled buffer operations to folds, marks and the paint batch.
    pub fn absorb_changes(&mut self) -> usize {
        let ops = self.state.document.take_changes();
        for op in &ops {
            self.state.marks.apply_line_change(op);
        }
        self.view.apply_changes(&ops);
        ops.len()
    }

    /// Bring the view in line with the buffer after a command: absorb changes,
    /// clamp and re-project the caret, scroll, and keep the caret for the next
    /// flush.
    pub fn sync_view(&mut self, opts: ViewOptions, margin: usize) {
        self.absorb_changes();
        let edit = self.edit_capable();
        let (state, view) = self.split();
        let buffer = state.document.buffer();
        view.folds.clamp_to(buffer.line_count());
        view.resync(buffer, opts, edit);
        view.scroll_to_caret(buffer, opts, margin);
        let screen = view.caret.screen;
        let first = view.first_row();
        view.paint
            .keep_cursor(ScreenPos::new(screen.line.saturating_sub(first), screen.col));
        view.kept = Some(view.caret);
    }
}
