//! Undo / redo (`u`, `<CTRL>r`, `:undo`, `:redo`).
//!
//! The document commits its pending item before stepping, so an undo right
//! after an edit inside the same action still sees that edit.

use super::{Cx, DispatchResult};
use tracing::trace;

pub(crate) fn undo(cx: &mut Cx<'_>, count: usize) -> DispatchResult {
    step(cx, count, false)
}

pub(crate) fn redo(cx: &mut Cx<'_>, count: usize) -> DispatchResult {
    step(cx, count, true)
}

fn step(cx: &mut Cx<'_>, count: usize, forward: bool) -> DispatchResult {
    let mut moved = false;
    for _ in 0..count.max(1) {
        let caret = cx.caret();
        let restored = if forward {
            cx.state.document.redo(caret)
        } else {
            cx.state.document.undo(caret)
        };
        let Some(pos) = restored else {
            if !moved {
                cx.report(if forward {
                    "Already at newest change"
                } else {
                    "Already at oldest change"
                });
                return DispatchResult::dirty();
            }
            break;
        };
        cx.set_caret(pos);
        moved = true;
    }
    trace!(target: "actions.dispatch", op = if forward { "redo" } else { "undo" }, count, "history_step");
    DispatchResult::dirty()
}
