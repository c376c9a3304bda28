//! `z` fold commands.

use super::{Cx, DispatchResult};
use crate::CommandKind;
use tracing::debug;

/// Head line of the fold a `z` command acts on: the fold containing the
/// caret, else a closed fold right above or below it.
fn target(cx: &Cx<'_>) -> Option<usize> {
    let line = cx.caret().line;
    let folds = &cx.view.folds;
    folds
        .contains(line)
        .or_else(|| line.checked_sub(1).and_then(|l| folds.is_folded(l)))
        .or_else(|| folds.is_folded(line + 1))
}

pub(crate) fn handle(cx: &mut Cx<'_>, command: CommandKind) -> DispatchResult {
    match command {
        CommandKind::FoldEliminate => cx.view.folds.clear(),
        CommandKind::FoldOpenAll => cx.view.folds.open_all(),
        CommandKind::FoldCloseAll => cx.view.folds.close_all(),
        _ => {
            let Some(head) = target(cx) else {
                cx.report("No fold found");
                return DispatchResult::dirty();
            };
            let folds = &mut cx.view.folds;
            match command {
                CommandKind::FoldOpen => {
                    folds.open(head);
                }
                CommandKind::FoldClose => {
                    folds.close(head);
                }
                CommandKind::FoldToggle => {
                    folds.toggle(head);
                }
                CommandKind::FoldDelete => {
                    folds.remove(head);
                }
                _ => {}
            }
        }
    }
    debug!(target: "model.fold", ?command, folds = cx.view.folds.len(), "fold_command");
    cx.view.paint.damage_all();
    DispatchResult::dirty()
}
