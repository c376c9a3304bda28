//! Visual and VisualLine modes.
//!
//! Motions extend the selection; commands act on it and leave the mode first,
//! so `'<` / `'>` are stored before the text changes.

use super::edit::{self, CaseMap};
use super::operator::{self, Region};
use super::{Cx, DispatchResult, mode, motion};
use crate::{CommandKind, ParsedAction, ParsedCommand};
use core_state::Mode;
use core_text::Position;
use tracing::debug;

/// Selection bounds as an operator region.
fn region(cx: &Cx<'_>) -> Option<Region> {
    let (start, end) = cx.view.selection()?;
    Some(if cx.state.mode() == Mode::VisualLine {
        Region::lines(start.line, end.line)
    } else {
        Region::chars(start, Position::new(end.line, end.col + 1))
    })
}

/// Operator span of a charwise selection: one that ends on or past the last
/// character of a line takes the line break too.
fn operator_region(cx: &Cx<'_>, r: Region) -> Region {
    let last = Position::new(r.end.line, r.end.col.saturating_sub(1));
    if r.linewise || last.col < cx.buffer().line_len(last.line) || last.line + 1 >= cx.buffer().line_count() {
        return r;
    }
    Region::chars(r.start, Position::new(last.line + 1, 0))
}

pub(crate) fn handle(cmd: ParsedCommand, cx: &mut Cx<'_>) -> DispatchResult {
    let ParsedCommand {
        register,
        count,
        action,
    } = cmd;
    let n = count.unwrap_or(1).max(1) as usize;
    let command = match action {
        ParsedAction::Motion { motion, arg } => return motion::handle(cx, motion, count, arg),
        ParsedAction::Command { command, .. } => command,
        other => {
            debug!(target: "actions.dispatch", ?other, "malformed_visual_command");
            return DispatchResult::clean();
        }
    };
    let Some(selected) = region(cx) else {
        return mode::pop(cx);
    };
    let current = cx.state.mode();
    match command {
        CommandKind::Operator(op) => {
            let span = operator_region(cx, selected);
            mode::pop(cx);
            operator::apply(cx, op, span, register, n)
        }
        CommandKind::Join => {
            mode::pop(cx);
            let first = selected.start.line;
            let lines = (selected.end.line - first + 1).max(2);
            edit::join(cx, first, lines);
            DispatchResult::dirty()
        }
        CommandKind::ToggleCase | CommandKind::LowerCase | CommandKind::UpperCase => {
            let case = match command {
                CommandKind::LowerCase => CaseMap::Lower,
                CommandKind::UpperCase => CaseMap::Upper,
                _ => CaseMap::Toggle,
            };
            mode::pop(cx);
            for line in selected.start.line..=selected.end.line {
                let (from, to) = if selected.linewise {
                    (0, usize::MAX)
                } else {
                    let from = if line == selected.start.line { selected.start.col } else { 0 };
                    let to = if line == selected.end.line {
                        selected.end.col
                    } else {
                        usize::MAX
                    };
                    (from, to)
                };
                edit::map_case(cx, line, from, to, case);
            }
            let start = if selected.linewise {
                Position::new(selected.start.line, cx.caret().col)
            } else {
                selected.start
            };
            cx.set_caret(start);
            DispatchResult::dirty()
        }
        CommandKind::SwapAnchor => {
            cx.view.swap_anchor();
            cx.view
                .paint
                .damage_lines(selected.start.line, selected.end.line + 1);
            DispatchResult::dirty()
        }
        CommandKind::ExLine => {
            mode::pop(cx);
            mode::push(cx, Mode::Ex);
            cx.state.command_line.begin_with(':', "'<,'>");
            DispatchResult::dirty()
        }
        CommandKind::Visual | CommandKind::VisualLine => {
            let wanted = if command == CommandKind::Visual {
                Mode::Visual
            } else {
                Mode::VisualLine
            };
            if wanted == current {
                mode::pop(cx)
            } else {
                mode::switch_visual(cx, wanted)
            }
        }
        CommandKind::Repaint => {
            cx.view.paint.damage_all();
            DispatchResult::dirty()
        }
        CommandKind::Cancel => mode::pop(cx),
        other => {
            debug!(target: "actions.dispatch", ?other, "not_a_visual_command");
            DispatchResult::clean()
        }
    }
}
