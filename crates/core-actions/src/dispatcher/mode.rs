//! Mode stack transitions.
//!
//! All pushes, pops and changes go through here so the enter/leave hooks run
//! and the new label reaches the paint batch:
//! * Insert / Replace commit the pending undo item on enter and on leave;
//!   leaving steps the caret one column left.
//! * Visual modes record the anchor on enter; leaving stores `'<` / `'>`,
//!   drops the anchor and damages the selected lines.
//! * Command-line modes start a fresh line on enter and clear it on leave.
//! * Completion drops its cycle on leave.

use super::{Cx, DispatchResult};
use crate::CommandKind;
use core_state::Mode;
use core_text::Position;
use core_text::motion::first_non_blank;

fn announce(cx: &mut Cx<'_>) {
    let label = cx.state.mode().label();
    cx.view.paint.set_mode(label);
}

fn enter(cx: &mut Cx<'_>, mode: Mode) {
    match mode {
        Mode::Insert | Mode::Replace => {
            let caret = cx.caret();
            cx.state.document.commit(caret);
        }
        Mode::Visual | Mode::VisualLine => {
            cx.view.anchor = Some(cx.view.caret);
            let line = cx.caret().line;
            cx.view.paint.damage_lines(line, line + 1);
        }
        Mode::Ex | Mode::Search | Mode::SearchBackward => {
            if let Some(prompt) = mode.prompt() {
                cx.state.command_line.begin(prompt);
            }
        }
        Mode::Intro | Mode::Normal | Mode::Completion => {}
    }
}

fn leave(cx: &mut Cx<'_>, mode: Mode) {
    match mode {
        Mode::Insert | Mode::Replace => {
            let caret = cx.caret();
            cx.state.document.commit(caret);
        }
        Mode::Visual | Mode::VisualLine => {
            if let Some((start, end)) = cx.view.selection() {
                cx.state.marks.set('<', start);
                cx.state.marks.set('>', end);
                cx.view.paint.damage_lines(start.line, end.line + 1);
            }
            cx.view.anchor = None;
        }
        Mode::Ex | Mode::Search | Mode::SearchBackward => cx.state.command_line.clear(),
        Mode::Completion => cx.session.completion = None,
        Mode::Intro | Mode::Normal => {}
    }
}

pub(crate) fn push(cx: &mut Cx<'_>, mode: Mode) -> DispatchResult {
    cx.state.modes.push(mode);
    enter(cx, mode);
    announce(cx);
    DispatchResult::dirty()
}

/// Leave the current mode. The bottom of the stack stays in place.
pub(crate) fn pop(cx: &mut Cx<'_>) -> DispatchResult {
    let current = cx.state.mode();
    if cx.state.modes.depth() <= 1 {
        return DispatchResult::clean();
    }
    leave(cx, current);
    cx.state.modes.pop();
    if matches!(current, Mode::Insert | Mode::Replace) {
        let caret = cx.caret();
        cx.set_caret(Position::new(caret.line, caret.col.saturating_sub(1)));
    } else {
        // Re-clamp for the mode underneath.
        let caret = cx.caret();
        cx.place_caret(caret);
    }
    announce(cx);
    DispatchResult::dirty()
}

/// Replace the current mode (Intro -> Normal).
pub(crate) fn change(cx: &mut Cx<'_>, mode: Mode) -> DispatchResult {
    let prev = cx.state.mode();
    leave(cx, prev);
    cx.state.modes.change(mode);
    enter(cx, mode);
    announce(cx);
    DispatchResult::dirty()
}

/// Switch between the two visual kinds keeping the anchor.
pub(crate) fn switch_visual(cx: &mut Cx<'_>, mode: Mode) -> DispatchResult {
    if let Some((start, end)) = cx.view.selection() {
        cx.view.paint.damage_lines(start.line, end.line + 1);
    }
    cx.state.modes.change(mode);
    announce(cx);
    DispatchResult::dirty()
}

/// `i a I A o O R`: enter Insert (or Replace) and place the caret.
pub(crate) fn begin_insert(cx: &mut Cx<'_>, command: CommandKind) -> DispatchResult {
    let caret = cx.caret();
    let line = caret.line;
    let mode = if command == CommandKind::ReplaceMode {
        Mode::Replace
    } else {
        Mode::Insert
    };
    // Push first so the line opened by `o` / `O` joins the insert's undo item.
    push(cx, mode);
    let len = cx.buffer().line_len(line);
    match command {
        CommandKind::Append => cx.set_caret(Position::new(line, (caret.col + 1).min(len))),
        CommandKind::InsertAtStart => {
            let col = first_non_blank(cx.buffer(), line);
            cx.set_caret(Position::new(line, col));
        }
        CommandKind::AppendAtEnd => cx.set_caret(Position::new(line, len)),
        CommandKind::OpenBelow => {
            cx.state.document.insert_new_line(len, line);
            cx.set_caret(Position::new(line + 1, 0));
        }
        CommandKind::OpenAbove => {
            cx.state.document.insert_lines(line, &[String::new()]);
            cx.set_caret(Position::new(line, 0));
        }
        _ => cx.set_caret(caret),
    }
    DispatchResult::dirty()
}
