//! Dispatcher applying one [`Action`] to the model for the current mode.
//!
//! Sub-modules:
//! * `motion`     - motion evaluation shared by cursor movement and operators
//! * `operator`   - operator regions and their application (d c y > < zf)
//! * `edit`       - normal mode edits (x X p P J ~ r <CTRL>a ...)
//! * `mode`       - mode stack transitions and their enter/leave hooks
//! * `visual`     - selection extension and selection operators
//! * `insert`     - Insert / Replace mode keys
//! * `completion` - keyword completion cycling
//! * `command`    - command-line editing and Ex execution
//! * `command_parser` - Ex grammar
//! * `search`     - regex search shared by `/`, `?`, `n`, `N` and Ex addresses
//! * `fold`       - `z` fold commands
//! * `undo`       - undo / redo
//!
//! Every handler receives a [`Cx`]: disjoint `&mut` borrows of the editor
//! state, the view and the session plus the read-only [`Env`]. Nothing here
//! talks to the renderer; damage and mode labels go to the view's paint batch.

use crate::macros::MacroRequest;
use crate::{Action, CommandKind, Env, MapModes, ParsedAction, ParsedCommand, UserMapping};
use core_events::KeyEvent;
use core_model::View;
use core_state::{EditorState, Mode};
use core_text::{Buffer, Position};
use std::path::PathBuf;
use tracing::debug;

mod command;
pub mod command_parser;
mod completion;
mod edit;
mod fold;
mod insert;
pub(crate) mod mode;
mod motion;
mod operator;
mod search;
mod undo;
mod visual;

pub use command_parser::ExError;
pub use completion::Completion;

/// Result of dispatching a single `Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchResult {
    pub dirty: bool,
    pub quit: bool,
}

impl DispatchResult {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            quit: false,
        }
    }
    pub fn clean() -> Self {
        Self {
            dirty: false,
            quit: false,
        }
    }
    pub fn quit() -> Self {
        Self {
            dirty: true,
            quit: true,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            dirty: self.dirty || other.dirty,
            quit: self.quit || other.quit,
        }
    }

    fn from_changed(changed: bool) -> Self {
        if changed { Self::dirty() } else { Self::clean() }
    }
}

/// Ex command work that needs the key translator or the file backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorRequest {
    Map(UserMapping),
    Unmap { modes: MapModes, lhs: Vec<KeyEvent> },
    Write { path: PathBuf, quit: bool },
}

/// Dispatcher-side state that outlives a single action.
#[derive(Debug, Default)]
pub struct Session {
    pub completion: Option<Completion>,
    /// Macro work for the editor to pick up once the action returns.
    pub macro_request: Option<MacroRequest>,
    pub request: Option<EditorRequest>,
}

/// Editing context handed to every handler.
pub struct Cx<'a> {
    pub state: &'a mut EditorState,
    pub view: &'a mut View,
    pub env: &'a Env,
    pub session: &'a mut Session,
}

impl Cx<'_> {
    pub fn buffer(&self) -> &Buffer {
        self.state.document.buffer()
    }

    pub fn caret(&self) -> Position {
        self.view.caret_pos()
    }

    /// Whether the current mode allows the caret past the last character.
    pub fn edit(&self) -> bool {
        self.state.mode().is_edit_mode()
    }

    /// Move the caret and make its column the new sticky column.
    pub fn set_caret(&mut self, pos: Position) {
        let edit = self.edit();
        self.view
            .set_caret(self.state.document.buffer(), self.env.opts, edit, pos);
    }

    /// Move the caret keeping the sticky column.
    pub fn place_caret(&mut self, pos: Position) {
        let edit = self.edit();
        self.view
            .place_caret(self.state.document.buffer(), self.env.opts, edit, pos);
    }

    /// Caret to the first non-blank of `line`.
    pub fn caret_to_line(&mut self, line: usize) {
        let line = line.min(self.buffer().last_line());
        let col = core_text::motion::first_non_blank(self.buffer(), line);
        self.set_caret(Position::new(line, col));
    }

    pub fn report(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(target: "actions.dispatch", %msg, "status");
        self.state.report(msg);
    }
}

/// Apply an action in the current mode.
pub fn dispatch(action: Action, cx: &mut Cx<'_>) -> DispatchResult {
    let mode = cx.state.mode();
    match (mode, action) {
        (Mode::Normal, Action::Command(cmd)) => normal(cmd, cx),
        (Mode::Visual | Mode::VisualLine, Action::Command(cmd)) => visual::handle(cmd, cx),
        (Mode::Insert | Mode::Replace, Action::Key(key)) => insert::handle_key(key, cx),
        (Mode::Completion, Action::Key(key)) => completion::handle_key(key, cx),
        (m, Action::Key(key)) if m.is_command_line() => command::handle_key(key, cx),
        (Mode::Intro, Action::Key(_)) => {
            mode::change(cx, Mode::Normal);
            DispatchResult::dirty()
        }
        (mode, action) => {
            debug!(target: "actions.dispatch", mode = mode.label(), ?action, "action_ignored");
            DispatchResult::clean()
        }
    }
}

fn normal(cmd: ParsedCommand, cx: &mut Cx<'_>) -> DispatchResult {
    let ParsedCommand {
        register,
        count,
        action,
    } = cmd;
    match action {
        ParsedAction::Motion { motion, arg } => motion::handle(cx, motion, count, arg),
        ParsedAction::Operator {
            op: CommandKind::Operator(op),
            motion,
            motion_arg,
        } => operator::with_motion(cx, op, motion, motion_arg, count, register),
        ParsedAction::Linewise {
            op: CommandKind::Operator(op),
        } => operator::linewise(cx, op, count.unwrap_or(1) as usize, register),
        ParsedAction::Command { command, arg } => normal_command(cx, command, arg, count, register),
        other => {
            debug!(target: "actions.dispatch", ?other, "malformed_command");
            DispatchResult::clean()
        }
    }
}

fn normal_command(
    cx: &mut Cx<'_>,
    command: CommandKind,
    arg: Option<char>,
    count: Option<u32>,
    register: Option<char>,
) -> DispatchResult {
    use crate::{MotionKind as M, OperatorKind as Op};
    let n = count.unwrap_or(1) as usize;
    debug!(target: "actions.dispatch", ?command, n, "normal_command");
    match command {
        CommandKind::DeleteChar => edit::delete_under(cx, n, register),
        CommandKind::DeleteCharBefore => edit::delete_before(cx, n, register),
        CommandKind::DeleteToEnd => operator::with_motion(cx, Op::Delete, M::LineEnd, None, count, register),
        CommandKind::ChangeToEnd => operator::with_motion(cx, Op::Change, M::LineEnd, None, count, register),
        CommandKind::YankLine => operator::linewise(cx, Op::Yank, n, register),
        CommandKind::SubstituteChar => edit::substitute_chars(cx, n, register),
        CommandKind::SubstituteLine => operator::linewise(cx, Op::Change, n, register),
        CommandKind::PutAfter => edit::put(cx, true, n, register),
        CommandKind::PutBefore => edit::put(cx, false, n, register),
        CommandKind::Undo => undo::undo(cx, n),
        CommandKind::Redo => undo::redo(cx, n),
        CommandKind::Join => {
            let line = cx.caret().line;
            DispatchResult::from_changed(edit::join(cx, line, n.max(2)))
        }
        CommandKind::ToggleCase => edit::toggle_case(cx, n),
        CommandKind::ReplaceChar => match arg {
            Some(c) => edit::replace_chars(cx, c, n),
            None => DispatchResult::clean(),
        },
        CommandKind::Insert
        | CommandKind::Append
        | CommandKind::InsertAtStart
        | CommandKind::AppendAtEnd
        | CommandKind::OpenBelow
        | CommandKind::OpenAbove
        | CommandKind::ReplaceMode => mode::begin_insert(cx, command),
        CommandKind::Visual => mode::push(cx, Mode::Visual),
        CommandKind::VisualLine => mode::push(cx, Mode::VisualLine),
        CommandKind::ExLine => {
            mode::push(cx, Mode::Ex);
            if n > 1 {
                cx.state.command_line.begin_with(':', &format!(".,.+{}", n - 1));
            }
            DispatchResult::dirty()
        }
        CommandKind::SearchForward => mode::push(cx, Mode::Search),
        CommandKind::SearchBackward => mode::push(cx, Mode::SearchBackward),
        CommandKind::SetMark => {
            let caret = cx.caret();
            match arg {
                Some(c) if cx.state.marks.set(c, caret) => DispatchResult::clean(),
                Some(c) => {
                    cx.report(format!("Invalid mark name: {c}"));
                    DispatchResult::dirty()
                }
                None => DispatchResult::clean(),
            }
        }
        CommandKind::Record => {
            if let Some(c) = arg {
                cx.session.macro_request = Some(MacroRequest::Record(c));
            }
            DispatchResult::dirty()
        }
        CommandKind::Replay => {
            if let Some(c) = arg {
                cx.session.macro_request = Some(MacroRequest::Replay {
                    register: c,
                    count: n,
                });
            }
            DispatchResult::clean()
        }
        CommandKind::Increment => edit::increment(cx, n as i64),
        CommandKind::Decrement => edit::increment(cx, -(n as i64)),
        CommandKind::FoldOpen
        | CommandKind::FoldClose
        | CommandKind::FoldToggle
        | CommandKind::FoldDelete
        | CommandKind::FoldEliminate
        | CommandKind::FoldOpenAll
        | CommandKind::FoldCloseAll => fold::handle(cx, command),
        CommandKind::Repaint => {
            cx.view.paint.damage_all();
            DispatchResult::dirty()
        }
        CommandKind::Cancel => DispatchResult::clean(),
        CommandKind::Operator(_)
        | CommandKind::LowerCase
        | CommandKind::UpperCase
        | CommandKind::SwapAnchor
        | CommandKind::Mapped(_) => {
            debug!(target: "actions.dispatch", ?command, "not_a_normal_command");
            DispatchResult::clean()
        }
    }
}
