//! Command-line modes (`:`, `/`, `?`) and Ex command execution.
//!
//! Every address of a range is resolved before the command runs; a failure
//! there aborts with a status message and leaves the buffer untouched.

use super::command_parser::{self, Address, ExCommand, ExCommandKind, ExError, LineSpec};
use super::operator::{self, Region};
use super::{Cx, DispatchResult, EditorRequest, edit, mode, search, undo};
use crate::{OperatorKind, UserMapping};
use core_events::{KeyCode, KeyEvent};
use core_state::{Mode, RegisterContent, RegisterStore};
use core_text::Position;
use std::path::PathBuf;
use tracing::{debug, info};

pub(crate) fn handle_key(key: KeyEvent, cx: &mut Cx<'_>) -> DispatchResult {
    match key.code {
        KeyCode::Esc => mode::pop(cx),
        KeyCode::Enter => {
            let current = cx.state.mode();
            let text = cx.state.command_line.submit();
            mode::pop(cx);
            match current {
                Mode::Ex => execute(cx, &text),
                Mode::Search => search::submit(cx, &text, false),
                Mode::SearchBackward => search::submit(cx, &text, true),
                _ => DispatchResult::dirty(),
            }
        }
        KeyCode::Backspace => {
            if !cx.state.command_line.backspace() {
                return mode::pop(cx);
            }
            DispatchResult::dirty()
        }
        KeyCode::Up => {
            cx.state.command_line.history_prev();
            DispatchResult::dirty()
        }
        KeyCode::Down => {
            cx.state.command_line.history_next();
            DispatchResult::dirty()
        }
        KeyCode::Tab => {
            cx.state.command_line.push_char('\t');
            DispatchResult::dirty()
        }
        _ => match key.printable() {
            Some(c) => {
                cx.state.command_line.push_char(c);
                DispatchResult::dirty()
            }
            None => DispatchResult::clean(),
        },
    }
}

/// Parse and run one Ex command line, reporting failures.
pub(crate) fn execute(cx: &mut Cx<'_>, text: &str) -> DispatchResult {
    info!(target: "actions.ex", text, "execute");
    let outcome = command_parser::parse(text).and_then(|cmd| run(cx, cmd));
    match outcome {
        Ok(result) => result,
        Err(e) => {
            debug!(target: "actions.ex", text, error = %e, "ex_failed");
            cx.report(e.to_string());
            DispatchResult::dirty()
        }
    }
}

fn resolve(cx: &mut Cx<'_>, spec: &LineSpec) -> Result<usize, ExError> {
    let last = cx.buffer().last_line();
    let base = match &spec.address {
        Address::Absolute(n) => n.saturating_sub(1),
        Address::Current => cx.caret().line,
        Address::Last => last,
        Address::Mark(c) => cx.state.marks.get(*c).ok_or(ExError::MarkNotSet(*c))?.line,
        Address::Search { pattern, backward } => {
            let pattern = if pattern.is_empty() {
                cx.state.search.pattern.clone().ok_or(ExError::NoPreviousPattern)?
            } else {
                pattern.clone()
            };
            let re = search::compile(&pattern)?;
            let line = search::find_line(cx.buffer(), &re, cx.caret().line, *backward)
                .ok_or_else(|| ExError::PatternNotFound(pattern.clone()))?;
            cx.state.search.pattern = Some(pattern);
            line
        }
    };
    let line = base
        .checked_add_signed(spec.offset)
        .ok_or(ExError::InvalidRange)?;
    if line > last {
        return Err(ExError::InvalidRange);
    }
    Ok(line)
}

/// Resolve the range to ordered `(first, last)` lines. Without a range the
/// current line is used.
fn resolve_range(cx: &mut Cx<'_>, cmd: &ExCommand) -> Result<(usize, usize), ExError> {
    let Some(range) = &cmd.range else {
        let line = cx.caret().line;
        return Ok((line, line));
    };
    let first = resolve(cx, &range.start)?;
    let last = match &range.end {
        Some(end) => resolve(cx, end)?,
        None => first,
    };
    Ok(if first <= last { (first, last) } else { (last, first) })
}

/// Translate a vi replacement into the regex crate's syntax: `&` and `\0`
/// are the whole match, `\1`..`\9` groups, `\&` a literal `&`.
fn replacement_template(rep: &str) -> String {
    let mut out = String::new();
    let mut chars = rep.chars();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => {
                    out.push_str("${");
                    out.push(d);
                    out.push('}');
                }
                Some('$') => out.push_str("$$"),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// Open or close every fold intersecting lines `first..=last`.
fn set_folds(cx: &mut Cx<'_>, first: usize, last: usize, open: bool) -> DispatchResult {
    let heads: Vec<usize> = cx
        .view
        .folds
        .iter()
        .filter(|f| f.from <= last && first < f.to)
        .map(|f| f.from)
        .collect();
    for head in heads {
        if open {
            cx.view.folds.open(head);
        } else {
            cx.view.folds.close(head);
        }
    }
    cx.view.paint.damage_all();
    DispatchResult::dirty()
}

fn run(cx: &mut Cx<'_>, cmd: ExCommand) -> Result<DispatchResult, ExError> {
    let (first, last) = resolve_range(cx, &cmd)?;
    debug!(target: "actions.ex", kind = ?cmd.kind, first, last, "resolved");
    match cmd.kind {
        ExCommandKind::Delete { register } => {
            Ok(operator::apply(cx, OperatorKind::Delete, Region::lines(first, last), register, 1))
        }
        ExCommandKind::Yank { register } => {
            let lines: Vec<String> = (first..=last)
                .filter_map(|l| cx.buffer().line_text(l).map(str::to_string))
                .collect();
            cx.state
                .registers
                .record_yank(register, RegisterContent::linewise(lines));
            Ok(DispatchResult::clean())
        }
        ExCommandKind::Substitute {
            pattern,
            replacement,
            global,
        } => {
            let pattern = if pattern.is_empty() {
                cx.state.search.pattern.clone().ok_or(ExError::NoPreviousPattern)?
            } else {
                pattern
            };
            let re = search::compile(&pattern)?;
            cx.state.search.pattern = Some(pattern.clone());
            let template = replacement_template(&replacement);
            let mut changed = None;
            for line in first..=last {
                if cx.state.document.substitute(&re, &template, global, line) {
                    changed = Some(line);
                }
            }
            let line = changed.ok_or(ExError::PatternNotFound(pattern))?;
            cx.caret_to_line(line);
            Ok(DispatchResult::dirty())
        }
        ExCommandKind::Shift { right, times } => {
            operator::shift_lines(cx, first, last, right, times);
            cx.caret_to_line(last);
            Ok(DispatchResult::dirty())
        }
        ExCommandKind::Join => {
            let count = if cmd.range.as_ref().is_some_and(|r| r.end.is_some()) {
                last - first + 1
            } else {
                2
            };
            Ok(DispatchResult::from_changed(edit::join(cx, first, count)))
        }
        ExCommandKind::Fold => {
            cx.view.folds.create(first, last + 1)?;
            cx.view.paint.damage_all();
            Ok(DispatchResult::dirty())
        }
        ExCommandKind::FoldOpen => Ok(set_folds(cx, first, last, true)),
        ExCommandKind::FoldClose => Ok(set_folds(cx, first, last, false)),
        ExCommandKind::Undo => Ok(undo::undo(cx, 1)),
        ExCommandKind::Redo => Ok(undo::redo(cx, 1)),
        ExCommandKind::Mark(c) => {
            if !cx.state.marks.set(c, Position::new(last, 0)) {
                return Err(ExError::InvalidMark(c));
            }
            Ok(DispatchResult::clean())
        }
        ExCommandKind::Quit { force } => {
            if !force && cx.state.document.is_modified() {
                return Err(ExError::Modified);
            }
            info!(target: "actions.ex", force, "quit");
            Ok(DispatchResult::quit())
        }
        ExCommandKind::Write {
            path,
            quit,
            only_if_modified,
        } => {
            if only_if_modified && path.is_none() && !cx.state.document.is_modified() {
                info!(target: "actions.ex", "exit_unmodified");
                return Ok(if quit { DispatchResult::quit() } else { DispatchResult::clean() });
            }
            let path = path
                .map(PathBuf::from)
                .or_else(|| cx.state.file_name.clone())
                .ok_or(ExError::NoFileName)?;
            cx.session.request = Some(EditorRequest::Write { path, quit });
            Ok(DispatchResult::dirty())
        }
        ExCommandKind::Map {
            modes,
            lhs,
            rhs,
            noremap,
        } => {
            cx.session.request = Some(EditorRequest::Map(UserMapping {
                modes,
                lhs,
                rhs,
                noremap,
            }));
            Ok(DispatchResult::clean())
        }
        ExCommandKind::Unmap { modes, lhs } => {
            cx.session.request = Some(EditorRequest::Unmap { modes, lhs });
            Ok(DispatchResult::clean())
        }
        ExCommandKind::Visual => Ok(DispatchResult::clean()),
        ExCommandKind::Goto => {
            if cmd.range.is_some() {
                cx.state.marks.set('\'', cx.caret());
                cx.caret_to_line(last);
            }
            Ok(DispatchResult::dirty())
        }
    }
}
