//! Operators: `d c y > < zf` over a motion, a doubled key or a selection.
//!
//! A motion is turned into a [`Region`] following vi's adjustments:
//! * an inclusive motion takes the character under its end;
//! * `w` that crosses a line break stops at the end of the previous line;
//! * an exclusive motion ending in column 0 ends on the previous line, and
//!   becomes linewise when it also started at or before the first non-blank.

use super::motion::{self, Span};
use super::{Cx, DispatchResult, mode};
use crate::{MotionKind, OperatorKind};
use core_state::{Mode, RegisterContent, RegisterStore};
use core_text::motion::{CharClass, class_of, first_non_blank, word_end};
use core_text::{Buffer, Position};
use tracing::debug;

/// Text an operator works on. Charwise regions are `[start, end)`; linewise
/// regions cover lines `start.line..=end.line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub start: Position,
    pub end: Position,
    pub linewise: bool,
}

impl Region {
    pub fn lines(first: usize, last: usize) -> Self {
        Self {
            start: Position::new(first, 0),
            end: Position::new(last, 0),
            linewise: true,
        }
    }

    pub fn chars(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            linewise: false,
        }
    }
}

fn ordered(a: Position, b: Position) -> (Position, Position) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Whether `pos` starts a word (or holds a blank, which `w` never stops on
/// except at the end of the buffer).
fn starts_word(buf: &Buffer, pos: Position, big: bool) -> bool {
    let chars: Vec<char> = buf.line_text(pos.line).unwrap_or_default().chars().collect();
    let Some(&c) = chars.get(pos.col) else {
        return true;
    };
    let class = class_of(c, big);
    if class == CharClass::Blank {
        return false;
    }
    pos.col == 0 || class_of(chars[pos.col - 1], big) != class
}

fn region_for(buf: &Buffer, caret: Position, target: Position, span: Span, kind: MotionKind) -> Region {
    match span {
        Span::Linewise => {
            let (s, e) = ordered(caret, target);
            Region::lines(s.line, e.line)
        }
        Span::Inclusive => {
            let (s, e) = ordered(caret, target);
            Region::chars(s, Position::new(e.line, e.col + 1))
        }
        Span::Exclusive => {
            let (s, mut e) = ordered(caret, target);
            let word_forward = matches!(kind, MotionKind::WordForward | MotionKind::BigWordForward);
            if word_forward {
                let big = kind == MotionKind::BigWordForward;
                if e.line > s.line {
                    let line = e.line - 1;
                    e = Position::new(line, buf.line_len(line));
                } else if e.line == buf.last_line() && !starts_word(buf, e, big) {
                    // `w` stopped on the last character of the buffer.
                    e.col = buf.line_len(e.line);
                }
            }
            if e.col == 0 && e.line > s.line {
                if s.col <= first_non_blank(buf, s.line) {
                    return Region::lines(s.line, e.line - 1);
                }
                let line = e.line - 1;
                e = Position::new(line, buf.line_len(line));
            }
            Region::chars(s, e)
        }
    }
}

/// `cw` on a non-blank changes to the end of the word, like `ce`, but stays
/// on a word's last character instead of jumping to the next word.
fn change_word_target(buf: &Buffer, caret: Position, count: usize, big: bool) -> Option<Position> {
    let chars: Vec<char> = buf.line_text(caret.line).unwrap_or_default().chars().collect();
    let c = *chars.get(caret.col)?;
    if class_of(c, big) == CharClass::Blank {
        return None;
    }
    let mut pos = caret;
    for i in 0..count {
        let at_end = chars
            .get(pos.col + 1)
            .is_none_or(|&next| class_of(next, big) != class_of(c, big));
        if i == 0 && pos.line == caret.line && at_end {
            continue;
        }
        word_end(buf, &mut pos, big);
    }
    Some(pos)
}

/// `{op}{motion}`.
pub(crate) fn with_motion(
    cx: &mut Cx<'_>,
    op: OperatorKind,
    kind: MotionKind,
    arg: Option<char>,
    count: Option<u32>,
    register: Option<char>,
) -> DispatchResult {
    let caret = cx.caret();
    let n = count.unwrap_or(1).max(1) as usize;
    if op == OperatorKind::Change
        && matches!(kind, MotionKind::WordForward | MotionKind::BigWordForward)
        && let Some(target) =
            change_word_target(cx.buffer(), caret, n, kind == MotionKind::BigWordForward)
    {
        let region = Region::chars(caret, Position::new(target.line, target.col + 1));
        return apply(cx, op, region, register, 1);
    }
    let Some(m) = motion::evaluate(cx, kind, count, arg, true) else {
        debug!(target: "actions.dispatch", ?op, ?kind, "operator_motion_failed");
        return DispatchResult::clean();
    };
    let region = region_for(cx.buffer(), caret, m.target, m.span, kind);
    apply(cx, op, region, register, 1)
}

/// Doubled operator (`dd`, `yy`, `cc`, `>>`): `count` lines from the caret.
pub(crate) fn linewise(cx: &mut Cx<'_>, op: OperatorKind, count: usize, register: Option<char>) -> DispatchResult {
    let first = cx.caret().line;
    let last = (first + count.max(1) - 1).min(cx.buffer().last_line());
    apply(cx, op, Region::lines(first, last), register, 1)
}

/// Text of a charwise region, lines joined by `\n`.
pub(crate) fn region_text(buf: &Buffer, start: Position, end: Position) -> String {
    let mut out = String::new();
    for line in start.line..=end.line.min(buf.last_line()) {
        let text = buf.line_text(line).unwrap_or_default();
        let from = if line == start.line { start.col } else { 0 };
        let to = if line == end.line { end.col } else { usize::MAX };
        if line > start.line {
            out.push('\n');
        }
        out.extend(text.chars().skip(from).take(to.saturating_sub(from)));
    }
    out
}

fn line_texts(buf: &Buffer, first: usize, last: usize) -> Vec<String> {
    (first..=last)
        .filter_map(|l| buf.line_text(l).map(str::to_string))
        .collect()
}

/// Apply `op` to `region`. `times` repeats shifts (visual `3>`).
pub(crate) fn apply(
    cx: &mut Cx<'_>,
    op: OperatorKind,
    region: Region,
    register: Option<char>,
    times: usize,
) -> DispatchResult {
    debug!(target: "actions.dispatch", ?op, ?region, "operator");
    let first = region.start.line;
    let last = region.end.line.min(cx.buffer().last_line());
    match op {
        OperatorKind::Delete => {
            if region.linewise {
                let state = &mut *cx.state;
                state
                    .document
                    .delete_line(first, last - first + 1, &mut state.registers, register);
                cx.caret_to_line(first);
            } else {
                let removed = cx.state.document.delete_range(region.start, region.end);
                if !removed.is_empty() {
                    cx.state
                        .registers
                        .record_delete(register, RegisterContent::charwise(&removed));
                }
                cx.set_caret(region.start);
            }
        }
        OperatorKind::Yank => {
            let content = if region.linewise {
                RegisterContent::linewise(line_texts(cx.buffer(), first, last))
            } else {
                RegisterContent::charwise(&region_text(cx.buffer(), region.start, region.end))
            };
            cx.state.registers.record_yank(register, content);
            if region.linewise {
                if cx.caret().line != first {
                    let (buf, opts) = (cx.state.document.buffer(), cx.env.opts);
                    cx.view.goto_line_sticky(buf, opts, false, first);
                }
            } else {
                cx.set_caret(region.start);
            }
            return DispatchResult::clean();
        }
        OperatorKind::Change => {
            mode::push(cx, Mode::Insert);
            if region.linewise {
                let lines = line_texts(cx.buffer(), first, last);
                cx.state
                    .registers
                    .record_delete(register, RegisterContent::linewise(lines));
                if last > first {
                    let state = &mut *cx.state;
                    state
                        .document
                        .delete_line(first + 1, last - first, &mut state.registers, Some('_'));
                }
                cx.state.document.replace_line(first, "");
                cx.set_caret(Position::new(first, 0));
            } else {
                let removed = cx.state.document.delete_range(region.start, region.end);
                if !removed.is_empty() {
                    cx.state
                        .registers
                        .record_delete(register, RegisterContent::charwise(&removed));
                }
                cx.set_caret(region.start);
            }
        }
        OperatorKind::Indent | OperatorKind::Outdent => {
            shift_lines(cx, first, last, op == OperatorKind::Indent, times.max(1));
            cx.caret_to_line(first);
        }
        OperatorKind::Fold => {
            if let Err(e) = cx.view.folds.create(first, last + 1) {
                cx.report(e.to_string());
            }
            cx.view.paint.damage_all();
        }
    }
    DispatchResult::dirty()
}

/// Indent width of `text` in columns and the char count of its leading blanks.
fn indent_of(text: &str, tab_width: usize) -> (usize, usize) {
    let mut width = 0;
    let mut chars = 0;
    for c in text.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += core_text::width::tab_advance(width, tab_width),
            _ => break,
        }
        chars += 1;
    }
    (width, chars)
}

fn make_indent(width: usize, tab_width: usize, expandtab: bool) -> String {
    if expandtab || tab_width == 0 {
        return " ".repeat(width);
    }
    let mut s = "\t".repeat(width / tab_width);
    s.push_str(&" ".repeat(width % tab_width));
    s
}

/// Shift lines `first..=last` by `times` shiftwidths. Empty lines stay empty.
pub(crate) fn shift_lines(cx: &mut Cx<'_>, first: usize, last: usize, right: bool, times: usize) {
    let tab_width = cx.env.opts.tab_width.max(1);
    let amount = cx.env.shiftwidth.saturating_mul(times);
    for line in first..=last {
        let Some(text) = cx.buffer().line_text(line).map(str::to_string) else {
            break;
        };
        if text.is_empty() {
            continue;
        }
        let (width, blanks) = indent_of(&text, tab_width);
        let width = if right {
            width.saturating_add(amount)
        } else {
            width.saturating_sub(amount)
        };
        let rest: String = text.chars().skip(blanks).collect();
        let shifted = format!("{}{rest}", make_indent(width, tab_width, cx.env.expandtab));
        cx.state.document.replace_line(line, &shifted);
    }
}
