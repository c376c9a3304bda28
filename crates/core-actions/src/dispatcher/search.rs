//! Regex search for `/`, `?`, `n`, `N` and Ex `/pat/` addresses.
//!
//! Searches wrap around the buffer. Matches are reported as character
//! columns; the regex engine works on bytes of a single line at a time, so
//! patterns never match across line breaks.

use super::command_parser::ExError;
use super::{Cx, DispatchResult};
use core_text::{Buffer, Position};
use regex::Regex;
use tracing::{debug, trace};

pub(crate) fn compile(pattern: &str) -> Result<Regex, ExError> {
    Regex::new(pattern).map_err(|e| {
        debug!(target: "actions.search", pattern, error = %e, "bad_pattern");
        ExError::BadPattern(pattern.to_string())
    })
}

fn char_col(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

fn byte_of(text: &str, col: usize) -> Option<usize> {
    match text.char_indices().nth(col) {
        Some((b, _)) => Some(b),
        None if col == text.chars().count() => Some(text.len()),
        None => None,
    }
}

/// First match on `line` starting strictly after `col` (`None` = from the start).
fn first_after(re: &Regex, text: &str, col: Option<usize>) -> Option<usize> {
    let start = match col {
        None => 0,
        Some(c) => byte_of(text, c.saturating_add(1))?,
    };
    re.find_at(text, start).map(|m| char_col(text, m.start()))
}

/// Last match on `line` starting strictly before `col` (`None` = anywhere).
fn last_before(re: &Regex, text: &str, col: Option<usize>) -> Option<usize> {
    re.find_iter(text)
        .map(|m| char_col(text, m.start()))
        .take_while(|&c| col.is_none_or(|limit| c < limit))
        .last()
}

/// Next match from `from` in the given direction. The flag is true when the
/// search wrapped past the end (or start) of the buffer.
pub(crate) fn find(buf: &Buffer, re: &Regex, from: Position, forward: bool) -> Option<(Position, bool)> {
    let count = buf.line_count();
    let text = |l: usize| buf.line_text(l).unwrap_or_default();
    if forward {
        if let Some(col) = first_after(re, text(from.line), Some(from.col)) {
            return Some((Position::new(from.line, col), false));
        }
        for line in from.line + 1..count {
            if let Some(col) = first_after(re, text(line), None) {
                return Some((Position::new(line, col), false));
            }
        }
        for line in 0..=from.line.min(count - 1) {
            if let Some(col) = first_after(re, text(line), None)
                && (line < from.line || col <= from.col)
            {
                return Some((Position::new(line, col), true));
            }
        }
        None
    } else {
        if let Some(col) = last_before(re, text(from.line), Some(from.col)) {
            return Some((Position::new(from.line, col), false));
        }
        for line in (0..from.line).rev() {
            if let Some(col) = last_before(re, text(line), None) {
                return Some((Position::new(line, col), false));
            }
        }
        for line in (from.line..count).rev() {
            if let Some(col) = last_before(re, text(line), None)
                && (line > from.line || col >= from.col)
            {
                return Some((Position::new(line, col), true));
            }
        }
        None
    }
}

/// Line of the next match for an Ex `/pat/` or `?pat?` address, searching from
/// the line after (or before) `line`.
pub(crate) fn find_line(buf: &Buffer, re: &Regex, line: usize, backward: bool) -> Option<usize> {
    let from = if backward {
        Position::new(line, 0)
    } else {
        Position::new(line, buf.line_len(line))
    };
    find(buf, re, from, !backward).map(|(pos, _)| pos.line)
}

/// `n` / `N`: the `count`-th match of the last pattern. `reverse` flips the
/// stored direction. Reports wrap-around and failures.
pub(crate) fn repeat(cx: &mut Cx<'_>, reverse: bool, count: usize) -> Option<Position> {
    let Some(pattern) = cx.state.search.pattern.clone() else {
        cx.report("No previous regular expression");
        return None;
    };
    let re = match compile(&pattern) {
        Ok(re) => re,
        Err(e) => {
            cx.report(e.to_string());
            return None;
        }
    };
    let forward = cx.state.search.backward == reverse;
    let mut pos = cx.caret();
    let mut wrapped = false;
    for _ in 0..count.max(1) {
        let Some((next, w)) = find(cx.buffer(), &re, pos, forward) else {
            cx.report(format!("Pattern not found: {pattern}"));
            return None;
        };
        pos = next;
        wrapped |= w;
    }
    trace!(target: "actions.search", %pattern, forward, ?pos, wrapped, "match");
    if wrapped {
        cx.report(if forward {
            "search hit BOTTOM, continuing at TOP"
        } else {
            "search hit TOP, continuing at BOTTOM"
        });
    }
    Some(pos)
}

/// Run a search typed after `/` or `?`. An empty pattern reuses the last one.
pub(crate) fn submit(cx: &mut Cx<'_>, text: &str, backward: bool) -> DispatchResult {
    if !text.is_empty() {
        // A pattern that fails to compile leaves the previous one in place.
        if let Err(e) = compile(text) {
            cx.report(e.to_string());
            return DispatchResult::dirty();
        }
        cx.state.search.pattern = Some(text.to_string());
    }
    cx.state.search.backward = backward;
    debug!(target: "actions.search", pattern = ?cx.state.search.pattern, backward, "search");
    let before = cx.caret();
    if let Some(pos) = repeat(cx, false, 1) {
        cx.state.marks.set('\'', before);
        cx.set_caret(pos);
        if cx.state.mode().is_sel_mode() {
            let (lo, hi) = if before.line <= pos.line {
                (before.line, pos.line)
            } else {
                (pos.line, before.line)
            };
            cx.view.paint.damage_lines(lo, hi + 1);
        }
    }
    DispatchResult::dirty()
}
