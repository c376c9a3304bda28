//! Normal mode text edits that are not operators.

use super::{Cx, DispatchResult, mode};
use core_state::{Mode, RegisterContent, RegisterStore};
use core_text::Position;
use tracing::{debug, trace};

/// `x`: delete `count` characters under and after the caret.
pub(crate) fn delete_under(cx: &mut Cx<'_>, count: usize, register: Option<char>) -> DispatchResult {
    let caret = cx.caret();
    let Some(removed) = cx.state.document.delete_char(caret.col, caret.line, count) else {
        return DispatchResult::clean();
    };
    cx.state
        .registers
        .record_delete(register, RegisterContent::charwise(&removed));
    cx.set_caret(caret);
    DispatchResult::dirty()
}

/// `X`: delete `count` characters before the caret.
pub(crate) fn delete_before(cx: &mut Cx<'_>, count: usize, register: Option<char>) -> DispatchResult {
    let caret = cx.caret();
    let n = count.min(caret.col);
    if n == 0 {
        return DispatchResult::clean();
    }
    let col = caret.col - n;
    if let Some(removed) = cx.state.document.delete_char(col, caret.line, n) {
        cx.state
            .registers
            .record_delete(register, RegisterContent::charwise(&removed));
    }
    cx.set_caret(Position::new(caret.line, col));
    DispatchResult::dirty()
}

/// `s`: delete `count` characters and start inserting. Works on empty lines.
pub(crate) fn substitute_chars(cx: &mut Cx<'_>, count: usize, register: Option<char>) -> DispatchResult {
    let caret = cx.caret();
    mode::push(cx, Mode::Insert);
    if let Some(removed) = cx.state.document.delete_char(caret.col, caret.line, count) {
        cx.state
            .registers
            .record_delete(register, RegisterContent::charwise(&removed));
    }
    cx.set_caret(caret);
    DispatchResult::dirty()
}

/// `p` / `P`.
pub(crate) fn put(cx: &mut Cx<'_>, after: bool, count: usize, register: Option<char>) -> DispatchResult {
    let content = match cx.state.registers.read(register) {
        Ok(c) => c,
        Err(e) => {
            cx.report(e.to_string());
            return DispatchResult::dirty();
        }
    };
    let caret = cx.caret();
    let count = count.max(1);
    if content.linewise {
        let lines: Vec<String> = std::iter::repeat_n(content.lines.iter().cloned(), count)
            .flatten()
            .collect();
        let at = if after { caret.line + 1 } else { caret.line };
        cx.state.document.insert_lines(at, &lines);
        cx.caret_to_line(at);
    } else {
        let text = content.text().repeat(count);
        let len = cx.buffer().line_len(caret.line);
        let col = if after && len > 0 { caret.col + 1 } else { caret.col };
        let at = Position::new(caret.line, col);
        let end = cx.state.document.insert_text(at, &text);
        if text.contains('\n') {
            cx.set_caret(at);
        } else {
            cx.set_caret(end);
        }
    }
    trace!(target: "actions.dispatch", linewise = content.linewise, count, "put");
    DispatchResult::dirty()
}

/// Join `lines` lines starting at `line` (`J`, `:join`, visual `J`). Leading
/// blanks of each joined line are dropped; a single space separates the parts
/// unless the current text ends in a blank, the next is empty or starts with `)`.
pub(crate) fn join(cx: &mut Cx<'_>, line: usize, lines: usize) -> bool {
    let mut joined = false;
    let mut join_col = None;
    for _ in 1..lines.max(2) {
        if line + 1 > cx.buffer().last_line() {
            break;
        }
        let current = cx.buffer().line_text(line).unwrap_or_default().to_string();
        let next = cx.buffer().line_text(line + 1).unwrap_or_default().to_string();
        let trimmed = next.trim_start();
        if trimmed.len() != next.len() {
            cx.state.document.replace_line(line + 1, trimmed);
        }
        let separator = if trimmed.is_empty()
            || current.is_empty()
            || current.ends_with(char::is_whitespace)
            || trimmed.starts_with(')')
        {
            ""
        } else {
            " "
        };
        join_col = Some(current.chars().count());
        joined |= cx.state.document.join_lines(line, separator);
    }
    if !joined {
        debug!(target: "actions.dispatch", line, "join_failed");
        return false;
    }
    if let Some(col) = join_col {
        cx.set_caret(Position::new(line, col));
    }
    true
}

fn toggled(c: char) -> String {
    if c.is_uppercase() {
        c.to_lowercase().collect()
    } else if c.is_lowercase() {
        c.to_uppercase().collect()
    } else {
        c.to_string()
    }
}

/// Case conversions shared by `~` and the visual `~ u U`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CaseMap {
    Toggle,
    Lower,
    Upper,
}

impl CaseMap {
    fn map(self, c: char) -> String {
        match self {
            CaseMap::Toggle => toggled(c),
            CaseMap::Lower => c.to_lowercase().collect(),
            CaseMap::Upper => c.to_uppercase().collect(),
        }
    }
}

/// Map the case of columns `[from, to)` on `line`.
pub(crate) fn map_case(cx: &mut Cx<'_>, line: usize, from: usize, to: usize, case: CaseMap) -> bool {
    let Some(text) = cx.buffer().line_text(line) else {
        return false;
    };
    let mapped: String = text
        .chars()
        .enumerate()
        .map(|(i, c)| if (from..to).contains(&i) { case.map(c) } else { c.to_string() })
        .collect();
    if mapped == text {
        return false;
    }
    cx.state.document.replace_line(line, &mapped)
}

/// `~`: toggle `count` characters and step past them.
pub(crate) fn toggle_case(cx: &mut Cx<'_>, count: usize) -> DispatchResult {
    let caret = cx.caret();
    let len = cx.buffer().line_len(caret.line);
    if len == 0 {
        return DispatchResult::clean();
    }
    let end = (caret.col + count).min(len);
    map_case(cx, caret.line, caret.col, end, CaseMap::Toggle);
    cx.set_caret(Position::new(caret.line, end));
    DispatchResult::dirty()
}

/// `r{c}`: overwrite `count` characters with `c`.
pub(crate) fn replace_chars(cx: &mut Cx<'_>, c: char, count: usize) -> DispatchResult {
    let caret = cx.caret();
    let len = cx.buffer().line_len(caret.line);
    if caret.col + count > len {
        debug!(target: "actions.dispatch", count, len, "replace_past_end");
        return DispatchResult::clean();
    }
    cx.state.document.delete_char(caret.col, caret.line, count);
    let text: String = std::iter::repeat_n(c, count).collect();
    cx.state.document.insert_char(caret.col, caret.line, &text);
    cx.set_caret(Position::new(caret.line, caret.col + count - 1));
    DispatchResult::dirty()
}

/// Start and end (exclusive) columns of the number at or after `col`,
/// including a leading minus sign.
fn number_span(chars: &[char], col: usize) -> Option<(usize, usize)> {
    let mut start = if chars.get(col).is_some_and(char::is_ascii_digit) {
        let mut s = col;
        while s > 0 && chars[s - 1].is_ascii_digit() {
            s -= 1;
        }
        s
    } else {
        col + chars.get(col..)?.iter().position(char::is_ascii_digit)?
    };
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    if start > 0 && chars[start - 1] == '-' {
        start -= 1;
    }
    Some((start, end))
}

/// `<CTRL>a` / `<CTRL>x`: add `delta` to the number at or after the caret.
pub(crate) fn increment(cx: &mut Cx<'_>, delta: i64) -> DispatchResult {
    let caret = cx.caret();
    let chars: Vec<char> = cx.buffer().line_text(caret.line).unwrap_or_default().chars().collect();
    let Some((start, end)) = number_span(&chars, caret.col) else {
        return DispatchResult::clean();
    };
    let digits: String = chars[start..end].iter().collect();
    let value = digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    });
    let updated = value.saturating_add(delta).to_string();
    cx.state.document.delete_char(start, caret.line, end - start);
    cx.state.document.insert_char(start, caret.line, &updated);
    cx.set_caret(Position::new(caret.line, start + updated.chars().count() - 1));
    trace!(target: "actions.dispatch", value, updated = %updated, "increment");
    DispatchResult::dirty()
}
