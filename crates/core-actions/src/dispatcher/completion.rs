//! Keyword completion (`<CTRL>n` / `<CTRL>p` in Insert mode).
//!
//! Candidates are the buffer's keywords that start with the prefix before the
//! caret, nearest first. The cycle holds every candidate plus the typed
//! prefix itself, so cycling past the last candidate restores what was typed.

use super::{Cx, DispatchResult, insert, mode};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_state::Mode;
use core_text::motion::is_keyword;
use core_text::{Buffer, Position};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Where the completed word begins.
    start: Position,
    prefix: String,
    candidates: Vec<String>,
    /// Index into `candidates`; `candidates.len()` is the prefix slot.
    index: usize,
}

impl Completion {
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Text of the current slot.
    pub fn current(&self) -> &str {
        self.candidates.get(self.index).map_or(self.prefix.as_str(), String::as_str)
    }

    fn step(&mut self, forward: bool) {
        let slots = self.candidates.len() + 1;
        self.index = if forward {
            (self.index + 1) % slots
        } else {
            (self.index + slots - 1) % slots
        };
    }
}

/// Keywords of `buf` starting with `prefix`, nearest to `origin` first,
/// without duplicates and without the word being typed.
pub(crate) fn collect(buf: &Buffer, origin: Position, prefix: &str) -> Vec<String> {
    let mut found: Vec<(usize, usize, String)> = Vec::new();
    for (line, text) in buf.lines().enumerate() {
        let chars: Vec<char> = text.chars().collect();
        let mut col = 0;
        while col < chars.len() {
            if !is_keyword(chars[col]) {
                col += 1;
                continue;
            }
            let start = col;
            while col < chars.len() && is_keyword(chars[col]) {
                col += 1;
            }
            if line == origin.line && start == origin.col {
                continue;
            }
            let word: String = chars[start..col].iter().collect();
            if word.len() > prefix.len() && word.starts_with(prefix) {
                found.push((line.abs_diff(origin.line), start.abs_diff(origin.col), word));
            }
        }
    }
    found.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    let mut out: Vec<String> = Vec::new();
    for (_, _, word) in found {
        if !out.contains(&word) {
            out.push(word);
        }
    }
    out
}

/// Enter Completion from Insert mode.
pub(crate) fn start(cx: &mut Cx<'_>, forward: bool) -> DispatchResult {
    let caret = cx.caret();
    let chars: Vec<char> = cx.buffer().line_text(caret.line).unwrap_or_default().chars().collect();
    let end = caret.col.min(chars.len());
    let mut begin = end;
    while begin > 0 && is_keyword(chars[begin - 1]) {
        begin -= 1;
    }
    let prefix: String = chars[begin..end].iter().collect();
    let start = Position::new(caret.line, begin);
    let candidates = collect(cx.buffer(), start, &prefix);
    debug!(target: "actions.dispatch", prefix = %prefix, found = candidates.len(), "completion_start");
    if candidates.is_empty() {
        cx.report("Pattern not found");
        return DispatchResult::dirty();
    }
    let index = if forward { 0 } else { candidates.len() - 1 };
    let completion = Completion {
        start,
        prefix,
        candidates,
        index,
    };
    mode::push(cx, Mode::Completion);
    apply(cx, &completion, caret.col);
    cx.session.completion = Some(completion);
    DispatchResult::dirty()
}

/// Replace the text between the word start and `caret_col` with the current slot.
fn apply(cx: &mut Cx<'_>, completion: &Completion, caret_col: usize) {
    let line = completion.start.line;
    let from = completion.start.col;
    if caret_col > from {
        cx.state.document.delete_char(from, line, caret_col - from);
    }
    let text = completion.current();
    cx.state.document.insert_char(from, line, text);
    cx.set_caret(Position::new(line, from + text.chars().count()));
}

pub(crate) fn handle_key(key: KeyEvent, cx: &mut Cx<'_>) -> DispatchResult {
    let cycle = key.mods.contains(KeyModifiers::CTRL)
        && matches!(key.code, KeyCode::Char('n') | KeyCode::Char('p'));
    if cycle && let Some(mut completion) = cx.session.completion.take() {
        completion.step(key.code == KeyCode::Char('n'));
        let caret_col = cx.caret().col;
        apply(cx, &completion, caret_col);
        cx.session.completion = Some(completion);
        return DispatchResult::dirty();
    }
    // Any other key accepts the completion and is handled by Insert mode.
    mode::pop(cx);
    insert::handle_key(key, cx).merge(DispatchResult::dirty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nearest_candidates_first() {
        let buf = Buffer::from_str("t", "alpha beta\nal\nalpine alps alpha");
        let words = collect(&buf, Position::new(1, 0), "al");
        assert_eq!(words, vec!["alpha", "alpine", "alps"]);
    }

    #[test]
    fn cycle_includes_prefix_slot() {
        let mut c = Completion {
            start: Position::origin(),
            prefix: "al".into(),
            candidates: vec!["alpha".into(), "alps".into()],
            index: 0,
        };
        c.step(true);
        assert_eq!(c.current(), "alps");
        c.step(true);
        assert_eq!(c.current(), "al");
        c.step(true);
        assert_eq!(c.current(), "alpha");
        c.step(false);
        assert_eq!(c.current(), "al");
    }
}
