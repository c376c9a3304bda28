//! Buffer-level cursor motions.
//!
//! These operate purely on a `Buffer` + `Position` pair and are free of view
//! state (wrapping, folds, sticky columns live in the projector). Each function
//! moves the given position in place; callers that only need the target work
//! on a copy.

use crate::{Buffer, Position};

/// Character class used by word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Word,
    Punct,
}

/// Classify `c`. With `big` every non-blank character is a word character.
pub fn class_of(c: char, big: bool) -> CharClass {
    if c.is_whitespace() {
        CharClass::Blank
    } else if big || c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// True for characters that make up a keyword (completion, `*`-style lookups).
pub fn is_keyword(c: char) -> bool {
    class_of(c, false) == CharClass::Word
}

/// Walks the buffer one character at a time. Every non-last line exposes an
/// extra "newline slot" at `col == len`; an empty line is that slot alone.
struct Scan<'a> {
    buf: &'a Buffer,
    line: usize,
    col: usize,
    chars: Vec<char>,
}

impl<'a> Scan<'a> {
    fn new(buf: &'a Buffer, pos: Position) -> Self {
        let pos = buf.clamp(pos);
        let mut s = Self {
            buf,
            line: pos.line,
            col: pos.col,
            chars: Vec::new(),
        };
        s.load();
        s
    }

    fn load(&mut self) {
        self.chars = self
            .buf
            .line_text(self.line)
            .unwrap_or_default()
            .chars()
            .collect();
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn ch(&self) -> char {
        self.chars.get(self.col).copied().unwrap_or('\n')
    }

    fn is_empty_line(&self) -> bool {
        self.chars.is_empty()
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn is_last_line(&self) -> bool {
        self.line + 1 >= self.buf.line_count()
    }

    fn forward(&mut self) -> bool {
        if self.col + 1 < self.len() || (self.col < self.len() && !self.is_last_line()) {
            self.col += 1;
            true
        } else if self.col >= self.len() && !self.is_last_line() {
            self.line += 1;
            self.col = 0;
            self.load();
            true
        } else {
            false
        }
    }

    fn backward(&mut self) -> bool {
        if self.col > 0 {
            self.col -= 1;
            true
        } else if self.line > 0 {
            self.line -= 1;
            self.load();
            self.col = self.len();
            true
        } else {
            false
        }
    }
}

/// Vim `w` / `W`: start of the next word; an empty line counts as a word.
pub fn word_forward(buf: &Buffer, pos: &mut Position, big: bool) {
    let origin = *pos;
    let mut s = Scan::new(buf, *pos);
    let start_class = class_of(s.ch(), big);
    if start_class != CharClass::Blank {
        while class_of(s.ch(), big) == start_class {
            if !s.forward() {
                *pos = s.pos();
                return;
            }
        }
    }
    loop {
        if s.is_empty_line() && s.pos() != origin {
            break;
        }
        if class_of(s.ch(), big) != CharClass::Blank {
            break;
        }
        if !s.forward() {
            break;
        }
    }
    *pos = s.pos();
}

/// Vim `b` / `B`: start of the current or previous word.
pub fn word_backward(buf: &Buffer, pos: &mut Position, big: bool) {
    let mut s = Scan::new(buf, *pos);
    if !s.backward() {
        return;
    }
    while class_of(s.ch(), big) == CharClass::Blank && !s.is_empty_line() {
        if !s.backward() {
            *pos = s.pos();
            return;
        }
    }
    if !s.is_empty_line() {
        let class = class_of(s.ch(), big);
        while s.col > 0 && class_of(s.chars[s.col - 1], big) == class {
            s.col -= 1;
        }
    }
    *pos = s.pos();
}

/// Vim `e` / `E`: end of the current or next word.
pub fn word_end(buf: &Buffer, pos: &mut Position, big: bool) {
    let mut s = Scan::new(buf, *pos);
    if !s.forward() {
        return;
    }
    while class_of(s.ch(), big) == CharClass::Blank {
        if !s.forward() {
            *pos = s.pos();
            return;
        }
    }
    let class = class_of(s.ch(), big);
    while s.col + 1 < s.len() && class_of(s.chars[s.col + 1], big) == class {
        s.col += 1;
    }
    *pos = s.pos();
}

/// Column of the first non-blank character of `line` (line length if all blank).
pub fn first_non_blank(buf: &Buffer, line: usize) -> usize {
    let text = buf.line_text(line).unwrap_or_default();
    text.chars()
        .position(|c| !c.is_whitespace())
        .unwrap_or_else(|| text.chars().count())
}

/// Vim `%`: jump from the first bracket at or after the caret to its partner.
pub fn matching_pair(buf: &Buffer, pos: &Position) -> Option<Position> {
    const PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];
    let text = buf.line_text(pos.line)?;
    let (col, c) = text
        .chars()
        .enumerate()
        .skip(pos.col)
        .find(|(_, c)| PAIRS.iter().any(|(o, cl)| c == o || c == cl))?;
    let (open, close, forward) = PAIRS.iter().find_map(|&(o, cl)| {
        if c == o {
            Some((o, cl, true))
        } else if c == cl {
            Some((o, cl, false))
        } else {
            None
        }
    })?;
    let mut s = Scan::new(buf, Position::new(pos.line, col));
    let mut depth = 0usize;
    loop {
        let ch = s.ch();
        if s.col < s.len() {
            if ch == open {
                depth = if forward { depth + 1 } else { depth.checked_sub(1)? };
            } else if ch == close {
                depth = if forward { depth.checked_sub(1)? } else { depth + 1 };
            }
            if depth == 0 {
                return Some(s.pos());
            }
        }
        let moved = if forward { s.forward() } else { s.backward() };
        if !moved {
            return None;
        }
    }
}

/// Vim `}`: next empty line after the current paragraph (or the last line).
pub fn paragraph_forward(buf: &Buffer, line: usize) -> usize {
    let last = buf.last_line();
    let mut l = line;
    while l < last && buf.line_len(l) == 0 {
        l += 1;
    }
    while l < last && buf.line_len(l) != 0 {
        l += 1;
    }
    l
}

/// Vim `{`: previous empty line before the current paragraph (or line 0).
pub fn paragraph_backward(buf: &Buffer, line: usize) -> usize {
    let mut l = line.min(buf.last_line());
    while l > 0 && buf.line_len(l) == 0 {
        l -= 1;
    }
    while l > 0 && buf.line_len(l) != 0 {
        l -= 1;
    }
    l
}

/// Direction and landing rule of an in-line character search (`f t F T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindKind {
    Forward,
    Backward,
    TillForward,
    TillBackward,
}

impl FindKind {
    pub fn reversed(self) -> Self {
        match self {
            FindKind::Forward => FindKind::Backward,
            FindKind::Backward => FindKind::Forward,
            FindKind::TillForward => FindKind::TillBackward,
            FindKind::TillBackward => FindKind::TillForward,
        }
    }

    pub fn is_forward(self) -> bool {
        matches!(self, FindKind::Forward | FindKind::TillForward)
    }
}

/// Search `text` for the `count`-th occurrence of `target` from `col`.
/// `repeat` makes a till-search skip an occurrence adjacent to the caret, so
/// repeating `t` with `;` makes progress.
pub fn find_in_line(
    text: &str,
    col: usize,
    target: char,
    kind: FindKind,
    count: usize,
    repeat: bool,
) -> Option<usize> {
    let chars: Vec<char> = text.chars().collect();
    let count = count.max(1);
    let till = matches!(kind, FindKind::TillForward | FindKind::TillBackward);
    let skip = usize::from(till && repeat);
    let mut found = None;
    let mut remaining = count;
    if kind.is_forward() {
        for (i, &c) in chars.iter().enumerate().skip(col + 1 + skip) {
            if c == target {
                remaining -= 1;
                if remaining == 0 {
                    found = Some(i);
                    break;
                }
            }
        }
        found.map(|i| if till { i - 1 } else { i })
    } else {
        let end = col.saturating_sub(skip).min(chars.len());
        for i in (0..end).rev() {
            if chars[i] == target {
                remaining -= 1;
                if remaining == 0 {
                    found = Some(i);
                    break;
                }
            }
        }
        found.map(|i| if till { i + 1 } else { i })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(s: &str) -> Buffer {
        Buffer::from_str("t", s)
    }

    #[test]
    fn word_forward_simple() {
        let b = buf("foo bar baz");
        let mut p = Position::origin();
        word_forward(&b, &mut p, false);
        assert_eq!(p, Position::new(0, 4));
        word_forward(&b, &mut p, false);
        assert_eq!(p, Position::new(0, 8));
    }

    #[test]
    fn word_forward_punct_and_big() {
        let b = buf("a.b c");
        let mut p = Position::origin();
        word_forward(&b, &mut p, false);
        assert_eq!(p.col, 1);
        let mut p = Position::origin();
        word_forward(&b, &mut p, true);
        assert_eq!(p.col, 4);
    }

    #[test]
    fn word_forward_crosses_lines_and_stops_on_empty_line() {
        let b = buf("foo\n\n  bar");
        let mut p = Position::new(0, 1);
        word_forward(&b, &mut p, false);
        assert_eq!(p, Position::new(1, 0));
        word_forward(&b, &mut p, false);
        assert_eq!(p, Position::new(2, 2));
    }

    #[test]
    fn word_forward_at_buffer_end_stays_on_last_char() {
        let b = buf("foo");
        let mut p = Position::new(0, 1);
        word_forward(&b, &mut p, false);
        assert_eq!(p, Position::new(0, 2));
    }

    #[test]
    fn word_backward_basic() {
        let b = buf("foo bar\nbaz");
        let mut p = Position::new(1, 0);
        word_backward(&b, &mut p, false);
        assert_eq!(p, Position::new(0, 4));
        word_backward(&b, &mut p, false);
        assert_eq!(p, Position::new(0, 0));
        word_backward(&b, &mut p, false);
        assert_eq!(p, Position::new(0, 0));
    }

    #[test]
    fn word_end_basic() {
        let b = buf("foo bar");
        let mut p = Position::origin();
        word_end(&b, &mut p, false);
        assert_eq!(p.col, 2);
        word_end(&b, &mut p, false);
        assert_eq!(p.col, 6);
    }

    #[test]
    fn matching_pair_across_lines() {
        let b = buf("fn x() {\n  (a)\n}");
        assert_eq!(
            matching_pair(&b, &Position::new(0, 0)),
            Some(Position::new(0, 5))
        );
        assert_eq!(
            matching_pair(&b, &Position::new(0, 7)),
            Some(Position::new(2, 0))
        );
        assert_eq!(
            matching_pair(&b, &Position::new(2, 0)),
            Some(Position::new(0, 7))
        );
        assert_eq!(matching_pair(&b, &Position::new(1, 5)), None);
    }

    #[test]
    fn paragraphs() {
        let b = buf("a\nb\n\nc\nd");
        assert_eq!(paragraph_forward(&b, 0), 2);
        assert_eq!(paragraph_forward(&b, 2), 4);
        assert_eq!(paragraph_backward(&b, 4), 2);
        assert_eq!(paragraph_backward(&b, 1), 0);
    }

    #[test]
    fn find_variants() {
        let t = "a,b,c,d";
        assert_eq!(find_in_line(t, 0, ',', FindKind::Forward, 2, false), Some(3));
        assert_eq!(find_in_line(t, 0, ',', FindKind::TillForward, 1, false), Some(0));
        assert_eq!(find_in_line(t, 0, ',', FindKind::TillForward, 1, true), Some(2));
        assert_eq!(find_in_line(t, 6, ',', FindKind::Backward, 1, false), Some(5));
        assert_eq!(find_in_line(t, 6, ',', FindKind::TillBackward, 1, false), Some(6));
        assert_eq!(find_in_line(t, 6, ',', FindKind::TillBackward, 1, true), Some(4));
        assert_eq!(find_in_line(t, 0, 'z', FindKind::Forward, 1, false), None);
    }

    #[test]
    fn first_non_blank_column() {
        let b = buf("   x\n   ");
        assert_eq!(first_non_blank(&b, 0), 3);
        assert_eq!(first_non_blank(&b, 1), 3);
    }
}
