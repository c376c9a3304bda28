//! Line-oriented text buffer.
//!
//! The buffer is an ordered sequence of [`Line`]s and always holds at least one
//! line. Every mutating primitive returns the [`BufferOperation`] records that
//! describe what actually changed; higher layers feed those into the undo log
//! and the damage journal. Columns are character indices, never bytes.

use regex::Regex;
use tracing::{debug, trace};

pub mod motion;
pub mod width;

pub use width::{char_width, display_width};

/// A position inside a buffer expressed as (line index, character column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
    pub fn origin() -> Self {
        Self { line: 0, col: 0 }
    }
    pub fn clamp_to<F>(&mut self, line_count: usize, mut line_len_fn: F)
    where
        F: FnMut(usize) -> usize,
    {
        if line_count == 0 {
            self.line = 0;
            self.col = 0;
            return;
        }
        if self.line >= line_count {
            self.line = line_count - 1;
        }
        let max_len = line_len_fn(self.line);
        if self.col > max_len {
            self.col = max_len;
        }
    }
}

/// Kind of a recorded buffer mutation. Each kind has an inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    InsertText,
    DeleteText,
    /// An empty line was inserted at `line`.
    InsertLine,
    /// The (already emptied) line at `line` was removed.
    DeleteLine,
}

impl OperationKind {
    pub fn inverse(self) -> Self {
        match self {
            OperationKind::InsertText => OperationKind::DeleteText,
            OperationKind::DeleteText => OperationKind::InsertText,
            OperationKind::InsertLine => OperationKind::DeleteLine,
            OperationKind::DeleteLine => OperationKind::InsertLine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferOperation {
    pub kind: OperationKind,
    pub text: String,
    pub col: usize,
    pub line: usize,
}

impl BufferOperation {
    pub fn insert_text(col: usize, line: usize, text: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::InsertText,
            text: text.into(),
            col,
            line,
        }
    }
    pub fn delete_text(col: usize, line: usize, text: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::DeleteText,
            text: text.into(),
            col,
            line,
        }
    }
    pub fn insert_line(line: usize) -> Self {
        Self {
            kind: OperationKind::InsertLine,
            text: String::new(),
            col: 0,
            line,
        }
    }
    pub fn delete_line(line: usize) -> Self {
        Self {
            kind: OperationKind::DeleteLine,
            text: String::new(),
            col: 0,
            line,
        }
    }

    /// The operation that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            kind: self.kind.inverse(),
            text: self.text.clone(),
            col: self.col,
            line: self.line,
        }
    }

    /// Change in line count caused by applying this operation.
    pub fn line_delta(&self) -> isize {
        match self.kind {
            OperationKind::InsertLine => 1,
            OperationKind::DeleteLine => -1,
            _ => 0,
        }
    }
}

/// Highlighting collaborator: computes one opaque attribute byte per character.
pub trait Highlighter {
    fn compute_attributes(&self, text: &str) -> Vec<u8>;
}

/// Highlighter that marks every character with attribute 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn compute_attributes(&self, text: &str) -> Vec<u8> {
        vec![0; text.chars().count().max(1)]
    }
}

/// One buffer line: text without newline, a parallel attribute array, and the
/// lazy-highlight flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
    len: usize,
    attrs: Vec<u8>,
    initialized: bool,
}

impl Default for Line {
    fn default() -> Self {
        Self::new("")
    }
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        debug_assert!(!text.contains('\n'), "lines never contain a newline");
        let len = text.chars().count();
        Self {
            text,
            len,
            attrs: vec![0; len.max(1)],
            initialized: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn attributes(&self) -> &[u8] {
        &self.attrs
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn char_at(&self, col: usize) -> Option<char> {
        self.text.chars().nth(col)
    }

    /// Byte offset of character column `col` (clamped to the line end).
    pub fn byte_index(&self, col: usize) -> usize {
        self.text
            .char_indices()
            .nth(col)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    /// Characters in `[from, to)` as an owned string.
    pub fn slice(&self, from: usize, to: usize) -> String {
        let to = to.min(self.len);
        if from >= to {
            return String::new();
        }
        self.text[self.byte_index(from)..self.byte_index(to)].to_string()
    }

    fn set_text(&mut self, text: String) {
        self.len = text.chars().count();
        self.text = text;
        self.attrs.clear();
        self.attrs.resize(self.len.max(1), 0);
        self.initialized = false;
    }

    /// Install highlight attributes, resized to the character length (minimum 1).
    pub fn set_attributes(&mut self, mut attrs: Vec<u8>) {
        attrs.resize(self.len.max(1), 0);
        self.attrs = attrs;
        self.initialized = true;
    }
}

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(input: &str) -> String {
    if !input.contains('\r') {
        return input.to_string();
    }
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// The text buffer. Invariant: `lines.len() >= 1`.
#[derive(Debug, Clone)]
pub struct Buffer {
    lines: Vec<Line>,
    pub name: String,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new("[No Name]")
    }
}

impl Buffer {
    /// An empty buffer holding one empty line.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            lines: vec![Line::default()],
            name: name.into(),
        }
    }

    /// Construct a buffer from in-memory text. A single trailing newline does not
    /// produce an extra empty line.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        let normalized = normalize_line_endings(content);
        let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
        let lines: Vec<Line> = body.split('\n').map(Line::new).collect();
        Self {
            lines,
            name: name.into(),
        }
    }

    /// Total number of lines in the buffer (always at least 1).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    pub fn line_text(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(Line::text)
    }

    /// Character length of a line; 0 for out-of-range indices.
    pub fn line_len(&self, idx: usize) -> usize {
        self.lines.get(idx).map(Line::len).unwrap_or(0)
    }

    pub fn last_line(&self) -> usize {
        self.lines.len() - 1
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(Line::text)
    }

    /// Buffer content with lines joined by `\n` (no trailing newline).
    pub fn contents(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    /// Clamp a position to valid buffer coordinates (column may equal the line length).
    pub fn clamp(&self, mut pos: Position) -> Position {
        pos.clamp_to(self.line_count(), |l| self.line_len(l));
        pos
    }

    /// Highlight attributes for `line`, computing them through `hl` on first access.
    pub fn attributes(&mut self, line: usize, hl: &dyn Highlighter) -> Option<&[u8]> {
        let l = self.lines.get_mut(line)?;
        if !l.initialized {
            let attrs = hl.compute_attributes(&l.text);
            l.set_attributes(attrs);
            trace!(target: "text.buffer", line, "attributes_computed");
        }
        Some(l.attributes())
    }

    /// Insert `text` at (col, line). Column is clamped to the line length.
    pub fn insert_char(&mut self, col: usize, line: usize, text: &str) -> Option<BufferOperation> {
        if text.is_empty() {
            return None;
        }
        if text.contains('\n') {
            debug!(target: "text.buffer", line, "insert_char_rejected_newline");
            return None;
        }
        let line_count = self.lines.len();
        let Some(l) = self.lines.get_mut(line) else {
            debug!(target: "text.buffer", line, line_count, "insert_char_out_of_range");
            return None;
        };
        let col = col.min(l.len);
        let at = l.byte_index(col);
        let mut s = std::mem::take(&mut l.text);
        s.insert_str(at, text);
        l.set_text(s);
        trace!(target: "text.buffer", line, col, len = text.len(), "insert_char");
        Some(BufferOperation::insert_text(col, line, text))
    }

    /// Remove up to `count` characters starting at (col, line).
    pub fn delete_char(&mut self, col: usize, line: usize, count: usize) -> Option<BufferOperation> {
        let l = self.lines.get_mut(line)?;
        if col >= l.len || count == 0 {
            return None;
        }
        let end = col.saturating_add(count).min(l.len);
        let (from, to) = (l.byte_index(col), l.byte_index(end));
        let removed = l.text[from..to].to_string();
        let mut s = std::mem::take(&mut l.text);
        s.replace_range(from..to, "");
        l.set_text(s);
        trace!(target: "text.buffer", line, col, removed = end - col, "delete_char");
        Some(BufferOperation::delete_text(col, line, removed))
    }

    /// Insert an empty line at index `line` (`line == line_count` appends).
    pub fn insert_empty_line(&mut self, line: usize) -> Option<BufferOperation> {
        if line > self.lines.len() {
            debug!(target: "text.buffer", line, "insert_line_out_of_range");
            return None;
        }
        self.lines.insert(line, Line::default());
        trace!(target: "text.buffer", line, "insert_line");
        Some(BufferOperation::insert_line(line))
    }

    /// Remove the empty line at `line`. Refuses non-empty lines and the last remaining line.
    pub fn remove_empty_line(&mut self, line: usize) -> Option<BufferOperation> {
        if self.lines.len() <= 1 || !self.lines.get(line)?.is_empty() {
            return None;
        }
        self.lines.remove(line);
        trace!(target: "text.buffer", line, "remove_line");
        Some(BufferOperation::delete_line(line))
    }

    /// Split `line` at `col`; the tail becomes the new line `line + 1`.
    pub fn insert_new_line(&mut self, col: usize, line: usize) -> Vec<BufferOperation> {
        let mut ops = Vec::new();
        let Some(l) = self.lines.get(line) else {
            debug!(target: "text.buffer", line, "insert_new_line_out_of_range");
            return ops;
        };
        if col == 0 && !l.is_empty() {
            ops.extend(self.insert_empty_line(line));
            return ops;
        }
        let col = col.min(l.len);
        let tail = l.slice(col, l.len);
        ops.extend(self.delete_char(col, line, usize::MAX));
        ops.extend(self.insert_empty_line(line + 1));
        ops.extend(self.insert_char(0, line + 1, &tail));
        ops
    }

    /// Remove `count` whole lines starting at `line`, returning the removed texts.
    /// The last remaining line is emptied instead of removed.
    pub fn delete_line(&mut self, line: usize, count: usize) -> (Vec<String>, Vec<BufferOperation>) {
        let mut removed = Vec::new();
        let mut ops = Vec::new();
        if line >= self.lines.len() {
            debug!(target: "text.buffer", line, "delete_line_out_of_range");
            return (removed, ops);
        }
        let count = count.min(self.lines.len() - line);
        for _ in 0..count {
            removed.push(self.lines[line].text.clone());
            ops.extend(self.delete_char(0, line, usize::MAX));
            ops.extend(self.remove_empty_line(line));
        }
        debug_assert!(!self.lines.is_empty(), "buffer must keep at least one line");
        (removed, ops)
    }

    /// Rebind the whole content of `line`.
    pub fn replace_line(&mut self, line: usize, text: &str) -> Vec<BufferOperation> {
        let mut ops = Vec::new();
        match self.lines.get(line) {
            Some(l) if l.text == text => return ops,
            Some(_) => {}
            None => return ops,
        }
        ops.extend(self.delete_char(0, line, usize::MAX));
        ops.extend(self.insert_char(0, line, text));
        ops
    }

    /// Append line `line + 1` to `line` with `separator` in between and remove it.
    pub fn join_lines(&mut self, line: usize, separator: &str) -> Vec<BufferOperation> {
        let mut ops = Vec::new();
        if line + 1 >= self.lines.len() {
            return ops;
        }
        let next = self.lines[line + 1].text.clone();
        let end = self.lines[line].len;
        let appended = format!("{separator}{next}");
        ops.extend(self.insert_char(end, line, &appended));
        ops.extend(self.delete_char(0, line + 1, usize::MAX));
        ops.extend(self.remove_empty_line(line + 1));
        ops
    }

    /// Replace the first match of `pattern` on `line` (every match when `whole_line`).
    /// Returns whether the line changed together with the recorded operations.
    pub fn substitute(
        &mut self,
        pattern: &Regex,
        replacement: &str,
        whole_line: bool,
        line: usize,
    ) -> (bool, Vec<BufferOperation>) {
        let Some(l) = self.lines.get(line) else {
            return (false, Vec::new());
        };
        if !pattern.is_match(&l.text) {
            return (false, Vec::new());
        }
        let limit = if whole_line { 0 } else { 1 };
        let replaced = pattern.replacen(&l.text, limit, replacement).into_owned();
        if replaced.contains('\n') {
            debug!(target: "text.buffer", line, "substitute_rejected_newline");
            return (false, Vec::new());
        }
        let ops = self.replace_line(line, &replaced);
        (!ops.is_empty(), ops)
    }

    /// Apply a recorded operation (used by undo/redo replay). Returns the operation
    /// as actually performed, or `None` when it no longer applies.
    pub fn apply(&mut self, op: &BufferOperation) -> Option<BufferOperation> {
        match op.kind {
            OperationKind::InsertText => self.insert_char(op.col, op.line, &op.text),
            OperationKind::DeleteText => {
                let count = op.text.chars().count();
                let applied = self.delete_char(op.col, op.line, count)?;
                if applied.text != op.text {
                    debug!(target: "text.buffer", line = op.line, col = op.col, "replay_text_mismatch");
                }
                Some(applied)
            }
            OperationKind::InsertLine => self.insert_empty_line(op.line),
            OperationKind::DeleteLine => self.remove_empty_line(op.line),
        }
    }
}
