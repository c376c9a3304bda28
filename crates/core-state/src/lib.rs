//! Editor state: the document with its undo history, the mode stack,
//! registers, marks and command-line metadata.
//!
//! Everything here is plain owned data handed to the dispatcher by `&mut`.
//! Screen geometry (caret projection, folds, scrolling) lives in `core-model`.

use core_text::motion::FindKind;
use core_text::Buffer;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub mod document;
pub mod marks;
pub mod mode;
pub mod registers;
pub mod undo;

pub use document::Document;
pub use marks::Marks;
pub use mode::{Mode, ModeStack};
pub use registers::{PasteError, RegisterContent, RegisterStore, Registers};
pub use undo::{ReplayState, UndoItem, UndoLog, UNDO_HISTORY_MAX};

/// How long a status message stays visible.
pub const EPHEMERAL_TTL: Duration = Duration::from_secs(3);

/// Text being typed after `:`, `/` or `?`, plus per-prompt history.
#[derive(Debug, Default, Clone)]
pub struct CommandLineState {
    prompt: Option<char>,
    buf: String,
    ex_history: Vec<String>,
    search_history: Vec<String>,
    // position while walking history with <UP>/<DOWN>; None when editing fresh text
    history_pos: Option<usize>,
}

impl CommandLineState {
    pub fn is_active(&self) -> bool {
        self.prompt.is_some()
    }

    pub fn prompt(&self) -> Option<char> {
        self.prompt
    }

    pub fn buffer(&self) -> &str {
        &self.buf
    }

    /// Prompt followed by the typed text, as a status line would show it.
    pub fn display(&self) -> String {
        match self.prompt {
            Some(p) => format!("{p}{}", self.buf),
            None => String::new(),
        }
    }

    pub fn begin(&mut self, prompt: char) {
        self.prompt = Some(prompt);
        self.buf.clear();
        self.history_pos = None;
    }

    pub fn begin_with(&mut self, prompt: char, text: &str) {
        self.begin(prompt);
        self.buf.push_str(text);
    }

    pub fn clear(&mut self) {
        self.prompt = None;
        self.buf.clear();
        self.history_pos = None;
    }

    pub fn push_char(&mut self, ch: char) {
        self.buf.push(ch);
    }

    /// Remove the last character. Returns false when the line was already empty.
    pub fn backspace(&mut self) -> bool {
        self.buf.pop().is_some()
    }

    fn history_mut(&mut self) -> &mut Vec<String> {
        if self.prompt == Some(':') {
            &mut self.ex_history
        } else {
            &mut self.search_history
        }
    }

    pub fn history(&self, prompt: char) -> &[String] {
        if prompt == ':' {
            &self.ex_history
        } else {
            &self.search_history
        }
    }

    /// Finish editing: record the text in history, deactivate, and return it.
    pub fn submit(&mut self) -> String {
        let text = std::mem::take(&mut self.buf);
        if !text.is_empty() {
            let history = self.history_mut();
            history.retain(|h| h != &text);
            history.push(text.clone());
        }
        self.clear();
        text
    }

    /// Replace the text with an older history entry.
    pub fn history_prev(&mut self) {
        let pos = self.history_pos;
        let len = self.history_mut().len();
        let next = match pos {
            None if len > 0 => len - 1,
            Some(p) if p > 0 => p - 1,
            _ => return,
        };
        self.buf = self.history_mut()[next].clone();
        self.history_pos = Some(next);
    }

    /// Replace the text with a newer history entry, or empty it past the newest.
    pub fn history_next(&mut self) {
        let Some(p) = self.history_pos else {
            return;
        };
        let len = self.history_mut().len();
        if p + 1 < len {
            self.buf = self.history_mut()[p + 1].clone();
            self.history_pos = Some(p + 1);
        } else {
            self.buf.clear();
            self.history_pos = None;
        }
    }
}

/// Last search pattern and direction, reused by `n` / `N`.
#[derive(Debug, Default, Clone)]
pub struct SearchState {
    pub pattern: Option<String>,
    pub backward: bool,
}

/// Ephemeral status message.
#[derive(Debug, Clone)]
pub struct EphemeralMessage {
    pub text: String,
    pub expires_at: Instant,
}

/// Owning editing context: one document plus everything commands read or
/// write besides screen geometry.
#[derive(Debug)]
pub struct EditorState {
    pub document: Document,
    pub modes: ModeStack,
    pub registers: Registers,
    pub marks: Marks,
    pub command_line: CommandLineState,
    pub search: SearchState,
    pub last_find: Option<(FindKind, char)>,
    pub ephemeral_status: Option<EphemeralMessage>,
    pub file_name: Option<PathBuf>,
}

impl EditorState {
    pub fn new(buffer: Buffer) -> Self {
        Self::with_document(Document::new(buffer))
    }

    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            modes: ModeStack::new(),
            registers: Registers::new(),
            marks: Marks::new(),
            command_line: CommandLineState::default(),
            search: SearchState::default(),
            last_find: None,
            ephemeral_status: None,
            file_name: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    pub fn buffer(&self) -> &Buffer {
        self.document.buffer()
    }

    pub fn set_ephemeral<S: Into<String>>(&mut self, msg: S, ttl: Duration) {
        self.ephemeral_status = Some(EphemeralMessage {
            text: msg.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    /// Status message with the default lifetime.
    pub fn report<S: Into<String>>(&mut self, msg: S) {
        self.set_ephemeral(msg, EPHEMERAL_TTL);
    }

    pub fn status_text(&self) -> Option<&str> {
        self.ephemeral_status.as_ref().map(|m| m.text.as_str())
    }

    /// Clear an expired status message; returns true if one was cleared.
    pub fn tick_ephemeral(&mut self) -> bool {
        if let Some(m) = &self.ephemeral_status
            && Instant::now() >= m.expires_at
        {
            self.ephemeral_status = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_history_walk() {
        let mut cl = CommandLineState::default();
        cl.begin(':');
        for c in "d".chars() {
            cl.push_char(c);
        }
        assert_eq!(cl.display(), ":d");
        assert_eq!(cl.submit(), "d");
        assert!(!cl.is_active());
        cl.begin(':');
        cl.push_char('y');
        cl.submit();
        cl.begin(':');
        cl.history_prev();
        assert_eq!(cl.buffer(), "y");
        cl.history_prev();
        assert_eq!(cl.buffer(), "d");
        cl.history_prev();
        assert_eq!(cl.buffer(), "d");
        cl.history_next();
        assert_eq!(cl.buffer(), "y");
        cl.history_next();
        assert_eq!(cl.buffer(), "");
        assert!(cl.history('/').is_empty());
    }

    #[test]
    fn backspace_reports_empty() {
        let mut cl = CommandLineState::default();
        cl.begin('/');
        cl.push_char('a');
        assert!(cl.backspace());
        assert!(!cl.backspace());
        assert!(cl.is_active());
    }

    #[test]
    fn ephemeral_expires() {
        let mut st = EditorState::new(Buffer::default());
        st.set_ephemeral("hi", Duration::from_millis(0));
        assert_eq!(st.status_text(), Some("hi"));
        assert!(st.tick_ephemeral());
        assert!(st.status_text().is_none());
        st.report("kept");
        assert!(!st.tick_ephemeral());
        assert_eq!(st.mode(), Mode::Normal);
    }
}
