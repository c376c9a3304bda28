//! Editing modes and the mode stack.
//!
//! The stack always holds at least one mode. Its bottom is Normal, or Intro
//! until the first key is handled. Enter/leave hooks live with the dispatcher,
//! which owns the view the hooks act on; this module only tracks the data.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Splash state before the first key; any key switches to Normal.
    Intro,
    Normal,
    Insert,
    Replace,
    Visual,
    VisualLine,
    Ex,
    Search,
    SearchBackward,
    Completion,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Intro => "INTRO",
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Replace => "REPLACE",
            Mode::Visual => "VISUAL",
            Mode::VisualLine => "VISUAL LINE",
            Mode::Ex => "EX",
            Mode::Search => "SEARCH",
            Mode::SearchBackward => "SEARCH BACKWARD",
            Mode::Completion => "COMPLETION",
        }
    }

    /// Whether the caret may rest one column past the last character.
    pub fn is_edit_mode(self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace | Mode::Completion)
    }

    pub fn is_sel_mode(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine)
    }

    /// Modes whose keys edit the command line rather than the buffer.
    pub fn is_command_line(self) -> bool {
        matches!(self, Mode::Ex | Mode::Search | Mode::SearchBackward)
    }

    /// Prompt character shown before the command line.
    pub fn prompt(self) -> Option<char> {
        match self {
            Mode::Ex => Some(':'),
            Mode::Search => Some('/'),
            Mode::SearchBackward => Some('?'),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModeStack {
    stack: Vec<Mode>,
}

impl Default for ModeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Mode::Normal],
        }
    }

    /// Stack whose bottom is the Intro mode.
    pub fn with_intro() -> Self {
        Self {
            stack: vec![Mode::Intro],
        }
    }

    pub fn current(&self) -> Mode {
        self.stack.last().copied().unwrap_or(Mode::Normal)
    }

    /// Mode that becomes current after a `pop`, if any.
    pub fn underneath(&self) -> Option<Mode> {
        self.stack.len().checked_sub(2).map(|i| self.stack[i])
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn contains(&self, mode: Mode) -> bool {
        self.stack.contains(&mode)
    }

    pub fn push(&mut self, mode: Mode) {
        debug!(target: "state.mode", from = self.current().label(), to = mode.label(), "push");
        self.stack.push(mode);
    }

    /// Remove the current mode. The bottom mode is never removed; `None` is
    /// returned instead.
    pub fn pop(&mut self) -> Option<Mode> {
        if self.stack.len() <= 1 {
            return None;
        }
        let left = self.stack.pop();
        debug!(target: "state.mode", to = self.current().label(), "pop");
        left
    }

    /// Replace the current mode and return the one it replaced.
    pub fn change(&mut self, mode: Mode) -> Mode {
        let prev = self.current();
        if let Some(top) = self.stack.last_mut() {
            *top = mode;
        }
        debug!(target: "state.mode", from = prev.label(), to = mode.label(), "change");
        prev
    }
}
