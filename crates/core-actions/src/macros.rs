//! Macro recording (`q{reg}` ... `q`) and replay (`@{reg}`, `@@`).
//!
//! Recorded keys are stored in the register as key notation, so a macro can
//! be inspected or edited like any other register text. Replays nest up to
//! [`MAX_REPLAY_DEPTH`] and never record their own keys.

use core_events::{KeyEvent, format_keys};
use thiserror::Error;
use tracing::debug;

pub const MAX_REPLAY_DEPTH: usize = 16;

/// Work the dispatcher hands to the editor, which owns the key stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroRequest {
    Record(char),
    Replay { register: char, count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroError {
    #[error("Invalid register name: {0}")]
    InvalidRegister(char),
    #[error("No previously used register")]
    NoPrevious,
    #[error("Macro recursion too deep")]
    TooDeep,
}

#[derive(Debug, Default, Clone)]
pub struct MacroState {
    recording: Option<(char, Vec<KeyEvent>)>,
    last_replayed: Option<char>,
    depth: usize,
}

fn is_macro_register(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_ascii_digit() || c == '"'
}

impl MacroState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register being recorded into, if any.
    pub fn recording(&self) -> Option<char> {
        self.recording.as_ref().map(|(c, _)| *c)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn start(&mut self, register: char) -> Result<(), MacroError> {
        if !is_macro_register(register) {
            return Err(MacroError::InvalidRegister(register));
        }
        debug!(target: "actions.dispatch", %register, "macro_record_start");
        self.recording = Some((register, Vec::new()));
        Ok(())
    }

    /// Append a key typed by the user. Keys fed by a replay are ignored.
    pub fn record(&mut self, key: KeyEvent) {
        if self.depth > 0 {
            return;
        }
        if let Some((_, keys)) = self.recording.as_mut() {
            keys.push(key);
        }
    }

    /// Finish recording; returns the register and the keys as notation.
    pub fn stop(&mut self) -> Option<(char, String)> {
        let (register, keys) = self.recording.take()?;
        let text = format_keys(&keys);
        debug!(target: "actions.dispatch", %register, keys = keys.len(), "macro_record_stop");
        Some((register, text))
    }

    /// Register to replay for `@{c}`; `@` means the last replayed one.
    pub fn resolve(&mut self, register: char) -> Result<char, MacroError> {
        let name = if register == '@' {
            self.last_replayed.ok_or(MacroError::NoPrevious)?
        } else if is_macro_register(register) {
            register
        } else {
            return Err(MacroError::InvalidRegister(register));
        };
        self.last_replayed = Some(name);
        Ok(name)
    }

    pub fn enter(&mut self) -> Result<(), MacroError> {
        if self.depth >= MAX_REPLAY_DEPTH {
            return Err(MacroError::TooDeep);
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::KeyCode;

    #[test]
    fn records_until_stop() {
        let mut m = MacroState::new();
        m.start('a').unwrap();
        assert_eq!(m.recording(), Some('a'));
        m.record(KeyEvent::char('x'));
        m.record(KeyEvent::plain(KeyCode::Esc));
        assert_eq!(m.stop(), Some(('a', "x<ESC>".to_string())));
        assert_eq!(m.recording(), None);
        assert_eq!(m.stop(), None);
    }

    #[test]
    fn replay_keys_are_not_recorded() {
        let mut m = MacroState::new();
        m.start('b').unwrap();
        m.enter().unwrap();
        m.record(KeyEvent::char('j'));
        m.leave();
        m.record(KeyEvent::char('k'));
        assert_eq!(m.stop().map(|(_, t)| t), Some("k".to_string()));
    }

    #[test]
    fn at_sign_repeats_last_register() {
        let mut m = MacroState::new();
        assert_eq!(m.resolve('@'), Err(MacroError::NoPrevious));
        assert_eq!(m.resolve('q'), Ok('q'));
        assert_eq!(m.resolve('@'), Ok('q'));
        assert_eq!(m.resolve('!'), Err(MacroError::InvalidRegister('!')));
    }

    #[test]
    fn depth_is_bounded() {
        let mut m = MacroState::new();
        for _ in 0..MAX_REPLAY_DEPTH {
            m.enter().unwrap();
        }
        assert_eq!(m.enter(), Err(MacroError::TooDeep));
        m.leave();
        assert!(m.enter().is_ok());
    }
}
