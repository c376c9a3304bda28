//! Key event model shared by the keymap, dispatcher and driver crates.
//!
//! Keys are described by a normalized `KeyCode` plus a `KeyModifiers` mask.
//! Scripts, macros and tests write keys in angle-bracket notation:
//! `"dw<ESC>"`, `"<CTRL>r"`, `"<CTRL><ALT>x"`. `<LT>` spells a literal `<`.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

/// KeyCode enumerates normalized logical key representations consumed by higher layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    /// Unmodified key.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CTRL)
    }

    /// The character this key types, if it is a printable key without CTRL/ALT.
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) => {
                Some(c)
            }
            _ => None,
        }
    }

    pub fn is_esc(&self) -> bool {
        matches!(self.code, KeyCode::Esc)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyNotationError {
    #[error("unterminated key name starting at byte {0}")]
    Unterminated(usize),
    #[error("unknown key name <{0}>")]
    UnknownName(String),
    #[error("modifier <{0}> is not followed by a key")]
    DanglingModifier(String),
}

fn named_code(name: &str) -> Option<KeyCode> {
    let code = match name {
        "ENTER" | "CR" | "RETURN" => KeyCode::Enter,
        "ESC" => KeyCode::Esc,
        "BS" | "BACKSPACE" => KeyCode::Backspace,
        "DEL" | "DELETE" => KeyCode::Delete,
        "TAB" => KeyCode::Tab,
        "UP" => KeyCode::Up,
        "DOWN" => KeyCode::Down,
        "LEFT" => KeyCode::Left,
        "RIGHT" => KeyCode::Right,
        "HOME" => KeyCode::Home,
        "END" => KeyCode::End,
        "PGUP" | "PAGEUP" => KeyCode::PageUp,
        "PGDN" | "PAGEDOWN" => KeyCode::PageDown,
        "LT" => KeyCode::Char('<'),
        "SPACE" => KeyCode::Char(' '),
        _ => return None,
    };
    Some(code)
}

fn modifier(name: &str) -> Option<KeyModifiers> {
    match name {
        "CTRL" => Some(KeyModifiers::CTRL),
        "ALT" => Some(KeyModifiers::ALT),
        "SHIFT" => Some(KeyModifiers::SHIFT),
        _ => None,
    }
}

/// Parse angle-bracket key notation into a key sequence.
///
/// A `<` that does not start a known name is an error rather than a literal,
/// so typos in scripts surface early; use `<LT>` for the character.
pub fn parse_keys(notation: &str) -> Result<Vec<KeyEvent>, KeyNotationError> {
    let mut out = Vec::new();
    let mut mods = KeyModifiers::empty();
    let mut pending_mod: Option<String> = None;
    let mut rest = notation;
    let mut offset = 0usize;
    while let Some(c) = rest.chars().next() {
        if c == '<' {
            let close = rest
                .find('>')
                .ok_or(KeyNotationError::Unterminated(offset))?;
            let name = rest[1..close].to_ascii_uppercase();
            let consumed = close + 1;
            rest = &rest[consumed..];
            offset += consumed;
            if let Some(m) = modifier(&name) {
                mods |= m;
                pending_mod = Some(name);
                continue;
            }
            let code = named_code(&name).ok_or(KeyNotationError::UnknownName(name))?;
            out.push(KeyEvent::new(code, mods));
        } else {
            rest = &rest[c.len_utf8()..];
            offset += c.len_utf8();
            out.push(KeyEvent::new(KeyCode::Char(c), mods));
        }
        mods = KeyModifiers::empty();
        pending_mod = None;
    }
    if let Some(name) = pending_mod {
        return Err(KeyNotationError::DanglingModifier(name));
    }
    Ok(out)
}

/// Render a key sequence back into notation accepted by [`parse_keys`].
pub fn format_keys(keys: &[KeyEvent]) -> String {
    keys.iter().map(|k| k.to_string()).collect()
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.contains(KeyModifiers::CTRL) {
            f.write_str("<CTRL>")?;
        }
        if self.mods.contains(KeyModifiers::ALT) {
            f.write_str("<ALT>")?;
        }
        if self.mods.contains(KeyModifiers::SHIFT) {
            f.write_str("<SHIFT>")?;
        }
        let name = match self.code {
            KeyCode::Char('<') => "<LT>",
            KeyCode::Char(c) => return write!(f, "{c}"),
            KeyCode::Enter => "<ENTER>",
            KeyCode::Esc => "<ESC>",
            KeyCode::Backspace => "<BS>",
            KeyCode::Delete => "<DEL>",
            KeyCode::Tab => "<TAB>",
            KeyCode::Up => "<UP>",
            KeyCode::Down => "<DOWN>",
            KeyCode::Left => "<LEFT>",
            KeyCode::Right => "<RIGHT>",
            KeyCode::Home => "<HOME>",
            KeyCode::End => "<END>",
            KeyCode::PageUp => "<PGUP>",
            KeyCode::PageDown => "<PGDN>",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_display() {
        let k = KeyEvent {
            code: KeyCode::Char('x'),
            mods: KeyModifiers::CTRL,
        };
        assert_eq!(k.to_string(), "<CTRL>x");
    }

    #[test]
    fn parses_plain_and_named_keys() {
        let keys = parse_keys("dw<ESC>").unwrap();
        assert_eq!(
            keys,
            vec![
                KeyEvent::char('d'),
                KeyEvent::char('w'),
                KeyEvent::plain(KeyCode::Esc)
            ]
        );
    }

    #[test]
    fn modifiers_apply_to_next_key_only() {
        let keys = parse_keys("<CTRL>rx").unwrap();
        assert_eq!(keys, vec![KeyEvent::ctrl('r'), KeyEvent::char('x')]);
        assert_eq!(keys[0].printable(), None);
        assert_eq!(keys[1].printable(), Some('x'));
    }

    #[test]
    fn names_are_case_insensitive() {
        let keys = parse_keys("<esc><Enter><lt>").unwrap();
        assert_eq!(
            keys,
            vec![
                KeyEvent::plain(KeyCode::Esc),
                KeyEvent::plain(KeyCode::Enter),
                KeyEvent::char('<')
            ]
        );
    }

    #[test]
    fn notation_errors() {
        assert_eq!(
            parse_keys("ab<ESC"),
            Err(KeyNotationError::Unterminated(2))
        );
        assert_eq!(
            parse_keys("<NOPE>"),
            Err(KeyNotationError::UnknownName("NOPE".into()))
        );
        assert_eq!(
            parse_keys("x<CTRL>"),
            Err(KeyNotationError::DanglingModifier("CTRL".into()))
        );
    }

    #[test]
    fn format_is_accepted_by_parse() {
        let keys = parse_keys(":s/a/<LT>/g<ENTER><CTRL>a").unwrap();
        let text = format_keys(&keys);
        assert_eq!(parse_keys(&text).unwrap(), keys);
    }
}
