//! Register storage.
//!
//! - `"` unnamed register, mirrored by every yank and delete.
//! - `0` last yank; `1`-`9` ring of deletes, newest first.
//! - `a`-`z` named registers; `A`-`Z` append to their lowercase slot.
//! - `_` black hole: writes are discarded, reads are empty.

use thiserror::Error;
use tracing::trace;

/// Register payload: lines plus whether the text was captured linewise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterContent {
    pub lines: Vec<String>,
    pub linewise: bool,
}

impl RegisterContent {
    pub fn linewise(lines: Vec<String>) -> Self {
        Self {
            lines,
            linewise: true,
        }
    }

    /// Characterwise content; embedded newlines split into lines.
    pub fn charwise(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            linewise: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() || (!self.linewise && self.lines.iter().all(String::is_empty))
    }

    /// Text with lines joined by `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn append(&mut self, other: RegisterContent) {
        if self.is_empty() {
            *self = other;
            return;
        }
        if self.linewise || other.linewise {
            self.linewise = true;
            self.lines.extend(other.lines);
        } else {
            let mut rest = other.lines.into_iter();
            if let (Some(last), Some(first)) = (self.lines.last_mut(), rest.next()) {
                last.push_str(&first);
            }
            self.lines.extend(rest);
        }
    }
}

/// Register collaborator interface.
pub trait RegisterStore {
    fn get_register(&self, name: char) -> Option<RegisterContent>;
    fn set_register(&mut self, name: char, content: RegisterContent);

    /// Store deleted text. `None` targets the unnamed register.
    fn record_delete(&mut self, target: Option<char>, content: RegisterContent) {
        self.set_register(target.unwrap_or('"'), content);
    }

    /// Store yanked text. `None` targets the unnamed register.
    fn record_yank(&mut self, target: Option<char>, content: RegisterContent) {
        self.set_register(target.unwrap_or('"'), content);
    }
}

/// Paste/read failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasteError {
    #[error("invalid register name {0:?}")]
    InvalidName(char),
    #[error("register {0:?} is empty")]
    Empty(char),
}

#[derive(Debug, Default, Clone)]
pub struct Registers {
    unnamed: RegisterContent,
    yank: RegisterContent,
    numbered: Vec<RegisterContent>, // newest at index 0, length <= 9
    named: [RegisterContent; 26],
}

impl Registers {
    pub const RING: usize = 9;

    pub fn new() -> Self {
        Self::default()
    }

    fn named_index(c: char) -> Option<usize> {
        c.is_ascii_alphabetic()
            .then(|| (c.to_ascii_lowercase() as u8 - b'a') as usize)
    }

    pub fn is_valid_name(c: char) -> bool {
        c.is_ascii_alphabetic() || c.is_ascii_digit() || c == '"' || c == '_'
    }

    /// Read a register for pasting (`None` reads the unnamed register).
    pub fn read(&self, name: Option<char>) -> Result<RegisterContent, PasteError> {
        let name = name.unwrap_or('"');
        if !Self::is_valid_name(name) {
            return Err(PasteError::InvalidName(name));
        }
        match self.get_register(name) {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(PasteError::Empty(name)),
        }
    }

    /// Snapshot of non-empty named registers.
    pub fn named_snapshot(&self) -> Vec<(char, &RegisterContent)> {
        self.named
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_empty())
            .map(|(i, r)| ((b'a' + i as u8) as char, r))
            .collect()
    }
}

impl RegisterStore for Registers {
    /// Record a yank into the unnamed register, `0`, and the optional target.
    fn record_yank(&mut self, target: Option<char>, content: RegisterContent) {
        match target {
            Some('_') => return,
            Some(c) if Self::named_index(c).is_some() => {
                self.set_register(c, content);
                return;
            }
            _ => {}
        }
        self.yank = content.clone();
        self.unnamed = content;
        trace!(target: "state.registers", "record_yank");
    }

    /// Record a delete/change into the unnamed register, the numbered ring, and
    /// the optional target.
    fn record_delete(&mut self, target: Option<char>, content: RegisterContent) {
        match target {
            Some('_') => return,
            Some(c) if Self::named_index(c).is_some() => {
                self.set_register(c, content);
                return;
            }
            _ => {}
        }
        if self.numbered.len() == Self::RING {
            self.numbered.pop();
        }
        self.numbered.insert(0, content.clone());
        self.unnamed = content;
        trace!(target: "state.registers", ring = self.numbered.len(), "record_delete");
    }

    fn get_register(&self, name: char) -> Option<RegisterContent> {
        match name {
            '"' => Some(self.unnamed.clone()),
            '0' => Some(self.yank.clone()),
            '1'..='9' => self
                .numbered
                .get(name as usize - '1' as usize)
                .cloned(),
            '_' => None,
            c => Self::named_index(c).map(|i| self.named[i].clone()),
        }
    }

    /// Direct write. Named writes also update the unnamed register; uppercase
    /// names append.
    fn set_register(&mut self, name: char, content: RegisterContent) {
        match name {
            '"' => self.unnamed = content,
            '0' => self.yank = content,
            '1'..='9' => {
                let idx = name as usize - '1' as usize;
                if self.numbered.len() <= idx {
                    self.numbered.resize(idx + 1, RegisterContent::default());
                }
                self.numbered[idx] = content;
            }
            c => {
                let Some(idx) = Self::named_index(c) else {
                    return;
                };
                if c.is_ascii_uppercase() {
                    self.named[idx].append(content);
                } else {
                    self.named[idx] = content;
                }
                self.unnamed = self.named[idx].clone();
                trace!(target: "state.registers", register = %c, "set_named");
            }
        }
    }
}
