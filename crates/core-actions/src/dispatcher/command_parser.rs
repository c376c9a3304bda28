//! Ex command grammar: `[range]name[!] [args]`.
//!
//! Parsing is pure. Addresses stay symbolic (`.`, `$`, `'a`, `/pat/`) and are
//! resolved against the buffer by the executor, so a range that cannot be
//! resolved aborts before anything is mutated.
//!
//! Line numbers are 1-based here, as typed; `Address::Absolute(0)` is kept and
//! treated as line 1 when resolved.

use crate::MapModes;
use core_events::{KeyEvent, parse_keys};
use core_model::FoldError;
use core_state::{Marks, Registers};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Absolute(usize),
    Current,
    Last,
    Mark(char),
    /// `/pat/` searches forward from the next line, `?pat?` backward. An
    /// empty pattern reuses the last search.
    Search { pattern: String, backward: bool },
}

/// An address followed by its `+N` / `-N` offsets, already summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpec {
    pub address: Address,
    pub offset: isize,
}

impl LineSpec {
    pub fn at(address: Address) -> Self {
        Self { address, offset: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: LineSpec,
    pub end: Option<LineSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommandKind {
    Delete { register: Option<char> },
    Yank { register: Option<char> },
    Substitute {
        pattern: String,
        replacement: String,
        global: bool,
    },
    Shift { right: bool, times: usize },
    Join,
    Fold,
    FoldOpen,
    FoldClose,
    Undo,
    Redo,
    Mark(char),
    Quit { force: bool },
    /// `:w [file]`, `:wq [file]` and `:x [file]`. `:x` skips the write when
    /// the buffer is unmodified and no file was named.
    Write {
        path: Option<String>,
        quit: bool,
        only_if_modified: bool,
    },
    Map {
        modes: MapModes,
        lhs: Vec<KeyEvent>,
        rhs: Vec<KeyEvent>,
        noremap: bool,
    },
    Unmap { modes: MapModes, lhs: Vec<KeyEvent> },
    Visual,
    /// Bare range: move to its last line.
    Goto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExCommand {
    pub range: Option<Range>,
    pub kind: ExCommandKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExError {
    #[error("Not an editor command: {0}")]
    Unknown(String),
    #[error("Invalid range")]
    InvalidRange,
    #[error("Mark not set: {0}")]
    MarkNotSet(char),
    #[error("Pattern not found: {0}")]
    PatternNotFound(String),
    #[error("Invalid pattern: {0}")]
    BadPattern(String),
    #[error("No previous regular expression")]
    NoPreviousPattern,
    #[error("No write since last change (add ! to override)")]
    Modified,
    #[error("Trailing characters: {0}")]
    Trailing(String),
    #[error("Argument required")]
    ArgumentRequired,
    #[error("Invalid register name: {0}")]
    InvalidRegister(char),
    #[error("Invalid mark name: {0}")]
    InvalidMark(char),
    #[error("Invalid key notation: {0}")]
    BadKeys(String),
    #[error("No such mapping")]
    NoMapping,
    #[error("No file name")]
    NoFileName,
    #[error(transparent)]
    Fold(#[from] FoldError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Name {
    Delete,
    Yank,
    Substitute,
    Join,
    Undo,
    Redo,
    Quit,
    Mark,
    K,
    Fold,
    FoldOpen,
    FoldClose,
    Visual,
    Write,
    WriteQuit,
    Exit,
    Map(MapModes, bool),
    Unmap(MapModes),
}

/// Full name and the shortest accepted abbreviation length.
const NAMES: &[(&str, usize, Name)] = &[
    ("delete", 1, Name::Delete),
    ("yank", 1, Name::Yank),
    ("substitute", 1, Name::Substitute),
    ("join", 1, Name::Join),
    ("undo", 1, Name::Undo),
    ("redo", 3, Name::Redo),
    ("quit", 1, Name::Quit),
    ("mark", 2, Name::Mark),
    ("k", 1, Name::K),
    ("fold", 2, Name::Fold),
    ("foldopen", 5, Name::FoldOpen),
    ("foldclose", 5, Name::FoldClose),
    ("visual", 2, Name::Visual),
    ("write", 1, Name::Write),
    ("wq", 2, Name::WriteQuit),
    ("xit", 1, Name::Exit),
    ("map", 3, Name::Map(MapModes::NORMAL.union(MapModes::VISUAL), false)),
    ("nmap", 2, Name::Map(MapModes::NORMAL, false)),
    ("vmap", 2, Name::Map(MapModes::VISUAL, false)),
    ("imap", 2, Name::Map(MapModes::INSERT, false)),
    ("noremap", 2, Name::Map(MapModes::NORMAL.union(MapModes::VISUAL), true)),
    ("nnoremap", 2, Name::Map(MapModes::NORMAL, true)),
    ("vnoremap", 2, Name::Map(MapModes::VISUAL, true)),
    ("inoremap", 3, Name::Map(MapModes::INSERT, true)),
    ("unmap", 3, Name::Unmap(MapModes::NORMAL.union(MapModes::VISUAL))),
    ("nunmap", 3, Name::Unmap(MapModes::NORMAL)),
    ("vunmap", 2, Name::Unmap(MapModes::VISUAL)),
    ("iunmap", 3, Name::Unmap(MapModes::INSERT)),
];

fn lookup(word: &str) -> Option<Name> {
    NAMES
        .iter()
        .find(|(full, min, _)| word.len() >= *min && full.starts_with(word))
        .map(|&(_, _, name)| name)
}

/// Character cursor over the command text.
struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    text: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            text,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_blanks(&mut self) {
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.pos += 1;
        }
    }

    fn number(&mut self) -> Option<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        // Absurdly large numbers saturate and fail range resolution later.
        Some(digits.parse().unwrap_or(usize::MAX))
    }

    /// Text up to an unescaped `delim`, consuming the delimiter. `\delim`
    /// yields the delimiter; other escapes are kept for the regex engine.
    fn delimited(&mut self, delim: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == delim {
                break;
            }
            if c == '\\' {
                match self.peek() {
                    Some(n) if n == delim => {
                        self.pos += 1;
                        out.push(n);
                        continue;
                    }
                    Some(n) => {
                        self.pos += 1;
                        out.push('\\');
                        out.push(n);
                        continue;
                    }
                    None => {}
                }
            }
            out.push(c);
        }
        out
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }
}

fn parse_offsets(s: &mut Scanner<'_>) -> isize {
    let mut offset: isize = 0;
    loop {
        let sign: isize = match s.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return offset,
        };
        s.pos += 1;
        let n = s.number().unwrap_or(1).min(isize::MAX as usize) as isize;
        offset = offset.saturating_add(sign.saturating_mul(n));
    }
}

fn parse_spec(s: &mut Scanner<'_>) -> Result<Option<LineSpec>, ExError> {
    s.skip_blanks();
    let address = match s.peek() {
        Some(c) if c.is_ascii_digit() => s.number().map(Address::Absolute),
        Some('.') => {
            s.pos += 1;
            Some(Address::Current)
        }
        Some('$') => {
            s.pos += 1;
            Some(Address::Last)
        }
        Some('\'') => {
            s.pos += 1;
            let name = s.bump().ok_or(ExError::InvalidRange)?;
            Some(Address::Mark(name))
        }
        Some(delim @ ('/' | '?')) => {
            s.pos += 1;
            let pattern = s.delimited(delim);
            Some(Address::Search {
                pattern,
                backward: delim == '?',
            })
        }
        _ => None,
    };
    let has_offset = matches!(s.peek(), Some('+' | '-'));
    match (address, has_offset) {
        (None, false) => Ok(None),
        (address, _) => Ok(Some(LineSpec {
            address: address.unwrap_or(Address::Current),
            offset: parse_offsets(s),
        })),
    }
}

fn parse_range(s: &mut Scanner<'_>) -> Result<Option<Range>, ExError> {
    s.skip_blanks();
    if s.eat('%') {
        return Ok(Some(Range {
            start: LineSpec::at(Address::Absolute(1)),
            end: Some(LineSpec::at(Address::Last)),
        }));
    }
    let start = parse_spec(s)?;
    s.skip_blanks();
    if s.eat(',') || s.eat(';') {
        let start = start.unwrap_or(LineSpec::at(Address::Current));
        let end = parse_spec(s)?.unwrap_or(LineSpec::at(Address::Current));
        return Ok(Some(Range {
            start,
            end: Some(end),
        }));
    }
    Ok(start.map(|start| Range { start, end: None }))
}

fn no_trailing(s: &Scanner<'_>) -> Result<(), ExError> {
    let rest = s.rest();
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(ExError::Trailing(rest.trim().to_string()))
    }
}

fn parse_register(s: &mut Scanner<'_>) -> Result<Option<char>, ExError> {
    s.skip_blanks();
    let Some(c) = s.bump() else {
        return Ok(None);
    };
    if !Registers::is_valid_name(c) {
        return Err(ExError::InvalidRegister(c));
    }
    no_trailing(s)?;
    Ok(Some(c))
}

fn parse_mark(s: &mut Scanner<'_>) -> Result<char, ExError> {
    s.skip_blanks();
    let c = s.bump().ok_or(ExError::ArgumentRequired)?;
    if !Marks::is_valid_name(c) {
        return Err(ExError::InvalidMark(c));
    }
    no_trailing(s)?;
    Ok(c)
}

/// Optional file name argument; the rest of the line, trimmed.
fn parse_path(s: &Scanner<'_>) -> Option<String> {
    let rest = s.rest();
    let path = rest.trim();
    (!path.is_empty()).then(|| path.to_string())
}

fn parse_key_arg(word: &str) -> Result<Vec<KeyEvent>, ExError> {
    match parse_keys(word) {
        Ok(keys) if !keys.is_empty() => Ok(keys),
        Ok(_) => Err(ExError::ArgumentRequired),
        Err(_) => Err(ExError::BadKeys(word.to_string())),
    }
}

/// `lhs rhs`: the left-hand side runs to the first blank, the right-hand
/// side is the rest of the line.
fn parse_mapping(s: &mut Scanner<'_>, modes: MapModes, noremap: bool) -> Result<ExCommandKind, ExError> {
    s.skip_blanks();
    let rest = s.rest();
    let (lhs, rhs) = rest.split_once([' ', '\t']).ok_or(ExError::ArgumentRequired)?;
    Ok(ExCommandKind::Map {
        modes,
        lhs: parse_key_arg(lhs)?,
        rhs: parse_key_arg(rhs.trim_start())?,
        noremap,
    })
}

fn parse_substitute(s: &mut Scanner<'_>) -> Result<ExCommandKind, ExError> {
    s.skip_blanks();
    let delim = s.bump().ok_or(ExError::ArgumentRequired)?;
    if delim.is_alphanumeric() || delim == '\\' || delim == '"' {
        return Err(ExError::Trailing(format!("{delim}{}", s.rest())));
    }
    let pattern = s.delimited(delim);
    let replacement = s.delimited(delim);
    let mut global = false;
    while let Some(c) = s.peek() {
        match c {
            'g' => global = true,
            ' ' | '\t' => {}
            _ => break,
        }
        s.pos += 1;
    }
    no_trailing(s)?;
    Ok(ExCommandKind::Substitute {
        pattern,
        replacement,
        global,
    })
}

/// Parse one command line (the text typed after `:`).
pub fn parse(text: &str) -> Result<ExCommand, ExError> {
    let mut s = Scanner::new(text);
    loop {
        s.skip_blanks();
        if !s.eat(':') {
            break;
        }
    }
    let range = parse_range(&mut s)?;
    s.skip_blanks();
    let kind = match s.peek() {
        None => ExCommandKind::Goto,
        Some(dir @ ('>' | '<')) => {
            let mut times = 0;
            while s.eat(dir) {
                times += 1;
                s.skip_blanks();
            }
            no_trailing(&s)?;
            ExCommandKind::Shift {
                right: dir == '>',
                times,
            }
        }
        Some(c) if c.is_ascii_alphabetic() => {
            let start = s.pos;
            while s.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                s.pos += 1;
            }
            let word: String = s.chars[start..s.pos].iter().collect();
            // `kx` sets mark x without a separating blank.
            let (name, inline_mark) = match lookup(&word) {
                Some(name) => (name, None),
                None if word.len() == 2 && word.starts_with('k') => (Name::K, word.chars().nth(1)),
                None => return Err(ExError::Unknown(word)),
            };
            let force = s.eat('!');
            match name {
                Name::Delete => ExCommandKind::Delete {
                    register: parse_register(&mut s)?,
                },
                Name::Yank => ExCommandKind::Yank {
                    register: parse_register(&mut s)?,
                },
                Name::Substitute => parse_substitute(&mut s)?,
                Name::Join => {
                    no_trailing(&s)?;
                    ExCommandKind::Join
                }
                Name::Undo => ExCommandKind::Undo,
                Name::Redo => ExCommandKind::Redo,
                Name::Quit => {
                    no_trailing(&s)?;
                    ExCommandKind::Quit { force }
                }
                Name::Mark | Name::K => match inline_mark {
                    Some(c) if Marks::is_valid_name(c) => {
                        no_trailing(&s)?;
                        ExCommandKind::Mark(c)
                    }
                    Some(c) => return Err(ExError::InvalidMark(c)),
                    None => ExCommandKind::Mark(parse_mark(&mut s)?),
                },
                Name::Fold => ExCommandKind::Fold,
                Name::FoldOpen => ExCommandKind::FoldOpen,
                Name::FoldClose => ExCommandKind::FoldClose,
                Name::Visual => ExCommandKind::Visual,
                Name::Write | Name::WriteQuit | Name::Exit => ExCommandKind::Write {
                    path: parse_path(&s),
                    quit: name != Name::Write,
                    only_if_modified: name == Name::Exit,
                },
                Name::Map(modes, noremap) => parse_mapping(&mut s, modes, noremap)?,
                Name::Unmap(modes) => {
                    s.skip_blanks();
                    let lhs = s.rest();
                    ExCommandKind::Unmap {
                        modes,
                        lhs: parse_key_arg(lhs.trim_end())?,
                    }
                }
            }
        }
        Some(_) => return Err(ExError::Unknown(s.rest())),
    };
    tracing::trace!(target: "actions.ex", text = s.text, ?kind, "parsed");
    Ok(ExCommand { range, kind })
}
