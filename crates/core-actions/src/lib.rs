//! Command layer: binding tables, key translation, dispatch and the
//! [`Editor`] facade.
//!
//! Keys flow through three stages:
//! * [`KeyTranslator`] buffers keys and, in Normal and Visual modes, parses
//!   them against the [`bindings`] tables into a [`ParsedCommand`]. Other
//!   modes receive raw keys.
//! * [`dispatcher::dispatch`] applies one [`Action`] to the model for the
//!   current mode.
//! * [`Editor`] owns the model, the configuration and the render sink, wraps
//!   every key in a paint batch and handles macro recording and replay. It
//!   also applies user mappings to the translator and saves through an
//!   optional [`DocumentWriter`].

use core_config::Config;
use core_events::KeyEvent;
use core_model::ViewOptions;
use core_text::motion::FindKind;

pub mod bindings;
pub mod dispatcher;
pub mod editor;
pub mod key_translator;
pub mod macros;
pub mod writer;

pub use dispatcher::DispatchResult;
pub use editor::Editor;
pub use key_translator::{KeyTranslator, MapModes, UserMapping};
pub use writer::{DocumentWriter, MemoryWriter};

/// Command parsed by the keymap with this crate's command and motion kinds.
pub type ParsedCommand = core_keymap::ParsedCommand<CommandKind, MotionKind>;
pub type ParsedAction = core_keymap::ParsedAction<CommandKind, MotionKind>;

/// Unit of work handed from the translator to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A complete Normal / Visual mode command.
    Command(ParsedCommand),
    /// A raw key for a mode that edits text or the command line.
    Key(KeyEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Delete,
    Change,
    Yank,
    Indent,
    Outdent,
    /// `zf`: create a fold over the lines covered.
    Fold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Operator(OperatorKind),
    DeleteChar,
    DeleteCharBefore,
    DeleteToEnd,
    ChangeToEnd,
    YankLine,
    SubstituteChar,
    SubstituteLine,
    PutAfter,
    PutBefore,
    Undo,
    Redo,
    Join,
    ToggleCase,
    LowerCase,
    UpperCase,
    ReplaceChar,
    Insert,
    Append,
    InsertAtStart,
    AppendAtEnd,
    OpenBelow,
    OpenAbove,
    ReplaceMode,
    Visual,
    VisualLine,
    SwapAnchor,
    ExLine,
    SearchForward,
    SearchBackward,
    SetMark,
    Record,
    Replay,
    Increment,
    Decrement,
    FoldOpen,
    FoldClose,
    FoldToggle,
    FoldDelete,
    FoldEliminate,
    FoldOpenAll,
    FoldCloseAll,
    Repaint,
    Cancel,
    /// User mapping by index; the translator expands it and never emits it.
    Mapped(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    Left,
    Right,
    Up,
    Down,
    /// `gk`: one rendered row up.
    ScreenUp,
    /// `gj`: one rendered row down.
    ScreenDown,
    LineStart,
    FirstNonBlank,
    LineEnd,
    /// `+` / `<ENTER>`.
    NextLineStart,
    /// `-`.
    PrevLineStart,
    WordForward,
    BigWordForward,
    WordBackward,
    BigWordBackward,
    WordEnd,
    BigWordEnd,
    FileStart,
    FileEnd,
    Find(FindKind),
    RepeatFind,
    RepeatFindReverse,
    SearchNext,
    SearchPrev,
    MatchPair,
    ParagraphForward,
    ParagraphBackward,
    /// `'x`: first non-blank of the mark's line.
    MarkLine,
    /// `` `x ``: the mark's exact position.
    MarkExact,
    PageDown,
    PageUp,
}

/// Read-only options snapshot consulted by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Env {
    pub opts: ViewOptions,
    pub shiftwidth: usize,
    pub expandtab: bool,
    pub margin: usize,
}

impl Default for Env {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Env {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            opts: cfg.view_options(),
            shiftwidth: cfg.shiftwidth(),
            expandtab: cfg.expandtab(),
            margin: cfg.scroll_margin(),
        }
    }
}
