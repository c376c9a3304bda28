//! Built-in binding tables.
//!
//! Motions are shared between Normal and Visual mode and double as operator
//! targets. Commands differ per mode: in Visual mode operators take no motion
//! and act on the selection instead.

use crate::{CommandKind as C, MotionKind as M, OperatorKind as Op};
use core_events::{KeyCode, KeyEvent};
use core_keymap::{ArgShape, MappingSpec};
use core_text::motion::FindKind;

fn chars(s: &str) -> Vec<KeyEvent> {
    s.chars().map(KeyEvent::char).collect()
}

fn on<T>(keys: &str, arg: ArgShape, out: T) -> MappingSpec<T> {
    MappingSpec::new(chars(keys), arg, out)
}

fn plain<T>(keys: &str, out: T) -> MappingSpec<T> {
    on(keys, ArgShape::None, out)
}

fn key<T>(code: KeyCode, out: T) -> MappingSpec<T> {
    MappingSpec::new(vec![KeyEvent::plain(code)], ArgShape::None, out)
}

fn ctrl<T>(c: char, out: T) -> MappingSpec<T> {
    MappingSpec::new(vec![KeyEvent::ctrl(c)], ArgShape::None, out)
}

pub fn motions() -> Vec<MappingSpec<M>> {
    vec![
        plain("h", M::Left),
        key(KeyCode::Left, M::Left),
        key(KeyCode::Backspace, M::Left),
        plain("l", M::Right),
        plain(" ", M::Right),
        key(KeyCode::Right, M::Right),
        plain("j", M::Down),
        key(KeyCode::Down, M::Down),
        plain("k", M::Up),
        key(KeyCode::Up, M::Up),
        plain("gj", M::ScreenDown),
        plain("gk", M::ScreenUp),
        plain("0", M::LineStart),
        key(KeyCode::Home, M::LineStart),
        plain("^", M::FirstNonBlank),
        plain("$", M::LineEnd),
        key(KeyCode::End, M::LineEnd),
        plain("+", M::NextLineStart),
        key(KeyCode::Enter, M::NextLineStart),
        plain("-", M::PrevLineStart),
        plain("w", M::WordForward),
        plain("W", M::BigWordForward),
        plain("b", M::WordBackward),
        plain("B", M::BigWordBackward),
        plain("e", M::WordEnd),
        plain("E", M::BigWordEnd),
        plain("gg", M::FileStart),
        plain("G", M::FileEnd),
        on("f", ArgShape::Char, M::Find(FindKind::Forward)),
        on("F", ArgShape::Char, M::Find(FindKind::Backward)),
        on("t", ArgShape::Char, M::Find(FindKind::TillForward)),
        on("T", ArgShape::Char, M::Find(FindKind::TillBackward)),
        plain(";", M::RepeatFind),
        plain(",", M::RepeatFindReverse),
        plain("n", M::SearchNext),
        plain("N", M::SearchPrev),
        plain("%", M::MatchPair),
        plain("}", M::ParagraphForward),
        plain("{", M::ParagraphBackward),
        on("'", ArgShape::Mark, M::MarkLine),
        on("`", ArgShape::Mark, M::MarkExact),
        key(KeyCode::PageDown, M::PageDown),
        ctrl('f', M::PageDown),
        key(KeyCode::PageUp, M::PageUp),
        ctrl('b', M::PageUp),
    ]
}

pub fn normal_commands() -> Vec<MappingSpec<C>> {
    vec![
        on("d", ArgShape::Motion, C::Operator(Op::Delete)),
        on("c", ArgShape::Motion, C::Operator(Op::Change)),
        on("y", ArgShape::Motion, C::Operator(Op::Yank)),
        on(">", ArgShape::Motion, C::Operator(Op::Indent)),
        on("<", ArgShape::Motion, C::Operator(Op::Outdent)),
        on("zf", ArgShape::Motion, C::Operator(Op::Fold)),
        plain("x", C::DeleteChar),
        key(KeyCode::Delete, C::DeleteChar),
        plain("X", C::DeleteCharBefore),
        plain("D", C::DeleteToEnd),
        plain("C", C::ChangeToEnd),
        plain("Y", C::YankLine),
        plain("s", C::SubstituteChar),
        plain("S", C::SubstituteLine),
        plain("p", C::PutAfter),
        plain("P", C::PutBefore),
        plain("u", C::Undo),
        ctrl('r', C::Redo),
        plain("J", C::Join),
        plain("~", C::ToggleCase),
        on("r", ArgShape::Char, C::ReplaceChar),
        plain("i", C::Insert),
        plain("a", C::Append),
        plain("I", C::InsertAtStart),
        plain("A", C::AppendAtEnd),
        plain("o", C::OpenBelow),
        plain("O", C::OpenAbove),
        plain("R", C::ReplaceMode),
        plain("v", C::Visual),
        plain("V", C::VisualLine),
        plain(":", C::ExLine),
        plain("/", C::SearchForward),
        plain("?", C::SearchBackward),
        on("m", ArgShape::Mark, C::SetMark),
        on("q", ArgShape::Register, C::Record),
        on("@", ArgShape::Register, C::Replay),
        ctrl('a', C::Increment),
        ctrl('x', C::Decrement),
        plain("zo", C::FoldOpen),
        plain("zc", C::FoldClose),
        plain("za", C::FoldToggle),
        plain("zd", C::FoldDelete),
        plain("zE", C::FoldEliminate),
        plain("zR", C::FoldOpenAll),
        plain("zM", C::FoldCloseAll),
        ctrl('l', C::Repaint),
        key(KeyCode::Esc, C::Cancel),
    ]
}

pub fn visual_commands() -> Vec<MappingSpec<C>> {
    vec![
        plain("d", C::Operator(Op::Delete)),
        plain("x", C::Operator(Op::Delete)),
        key(KeyCode::Delete, C::Operator(Op::Delete)),
        plain("y", C::Operator(Op::Yank)),
        plain("c", C::Operator(Op::Change)),
        plain("s", C::Operator(Op::Change)),
        plain(">", C::Operator(Op::Indent)),
        plain("<", C::Operator(Op::Outdent)),
        plain("zf", C::Operator(Op::Fold)),
        plain("J", C::Join),
        plain("~", C::ToggleCase),
        plain("u", C::LowerCase),
        plain("U", C::UpperCase),
        plain("o", C::SwapAnchor),
        plain(":", C::ExLine),
        plain("v", C::Visual),
        plain("V", C::VisualLine),
        ctrl('l', C::Repaint),
        key(KeyCode::Esc, C::Cancel),
    ]
}
