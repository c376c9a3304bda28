//! Insert and Replace mode keys.

use super::{Cx, DispatchResult, completion, mode};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_state::Mode;
use core_text::Position;
use core_text::width::{tab_advance, virtual_col};
use tracing::trace;

pub(crate) fn handle_key(key: KeyEvent, cx: &mut Cx<'_>) -> DispatchResult {
    let caret = cx.caret();
    let replace = cx.state.mode() == Mode::Replace;
    if key.mods.contains(KeyModifiers::CTRL) {
        return match key.code {
            KeyCode::Char('n') => completion::start(cx, true),
            KeyCode::Char('p') => completion::start(cx, false),
            _ => DispatchResult::clean(),
        };
    }
    match key.code {
        KeyCode::Esc => mode::pop(cx),
        KeyCode::Enter => {
            cx.state.document.insert_new_line(caret.col, caret.line);
            cx.set_caret(Position::new(caret.line + 1, 0));
            DispatchResult::dirty()
        }
        KeyCode::Backspace => backspace(cx, caret, replace),
        KeyCode::Delete => {
            let len = cx.buffer().line_len(caret.line);
            let changed = if caret.col < len {
                cx.state.document.delete_char(caret.col, caret.line, 1).is_some()
            } else {
                cx.state.document.join_lines(caret.line, "")
            };
            cx.set_caret(caret);
            DispatchResult::from_changed(changed)
        }
        KeyCode::Tab => {
            let text = if cx.env.expandtab {
                let line = cx.buffer().line_text(caret.line).unwrap_or_default();
                let vcol = virtual_col(line, caret.col, cx.env.opts.tab_width);
                " ".repeat(tab_advance(vcol, cx.env.opts.tab_width))
            } else {
                "\t".to_string()
            };
            type_text(cx, caret, &text, replace)
        }
        KeyCode::Left => {
            cx.set_caret(Position::new(caret.line, caret.col.saturating_sub(1)));
            DispatchResult::dirty()
        }
        KeyCode::Right => {
            cx.set_caret(Position::new(caret.line, caret.col + 1));
            DispatchResult::dirty()
        }
        KeyCode::Up | KeyCode::Down => {
            let delta = if key.code == KeyCode::Up { -1 } else { 1 };
            let moved = cx
                .view
                .move_lines(cx.state.document.buffer(), cx.env.opts, true, delta);
            DispatchResult::from_changed(moved)
        }
        KeyCode::Home => {
            cx.set_caret(Position::new(caret.line, 0));
            DispatchResult::dirty()
        }
        KeyCode::End => {
            let len = cx.buffer().line_len(caret.line);
            cx.set_caret(Position::new(caret.line, len));
            cx.view.set_sticky_eol();
            DispatchResult::dirty()
        }
        KeyCode::PageUp | KeyCode::PageDown => {
            let forward = key.code == KeyCode::PageDown;
            cx.view
                .page(cx.state.document.buffer(), cx.env.opts, true, forward, 1);
            DispatchResult::dirty()
        }
        KeyCode::Char(c) => type_text(cx, caret, &c.to_string(), replace),
    }
}

fn type_text(cx: &mut Cx<'_>, caret: Position, text: &str, replace: bool) -> DispatchResult {
    let n = text.chars().count();
    if replace {
        let len = cx.buffer().line_len(caret.line);
        let over = n.min(len.saturating_sub(caret.col));
        if over > 0 {
            cx.state.document.delete_char(caret.col, caret.line, over);
        }
    }
    if !cx.state.document.insert_char(caret.col, caret.line, text) {
        return DispatchResult::clean();
    }
    trace!(target: "actions.dispatch", col = caret.col, line = caret.line, replace, "typed");
    cx.set_caret(Position::new(caret.line, caret.col + n));
    DispatchResult::dirty()
}

fn backspace(cx: &mut Cx<'_>, caret: Position, replace: bool) -> DispatchResult {
    if replace {
        if caret.col == 0 {
            return DispatchResult::clean();
        }
        cx.set_caret(Position::new(caret.line, caret.col - 1));
        return DispatchResult::dirty();
    }
    if caret.col > 0 {
        cx.state.document.delete_char(caret.col - 1, caret.line, 1);
        cx.set_caret(Position::new(caret.line, caret.col - 1));
        return DispatchResult::dirty();
    }
    let Some(prev) = caret.line.checked_sub(1) else {
        return DispatchResult::clean();
    };
    let prev_len = cx.buffer().line_len(prev);
    cx.state.document.join_lines(prev, "");
    cx.set_caret(Position::new(prev, prev_len));
    DispatchResult::dirty()
}
