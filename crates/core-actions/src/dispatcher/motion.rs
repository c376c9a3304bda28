//! Motion evaluation.
//!
//! [`evaluate`] computes where a motion lands without moving the caret, so the
//! same code drives plain cursor movement, selection extension and operator
//! targets. Vertical motions run on a scratch copy of the view to reuse the
//! projector's fold landing and sticky column rules.

use super::{Cx, DispatchResult, search};
use crate::MotionKind;
use core_model::{StickyColumn, ViewCursor};
use core_text::Position;
use core_text::motion::{
    self as text_motion, FindKind, find_in_line, first_non_blank, matching_pair, paragraph_backward,
    paragraph_forward,
};
use tracing::trace;

/// How an operator treats the text between the caret and the landing point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Span {
    /// `[start, end)`.
    Exclusive,
    /// `[start, end]`.
    Inclusive,
    /// Whole lines from start to end.
    Linewise,
}

#[derive(Debug, Clone, Copy)]
enum Landing {
    /// Plain position; the sticky column follows it.
    At(Position),
    /// `$`: the sticky column becomes end-of-line.
    LineEnd(Position),
    /// Result of a vertical move computed on a scratch view.
    Probe {
        caret: ViewCursor,
        sticky: Option<StickyColumn>,
        scroll: ViewCursor,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Motion {
    pub target: Position,
    pub span: Span,
    landing: Landing,
}

impl Motion {
    fn at(target: Position, span: Span) -> Self {
        Self {
            target,
            span,
            landing: Landing::At(target),
        }
    }
}

/// Whether jumping with `kind` records the previous position in the `'` mark.
fn is_jump(kind: MotionKind) -> bool {
    matches!(
        kind,
        MotionKind::FileStart
            | MotionKind::FileEnd
            | MotionKind::SearchNext
            | MotionKind::SearchPrev
            | MotionKind::MatchPair
            | MotionKind::MarkLine
            | MotionKind::MarkExact
            | MotionKind::ParagraphForward
            | MotionKind::ParagraphBackward
    )
}

fn find_span(kind: FindKind) -> Span {
    if kind.is_forward() {
        Span::Inclusive
    } else {
        Span::Exclusive
    }
}

/// Where `kind` lands from the caret. `for_operator` lets `l` reach the
/// position past the last character so `dl` / `x` can take it.
pub(crate) fn evaluate(
    cx: &mut Cx<'_>,
    kind: MotionKind,
    count: Option<u32>,
    arg: Option<char>,
    for_operator: bool,
) -> Option<Motion> {
    let n = count.unwrap_or(1).max(1) as usize;
    let caret = cx.caret();
    let buf = cx.state.document.buffer();
    let last = buf.last_line();
    let len = buf.line_len(caret.line);
    let text = buf.line_text(caret.line).unwrap_or_default();
    let motion = match kind {
        MotionKind::Left => {
            if caret.col == 0 {
                return None;
            }
            Motion::at(Position::new(caret.line, caret.col.saturating_sub(n)), Span::Exclusive)
        }
        MotionKind::Right => {
            let max = if cx.edit() || for_operator {
                len
            } else {
                len.saturating_sub(1)
            };
            if caret.col >= max {
                return None;
            }
            Motion::at(Position::new(caret.line, (caret.col + n).min(max)), Span::Exclusive)
        }
        MotionKind::Down | MotionKind::Up => {
            let delta = if kind == MotionKind::Down { n as isize } else { -(n as isize) };
            probe(cx, Span::Linewise, |view, buf, opts, edit| view.move_lines(buf, opts, edit, delta))?
        }
        MotionKind::ScreenDown | MotionKind::ScreenUp => {
            let delta = if kind == MotionKind::ScreenDown { n as isize } else { -(n as isize) };
            probe(cx, Span::Exclusive, |view, buf, opts, edit| view.move_rows(buf, opts, edit, delta))?
        }
        MotionKind::PageDown | MotionKind::PageUp => {
            let forward = kind == MotionKind::PageDown;
            probe(cx, Span::Linewise, |view, buf, opts, edit| {
                let before = view.caret_pos();
                view.page(buf, opts, edit, forward, n);
                view.caret_pos() != before
            })?
        }
        MotionKind::LineStart => Motion::at(Position::new(caret.line, 0), Span::Exclusive),
        MotionKind::FirstNonBlank => {
            Motion::at(Position::new(caret.line, first_non_blank(buf, caret.line)), Span::Exclusive)
        }
        MotionKind::LineEnd => {
            let line = caret.line + n - 1;
            if line > last {
                return None;
            }
            let target = Position::new(line, buf.line_len(line).saturating_sub(1));
            Motion {
                target,
                span: Span::Inclusive,
                landing: Landing::LineEnd(target),
            }
        }
        MotionKind::NextLineStart => {
            let line = caret.line + n;
            if line > last {
                return None;
            }
            Motion::at(Position::new(line, first_non_blank(buf, line)), Span::Linewise)
        }
        MotionKind::PrevLineStart => {
            let line = caret.line.checked_sub(n)?;
            Motion::at(Position::new(line, first_non_blank(buf, line)), Span::Linewise)
        }
        MotionKind::WordForward
        | MotionKind::BigWordForward
        | MotionKind::WordBackward
        | MotionKind::BigWordBackward
        | MotionKind::WordEnd
        | MotionKind::BigWordEnd => {
            let big = matches!(
                kind,
                MotionKind::BigWordForward | MotionKind::BigWordBackward | MotionKind::BigWordEnd
            );
            let mut pos = caret;
            for _ in 0..n {
                match kind {
                    MotionKind::WordForward | MotionKind::BigWordForward => {
                        text_motion::word_forward(buf, &mut pos, big)
                    }
                    MotionKind::WordBackward | MotionKind::BigWordBackward => {
                        text_motion::word_backward(buf, &mut pos, big)
                    }
                    _ => text_motion::word_end(buf, &mut pos, big),
                }
            }
            if pos == caret {
                return None;
            }
            let span = if matches!(kind, MotionKind::WordEnd | MotionKind::BigWordEnd) {
                Span::Inclusive
            } else {
                Span::Exclusive
            };
            Motion::at(pos, span)
        }
        MotionKind::FileStart | MotionKind::FileEnd => {
            let line = match count {
                Some(c) => (c as usize).saturating_sub(1).min(last),
                None if kind == MotionKind::FileStart => 0,
                None => last,
            };
            Motion::at(Position::new(line, first_non_blank(buf, line)), Span::Linewise)
        }
        MotionKind::Find(find) => {
            let target = arg?;
            cx.state.last_find = Some((find, target));
            let col = find_in_line(text, caret.col, target, find, n, false)?;
            Motion::at(Position::new(caret.line, col), find_span(find))
        }
        MotionKind::RepeatFind | MotionKind::RepeatFindReverse => {
            let (find, target) = cx.state.last_find?;
            let find = if kind == MotionKind::RepeatFindReverse {
                find.reversed()
            } else {
                find
            };
            let col = find_in_line(text, caret.col, target, find, n, true)?;
            Motion::at(Position::new(caret.line, col), find_span(find))
        }
        MotionKind::SearchNext | MotionKind::SearchPrev => {
            let target = search::repeat(cx, kind == MotionKind::SearchPrev, n)?;
            Motion::at(target, Span::Exclusive)
        }
        MotionKind::MatchPair => Motion::at(matching_pair(buf, &caret)?, Span::Inclusive),
        MotionKind::ParagraphForward | MotionKind::ParagraphBackward => {
            let mut line = caret.line;
            for _ in 0..n {
                line = if kind == MotionKind::ParagraphForward {
                    paragraph_forward(buf, line)
                } else {
                    paragraph_backward(buf, line)
                };
            }
            // Without a blank line to stop at, `}` runs to the end of the buffer.
            let col = if kind == MotionKind::ParagraphForward && line == last && buf.line_len(line) > 0 {
                buf.line_len(line).saturating_sub(1)
            } else {
                0
            };
            let target = Position::new(line, col);
            if target == caret {
                return None;
            }
            let span = if col > 0 { Span::Inclusive } else { Span::Exclusive };
            Motion::at(target, span)
        }
        MotionKind::MarkLine | MotionKind::MarkExact => {
            let name = arg?;
            let Some(pos) = cx.state.marks.get(name) else {
                cx.report(format!("Mark not set: {name}"));
                return None;
            };
            let pos = cx.buffer().clamp(pos);
            if kind == MotionKind::MarkLine {
                let col = first_non_blank(cx.buffer(), pos.line);
                Motion::at(Position::new(pos.line, col), Span::Linewise)
            } else {
                Motion::at(pos, Span::Exclusive)
            }
        }
    };
    trace!(target: "actions.dispatch", ?kind, target = ?motion.target, span = ?motion.span, "motion");
    Some(motion)
}

/// Run a vertical move on a copy of the view and capture the result.
fn probe(
    cx: &mut Cx<'_>,
    span: Span,
    f: impl FnOnce(&mut core_model::View, &core_text::Buffer, core_model::ViewOptions, bool) -> bool,
) -> Option<Motion> {
    let edit = cx.edit();
    let mut scratch = cx.view.clone();
    if !f(&mut scratch, cx.state.document.buffer(), cx.env.opts, edit) {
        return None;
    }
    Some(Motion {
        target: scratch.caret.buffer,
        span,
        landing: Landing::Probe {
            caret: scratch.caret,
            sticky: scratch.sticky,
            scroll: scratch.scroll,
        },
    })
}

/// Move the caret to the motion's landing point.
pub(crate) fn apply(cx: &mut Cx<'_>, motion: &Motion) {
    match motion.landing {
        Landing::At(pos) => cx.set_caret(pos),
        Landing::LineEnd(pos) => {
            cx.set_caret(pos);
            cx.view.set_sticky_eol();
        }
        Landing::Probe { caret, sticky, scroll } => {
            cx.view.caret = caret;
            cx.view.sticky = sticky;
            cx.view.scroll = scroll;
        }
    }
}

/// Plain cursor motion (Normal and Visual modes).
pub(crate) fn handle(cx: &mut Cx<'_>, kind: MotionKind, count: Option<u32>, arg: Option<char>) -> DispatchResult {
    let before = cx.caret();
    let Some(motion) = evaluate(cx, kind, count, arg, false) else {
        trace!(target: "actions.dispatch", ?kind, "motion_failed");
        return DispatchResult::clean();
    };
    if is_jump(kind) {
        cx.state.marks.set('\'', before);
    }
    apply(cx, &motion);
    let after = cx.caret();
    if cx.state.mode().is_sel_mode() {
        let (lo, hi) = if before.line <= after.line {
            (before.line, after.line)
        } else {
            (after.line, before.line)
        };
        cx.view.paint.damage_lines(lo, hi + 1);
    }
    DispatchResult::dirty()
}
