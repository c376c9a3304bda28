//! core-keymap: key sequence tables and the normal-mode command parser.
//!
//! Two layers:
//! - [`MappingTrie`] compiles `(key sequence, output)` pairs into a trie with
//!   inline edge storage and resolves the longest match of a pending buffer.
//! - [`CommandParser`] composes a complete command out of the pending buffer:
//!   register prefix, counts, the command itself, an operator's motion and a
//!   trailing character or mark argument.
//!
//! Parsing is pure: it depends only on the pending keys and the tables, so a
//! caller keeps the buffer, re-parses it after every key and consumes exactly
//! the keys a finished command reports. Logging is TRACE for trie traversal
//! (`input.map`) and DEBUG for parse decisions (`input.context`).

use core_events::{KeyEvent, KeyNotationError, parse_keys};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Counts saturate here instead of overflowing.
pub const COUNT_MAX: u32 = 999_999;

// -------------------------------------------------------------------------------------------------
// Mapping Specification
// -------------------------------------------------------------------------------------------------

/// What has to follow a table entry before the command is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgShape {
    #[default]
    None,
    /// Operator: a motion (or the doubled operator key) follows.
    Motion,
    /// One literal character (`f`, `t`, `r`).
    Char,
    /// One mark name (`m`, `'`, `` ` ``).
    Mark,
    /// One register name (`q`, `@`).
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSpec<T> {
    pub sequence: Vec<KeyEvent>,
    pub arg: ArgShape,
    pub output: T,
}

impl<T> MappingSpec<T> {
    pub fn new(sequence: Vec<KeyEvent>, arg: ArgShape, output: T) -> Self {
        Self {
            sequence,
            arg,
            output,
        }
    }

    /// Build a spec from key notation such as `"gg"` or `"<CTRL>f"`.
    pub fn parse(notation: &str, arg: ArgShape, output: T) -> Result<Self, KeyNotationError> {
        Ok(Self::new(parse_keys(notation)?, arg, output))
    }
}

// -------------------------------------------------------------------------------------------------
// Trie Representation
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone)]
struct Edge {
    key: KeyEvent,
    next: usize,
}

#[derive(Debug, Clone)]
struct Node {
    terminal: Option<usize>, // index into mappings vec
    edges: SmallVec<[Edge; 4]>,
}

impl Node {
    fn new() -> Self {
        Self {
            terminal: None,
            edges: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingTrie<T> {
    nodes: Vec<Node>,
    mappings: Vec<MappingSpec<T>>,
}

impl<T> Default for MappingTrie<T> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::new()],
            mappings: Vec::new(),
        }
    }
}

impl<T: Clone> MappingTrie<T> {
    pub fn build(specs: Vec<MappingSpec<T>>) -> Self {
        let mut trie = MappingTrie {
            nodes: vec![Node::new()],
            mappings: specs,
        };
        for (idx, m) in trie.mappings.iter().enumerate() {
            let mut cur = 0usize;
            for key in &m.sequence {
                let next = if let Some(e) = trie.nodes[cur].edges.iter().find(|e| e.key == *key) {
                    e.next
                } else {
                    let new_idx = trie.nodes.len();
                    trie.nodes.push(Node::new());
                    trie.nodes[cur].edges.push(Edge {
                        key: *key,
                        next: new_idx,
                    });
                    new_idx
                };
                cur = next;
            }
            if trie.nodes[cur].terminal.is_some() {
                // Later entries override earlier ones.
                trace!(target: "input.map", mapping_index = idx, node = cur, "terminal_override");
            }
            trie.nodes[cur].terminal = Some(idx);
        }
        trie
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Longest entry matching a prefix of `buffer`.
    ///
    /// `ambiguous` is set when the walk consumed the whole buffer and the
    /// node reached still has children: a longer entry may yet match.
    pub fn resolve(&self, buffer: &[KeyEvent]) -> Resolution<T> {
        let mut node_idx = 0usize;
        let mut walked = 0usize;
        let mut last_terminal: Option<(usize, usize)> = None; // (consumed, mapping index)
        for (i, key) in buffer.iter().enumerate() {
            let Some(edge) = self.nodes[node_idx].edges.iter().find(|e| e.key == *key) else {
                break;
            };
            node_idx = edge.next;
            walked = i + 1;
            trace!(target: "input.map", step = i, key = %key, node = node_idx, "advance");
            if let Some(mi) = self.nodes[node_idx].terminal {
                last_terminal = Some((i + 1, mi));
            }
        }
        let open = walked == buffer.len() && !self.nodes[node_idx].edges.is_empty();
        match last_terminal {
            Some((consumed, mi)) => {
                let spec = &self.mappings[mi];
                Resolution::Matched {
                    consumed,
                    output: spec.output.clone(),
                    arg: spec.arg,
                    last_key: spec.sequence.last().copied(),
                    ambiguous: open,
                }
            }
            None if open || buffer.is_empty() => Resolution::NeedMore,
            None => Resolution::NoMatch,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Resolution Result
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Matched {
        consumed: usize,
        output: T,
        arg: ArgShape,
        last_key: Option<KeyEvent>,
        ambiguous: bool,
    },
    /// Strict prefix of one or more entries.
    NeedMore,
    NoMatch,
}

// -------------------------------------------------------------------------------------------------
// Parsed Commands
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAction<C, M> {
    /// A bare motion; moves the caret (or extends a visual selection).
    Motion { motion: M, arg: Option<char> },
    /// A command that is not an operator, with its argument if it takes one.
    Command { command: C, arg: Option<char> },
    /// Operator applied to the span of a motion.
    Operator {
        op: C,
        motion: M,
        motion_arg: Option<char>,
    },
    /// Doubled operator (`dd`, `>>`): operates on whole lines.
    Linewise { op: C },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<C, M> {
    pub register: Option<char>,
    /// Product of the counts typed before and after an operator; `None` when
    /// no count was typed.
    pub count: Option<u32>,
    pub action: ParsedAction<C, M>,
}

impl<C, M> ParsedCommand<C, M> {
    /// Effective repetition count (1 when none was typed).
    pub fn count_or_one(&self) -> u32 {
        self.count.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<C, M> {
    /// A command is complete; the first `consumed` keys belong to it.
    Complete {
        command: ParsedCommand<C, M>,
        consumed: usize,
    },
    /// The keys so far are a valid prefix.
    Pending,
    /// `shorter` is complete but a longer entry may still match. The caller
    /// keeps waiting for the next key or the timeout.
    Ambiguous {
        shorter: ParsedCommand<C, M>,
        consumed: usize,
    },
    /// The keys cannot start any command; drop the first `consumed`.
    NoMatch { consumed: usize },
}

/// Top-level table entry: normal commands and motions share one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<C, M> {
    Command(C),
    Motion(M),
}

enum Step<C, M> {
    Done(ParsedAction<C, M>, usize, bool),
    NeedMore,
    Fail(usize),
}

enum ArgStep {
    Ready(usize),
    NeedMore,
    Fail(usize),
}

// -------------------------------------------------------------------------------------------------
// PendingContext: register and count prefix accumulated ahead of a command
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingContext {
    pub register: Option<char>,
    pub count_prefix: Option<u32>,
    pub post_op_count: Option<u32>,
}

impl PendingContext {
    /// Combined count: the two counts multiply, saturating at [`COUNT_MAX`].
    pub fn total_count(&self) -> Option<u32> {
        match (self.count_prefix, self.post_op_count) {
            (None, None) => None,
            (Some(a), None) | (None, Some(a)) => Some(a),
            (Some(a), Some(b)) => Some(a.saturating_mul(b).min(COUNT_MAX)),
        }
    }
}

fn push_digit(count: Option<u32>, d: u32) -> u32 {
    count
        .unwrap_or(0)
        .saturating_mul(10)
        .saturating_add(d)
        .min(COUNT_MAX)
}

/// Digit continuing (or, for 1-9, starting) a count.
fn count_digit(key: &KeyEvent, started: bool) -> Option<u32> {
    let d = key.printable()?.to_digit(10)?;
    (d != 0 || started).then_some(d)
}

// -------------------------------------------------------------------------------------------------
// Command Parser
// -------------------------------------------------------------------------------------------------

/// Parser for one input context (normal or visual mode).
#[derive(Debug, Clone)]
pub struct CommandParser<C, M> {
    entries: MappingTrie<Entry<C, M>>,
    motions: MappingTrie<M>,
}

impl<C: Clone, M: Clone> CommandParser<C, M> {
    pub fn new(commands: Vec<MappingSpec<C>>, motions: Vec<MappingSpec<M>>) -> Self {
        let mut all: Vec<MappingSpec<Entry<C, M>>> = motions
            .iter()
            .map(|m| MappingSpec::new(m.sequence.clone(), m.arg, Entry::Motion(m.output.clone())))
            .collect();
        // Commands come last so they win over a motion bound to the same keys.
        all.extend(
            commands
                .into_iter()
                .map(|c| MappingSpec::new(c.sequence, c.arg, Entry::Command(c.output))),
        );
        Self {
            entries: MappingTrie::build(all),
            motions: MappingTrie::build(motions),
        }
    }

    /// Parse the pending buffer. With `expired` set, an ambiguous shorter
    /// match is committed instead of waiting for more keys.
    pub fn parse(&self, keys: &[KeyEvent], expired: bool) -> ParseOutcome<C, M> {
        let mut ctx = PendingContext::default();
        let mut i = 0usize;
        while i < keys.len() {
            let key = keys[i];
            if key.printable() == Some('"') {
                let Some(name) = keys.get(i + 1) else {
                    return ParseOutcome::Pending;
                };
                match name.printable() {
                    Some(c) => ctx.register = Some(c),
                    None => return ParseOutcome::NoMatch { consumed: i + 2 },
                }
                i += 2;
            } else if let Some(d) = count_digit(&key, ctx.count_prefix.is_some()) {
                ctx.count_prefix = Some(push_digit(ctx.count_prefix, d));
                i += 1;
            } else {
                break;
            }
        }
        if i == keys.len() {
            return ParseOutcome::Pending;
        }

        let step = match self.entries.resolve(&keys[i..]) {
            Resolution::NoMatch => Step::Fail(i + 1),
            Resolution::NeedMore => Step::NeedMore,
            Resolution::Matched {
                consumed,
                output,
                arg,
                last_key,
                ambiguous,
            } => {
                let j = i + consumed;
                match output {
                    Entry::Motion(motion) => match Self::take_arg(keys, j, arg) {
                        ArgStep::Ready(end) => Step::Done(
                            ParsedAction::Motion {
                                motion,
                                arg: arg_char(keys, j, arg),
                            },
                            end,
                            ambiguous,
                        ),
                        ArgStep::NeedMore => Step::NeedMore,
                        ArgStep::Fail(end) => Step::Fail(end),
                    },
                    Entry::Command(command) if arg == ArgShape::Motion => {
                        // Only single-key operators double into a linewise form.
                        let doubled = last_key.filter(|_| consumed == 1);
                        match self.operator_target(keys, j, command, doubled, &mut ctx) {
                            Step::Done(action, end, amb) => Step::Done(action, end, amb || ambiguous),
                            other => other,
                        }
                    }
                    Entry::Command(command) => match Self::take_arg(keys, j, arg) {
                        ArgStep::Ready(end) => Step::Done(
                            ParsedAction::Command {
                                command,
                                arg: arg_char(keys, j, arg),
                            },
                            end,
                            ambiguous,
                        ),
                        ArgStep::NeedMore => Step::NeedMore,
                        ArgStep::Fail(end) => Step::Fail(end),
                    },
                }
            }
        };

        match step {
            Step::NeedMore => ParseOutcome::Pending,
            Step::Fail(consumed) => {
                debug!(target: "input.context", consumed, "no_match");
                ParseOutcome::NoMatch { consumed }
            }
            Step::Done(action, consumed, ambiguous) => {
                let command = ParsedCommand {
                    register: ctx.register,
                    count: ctx.total_count(),
                    action,
                };
                if ambiguous && !expired {
                    debug!(target: "input.context", consumed, "ambiguous_wait");
                    ParseOutcome::Ambiguous {
                        shorter: command,
                        consumed,
                    }
                } else {
                    debug!(target: "input.context", consumed, count = ?command.count, register = ?command.register, "complete");
                    ParseOutcome::Complete { command, consumed }
                }
            }
        }
    }

    fn take_arg(keys: &[KeyEvent], j: usize, arg: ArgShape) -> ArgStep {
        match arg {
            ArgShape::None | ArgShape::Motion => ArgStep::Ready(j),
            ArgShape::Char | ArgShape::Mark | ArgShape::Register if j >= keys.len() => {
                ArgStep::NeedMore
            }
            ArgShape::Char | ArgShape::Mark | ArgShape::Register => match arg_char(keys, j, arg) {
                Some(_) => ArgStep::Ready(j + 1),
                // <ESC> or a control key cancels the command.
                None => ArgStep::Fail(j + 1),
            },
        }
    }

    /// Motion (or doubled key) following an operator at `keys[j..]`.
    fn operator_target(
        &self,
        keys: &[KeyEvent],
        mut j: usize,
        op: C,
        doubled: Option<KeyEvent>,
        ctx: &mut PendingContext,
    ) -> Step<C, M> {
        while let Some(d) = keys.get(j).and_then(|k| count_digit(k, ctx.post_op_count.is_some())) {
            ctx.post_op_count = Some(push_digit(ctx.post_op_count, d));
            j += 1;
        }
        let Some(next) = keys.get(j) else {
            return Step::NeedMore;
        };
        if Some(*next) == doubled {
            return Step::Done(ParsedAction::Linewise { op }, j + 1, false);
        }
        match self.motions.resolve(&keys[j..]) {
            Resolution::NoMatch => Step::Fail(j + 1),
            Resolution::NeedMore => Step::NeedMore,
            Resolution::Matched {
                consumed,
                output,
                arg,
                ambiguous,
                ..
            } => {
                let k = j + consumed;
                match Self::take_arg(keys, k, arg) {
                    ArgStep::Ready(end) => Step::Done(
                        ParsedAction::Operator {
                            op,
                            motion: output,
                            motion_arg: arg_char(keys, k, arg),
                        },
                        end,
                        ambiguous,
                    ),
                    ArgStep::NeedMore => Step::NeedMore,
                    ArgStep::Fail(end) => Step::Fail(end),
                }
            }
        }
    }
}

fn arg_char(keys: &[KeyEvent], j: usize, arg: ArgShape) -> Option<char> {
    match arg {
        ArgShape::Char | ArgShape::Mark | ArgShape::Register => keys.get(j).and_then(|k| match k.code {
            core_events::KeyCode::Tab => Some('\t'),
            _ => k.printable(),
        }),
        ArgShape::None | ArgShape::Motion => None,
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        Delete,
        Yank,
        Fold,
        Put,
        SetMark,
        Replace,
        Record,
        Scroll,
        ScrollTop,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mot {
        WordForward,
        LineStart,
        FileStart,
        FindForward,
        GotoMark,
        Down,
    }

    fn s<T>(n: &str, a: ArgShape, c: T) -> MappingSpec<T> {
        MappingSpec::parse(n, a, c).unwrap()
    }

    fn parser() -> CommandParser<Cmd, Mot> {
        let commands = vec![
            s("d", ArgShape::Motion, Cmd::Delete),
            s("y", ArgShape::Motion, Cmd::Yank),
            s("zf", ArgShape::Motion, Cmd::Fold),
            s("p", ArgShape::None, Cmd::Put),
            s("m", ArgShape::Mark, Cmd::SetMark),
            s("r", ArgShape::Char, Cmd::Replace),
            s("q", ArgShape::Register, Cmd::Record),
            s("z", ArgShape::None, Cmd::Scroll),
            s("zt", ArgShape::None, Cmd::ScrollTop),
        ];
        let motions = vec![
            s("w", ArgShape::None, Mot::WordForward),
            s("0", ArgShape::None, Mot::LineStart),
            s("gg", ArgShape::None, Mot::FileStart),
            s("f", ArgShape::Char, Mot::FindForward),
            s("'", ArgShape::Mark, Mot::GotoMark),
            s("j", ArgShape::None, Mot::Down),
        ];
        CommandParser::new(commands, motions)
    }

    fn parse(seq: &str) -> ParseOutcome<Cmd, Mot> {
        parser().parse(&parse_keys(seq).unwrap(), false)
    }

    fn complete(
        register: Option<char>,
        count: Option<u32>,
        action: ParsedAction<Cmd, Mot>,
        consumed: usize,
    ) -> ParseOutcome<Cmd, Mot> {
        ParseOutcome::Complete {
            command: ParsedCommand {
                register,
                count,
                action,
            },
            consumed,
        }
    }

    #[test]
    fn trie_longest_match() {
        let trie = MappingTrie::build(vec![
            MappingSpec::parse("g", ArgShape::None, 1).unwrap(),
            MappingSpec::parse("gg", ArgShape::None, 2).unwrap(),
        ]);
        let keys = parse_keys("gg").unwrap();
        assert_eq!(
            trie.resolve(&keys),
            Resolution::Matched {
                consumed: 2,
                output: 2,
                arg: ArgShape::None,
                last_key: Some(KeyEvent::char('g')),
                ambiguous: false,
            }
        );
        let keys = parse_keys("gx").unwrap();
        assert!(matches!(
            trie.resolve(&keys),
            Resolution::Matched {
                consumed: 1,
                output: 1,
                ambiguous: false,
                ..
            }
        ));
        let keys = parse_keys("g").unwrap();
        assert!(matches!(trie.resolve(&keys), Resolution::Matched { ambiguous: true, .. }));
        let keys = parse_keys("x").unwrap();
        assert_eq!(trie.resolve(&keys), Resolution::NoMatch);
        assert_eq!(trie.resolve(&[]), Resolution::NeedMore);
    }

    #[test]
    fn bare_motion_with_count() {
        assert_eq!(
            parse("3w"),
            complete(
                None,
                Some(3),
                ParsedAction::Motion {
                    motion: Mot::WordForward,
                    arg: None
                },
                2
            )
        );
    }

    #[test]
    fn zero_is_a_motion_unless_extending_a_count() {
        assert_eq!(
            parse("0"),
            complete(
                None,
                None,
                ParsedAction::Motion {
                    motion: Mot::LineStart,
                    arg: None
                },
                1
            )
        );
        assert_eq!(
            parse("10j"),
            complete(
                None,
                Some(10),
                ParsedAction::Motion {
                    motion: Mot::Down,
                    arg: None
                },
                3
            )
        );
    }

    #[test]
    fn operator_motion_multiplies_counts() {
        assert_eq!(
            parse("2d3w"),
            complete(
                None,
                Some(6),
                ParsedAction::Operator {
                    op: Cmd::Delete,
                    motion: Mot::WordForward,
                    motion_arg: None
                },
                4
            )
        );
    }

    #[test]
    fn doubled_operator_is_linewise() {
        assert_eq!(
            parse("3dd"),
            complete(None, Some(3), ParsedAction::Linewise { op: Cmd::Delete }, 3)
        );
        assert_eq!(
            parse("d2d"),
            complete(None, Some(2), ParsedAction::Linewise { op: Cmd::Delete }, 3)
        );
    }

    #[test]
    fn register_and_count_in_either_order() {
        let expect = |consumed| {
            complete(
                Some('a'),
                Some(2),
                ParsedAction::Linewise { op: Cmd::Yank },
                consumed,
            )
        };
        assert_eq!(parse("\"a2yy"), expect(5));
        assert_eq!(parse("2\"ayy"), expect(5));
    }

    #[test]
    fn prefixes_alone_are_pending() {
        assert_eq!(parse("\""), ParseOutcome::Pending);
        assert_eq!(parse("\"a"), ParseOutcome::Pending);
        assert_eq!(parse("12"), ParseOutcome::Pending);
        assert_eq!(parse("d"), ParseOutcome::Pending);
        assert_eq!(parse("d2"), ParseOutcome::Pending);
        assert_eq!(parse("dg"), ParseOutcome::Pending);
        assert_eq!(parse("f"), ParseOutcome::Pending);
    }

    #[test]
    fn motion_and_command_arguments() {
        assert_eq!(
            parse("dfx"),
            complete(
                None,
                None,
                ParsedAction::Operator {
                    op: Cmd::Delete,
                    motion: Mot::FindForward,
                    motion_arg: Some('x')
                },
                3
            )
        );
        assert_eq!(
            parse("ma"),
            complete(
                None,
                None,
                ParsedAction::Command {
                    command: Cmd::SetMark,
                    arg: Some('a')
                },
                2
            )
        );
        assert_eq!(
            parse("y'a"),
            complete(
                None,
                None,
                ParsedAction::Operator {
                    op: Cmd::Yank,
                    motion: Mot::GotoMark,
                    motion_arg: Some('a')
                },
                3
            )
        );
        assert_eq!(
            parse("r<TAB>"),
            complete(
                None,
                None,
                ParsedAction::Command {
                    command: Cmd::Replace,
                    arg: Some('\t')
                },
                2
            )
        );
        assert_eq!(
            parse("qb"),
            complete(
                None,
                None,
                ParsedAction::Command {
                    command: Cmd::Record,
                    arg: Some('b')
                },
                2
            )
        );
    }

    #[test]
    fn escape_cancels() {
        assert_eq!(parse("d<ESC>"), ParseOutcome::NoMatch { consumed: 2 });
        assert_eq!(parse("r<ESC>"), ParseOutcome::NoMatch { consumed: 2 });
        assert_eq!(parse("2<ESC>"), ParseOutcome::NoMatch { consumed: 2 });
        assert_eq!(parse("X"), ParseOutcome::NoMatch { consumed: 1 });
    }

    #[test]
    fn multi_key_operator_and_motion() {
        assert_eq!(
            parse("zfgg"),
            complete(
                None,
                None,
                ParsedAction::Operator {
                    op: Cmd::Fold,
                    motion: Mot::FileStart,
                    motion_arg: None
                },
                4
            )
        );
        assert_eq!(
            parse("zfj"),
            complete(
                None,
                None,
                ParsedAction::Operator {
                    op: Cmd::Fold,
                    motion: Mot::Down,
                    motion_arg: None
                },
                3
            )
        );
        // `f` after a two-key operator is the find motion, not a doubling.
        assert_eq!(parse("zff"), ParseOutcome::Pending);
    }

    #[test]
    fn ambiguous_shorter_entry_waits_then_commits() {
        let shorter = ParsedCommand {
            register: None,
            count: None,
            action: ParsedAction::Command {
                command: Cmd::Scroll,
                arg: None,
            },
        };
        assert_eq!(
            parse("z"),
            ParseOutcome::Ambiguous {
                shorter: shorter.clone(),
                consumed: 1
            }
        );
        // Expired timeout commits the shorter entry.
        assert_eq!(
            parser().parse(&parse_keys("z").unwrap(), true),
            ParseOutcome::Complete {
                command: shorter.clone(),
                consumed: 1
            }
        );
        // A key that extends nothing commits it and stays pending.
        assert_eq!(
            parse("zw"),
            ParseOutcome::Complete {
                command: shorter,
                consumed: 1
            }
        );
        assert_eq!(
            parse("zt"),
            complete(
                None,
                None,
                ParsedAction::Command {
                    command: Cmd::ScrollTop,
                    arg: None
                },
                2
            )
        );
    }

    #[test]
    fn counts_saturate() {
        match parse("99999999w") {
            ParseOutcome::Complete { command, .. } => assert_eq!(command.count, Some(COUNT_MAX)),
            other => panic!("unexpected {other:?}"),
        }
        let ctx = PendingContext {
            register: None,
            count_prefix: Some(COUNT_MAX),
            post_op_count: Some(50),
        };
        assert_eq!(ctx.total_count(), Some(COUNT_MAX));
    }

    #[test]
    fn trailing_keys_are_left_for_the_next_parse() {
        assert_eq!(
            parse("pw"),
            complete(
                None,
                None,
                ParsedAction::Command {
                    command: Cmd::Put,
                    arg: None
                },
                1
            )
        );
    }
}
