//! KeyTranslator: buffers keys and turns them into [`Action`]s.
//!
//! In Normal and Visual modes the pending buffer is parsed against the
//! binding tables; every other mode receives its keys one by one. The caller
//! asks for actions in a loop because one key can complete a command and leave
//! further keys behind (an ambiguous prefix followed by an unrelated key), and
//! the mode may change between two actions taken from the same buffer.
//!
//! An ambiguous prefix (`z` when both `z` and `zt` are bound) starts a
//! deadline. [`KeyTranslator::flush_timeout`] commits the shorter command once
//! the deadline passes; without a timeout the translator waits for the next
//! key.
//!
//! User mappings (`:map` and friends) join the Normal and Visual tables as
//! [`CommandKind::Mapped`] entries, so they take part in the same longest
//! match and ambiguity rules as the built-ins. Insert mode mappings live in a
//! trie of their own. A completed mapping is replaced in the buffer by its
//! right-hand side; keys that came from a `noremap` expansion are parsed
//! against the built-in tables only.

use crate::{Action, CommandKind, MotionKind, ParsedAction, bindings};
use core_events::KeyEvent;
use core_keymap::{ArgShape, CommandParser, MappingSpec, MappingTrie, ParseOutcome, Resolution};
use core_state::Mode;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

type Parser = CommandParser<CommandKind, MotionKind>;

/// Expansions allowed per typed key before a mapping counts as recursive.
pub const MAX_MAP_DEPTH: usize = 1000;

bitflags::bitflags! {
    /// Modes a user mapping applies in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MapModes: u8 {
        const NORMAL = 0b0000_0001;
        const VISUAL = 0b0000_0010;
        const INSERT = 0b0000_0100;
    }
}

impl MapModes {
    fn of(mode: Mode) -> Option<Self> {
        match mode {
            Mode::Normal => Some(Self::NORMAL),
            Mode::Visual | Mode::VisualLine => Some(Self::VISUAL),
            Mode::Insert | Mode::Replace => Some(Self::INSERT),
            _ => None,
        }
    }
}

/// `lhs` typed in one of `modes` behaves as if `rhs` had been typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMapping {
    pub modes: MapModes,
    pub lhs: Vec<KeyEvent>,
    pub rhs: Vec<KeyEvent>,
    /// The expansion is not mapped again.
    pub noremap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Queued {
    key: KeyEvent,
    remap: bool,
}

enum InsertStep {
    Raw,
    Wait,
    Expand(usize, usize),
}

#[derive(Debug, Clone)]
pub struct KeyTranslator {
    normal_table: Vec<MappingSpec<CommandKind>>,
    visual_table: Vec<MappingSpec<CommandKind>>,
    motions: Vec<MappingSpec<MotionKind>>,
    mappings: Vec<UserMapping>,
    normal: Parser,
    visual: Parser,
    normal_builtin: Parser,
    visual_builtin: Parser,
    insert: MappingTrie<usize>,
    pending: VecDeque<Queued>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    expansions: usize,
    recursive: bool,
}

impl KeyTranslator {
    /// Translator over the built-in tables. `timeout` is the ambiguity
    /// timeout; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::with_tables(
            bindings::normal_commands(),
            bindings::visual_commands(),
            bindings::motions(),
            timeout,
        )
    }

    pub fn with_tables(
        normal: Vec<MappingSpec<CommandKind>>,
        visual: Vec<MappingSpec<CommandKind>>,
        motions: Vec<MappingSpec<MotionKind>>,
        timeout: Option<Duration>,
    ) -> Self {
        let normal_builtin = CommandParser::new(normal.clone(), motions.clone());
        let visual_builtin = CommandParser::new(visual.clone(), motions.clone());
        Self {
            normal_table: normal,
            visual_table: visual,
            motions,
            mappings: Vec::new(),
            normal: normal_builtin.clone(),
            visual: visual_builtin.clone(),
            normal_builtin,
            visual_builtin,
            insert: MappingTrie::default(),
            pending: VecDeque::new(),
            deadline: None,
            timeout,
            expansions: 0,
            recursive: false,
        }
    }

    pub fn mappings(&self) -> &[UserMapping] {
        &self.mappings
    }

    /// Add a user mapping. An existing mapping of the same keys is replaced
    /// in the modes the new one covers.
    pub fn map(&mut self, mapping: UserMapping) {
        debug!(target: "input.map", lhs = %core_events::format_keys(&mapping.lhs), rhs = %core_events::format_keys(&mapping.rhs), noremap = mapping.noremap, modes = ?mapping.modes, "user_map");
        self.strip(&mapping.lhs, mapping.modes);
        self.mappings.push(mapping);
        self.rebuild();
    }

    /// Remove the mapping of `lhs` from `modes`. False when there was none.
    pub fn unmap(&mut self, lhs: &[KeyEvent], modes: MapModes) -> bool {
        let found = self.strip(lhs, modes);
        if found {
            debug!(target: "input.map", lhs = %core_events::format_keys(lhs), ?modes, "user_unmap");
            self.rebuild();
        }
        found
    }

    fn strip(&mut self, lhs: &[KeyEvent], modes: MapModes) -> bool {
        let mut found = false;
        for m in self.mappings.iter_mut().filter(|m| m.lhs == lhs) {
            found |= m.modes.intersects(modes);
            m.modes.remove(modes);
        }
        self.mappings.retain(|m| !m.modes.is_empty());
        found
    }

    fn rebuild(&mut self) {
        let user = |modes: MapModes| -> Vec<MappingSpec<CommandKind>> {
            self.mappings
                .iter()
                .enumerate()
                .filter(|(_, m)| m.modes.contains(modes))
                .map(|(i, m)| MappingSpec::new(m.lhs.clone(), ArgShape::None, CommandKind::Mapped(i)))
                .collect()
        };
        // User entries come last so they win over a built-in on the same keys.
        let mut normal = self.normal_table.clone();
        normal.extend(user(MapModes::NORMAL));
        let mut visual = self.visual_table.clone();
        visual.extend(user(MapModes::VISUAL));
        let insert = self
            .mappings
            .iter()
            .enumerate()
            .filter(|(_, m)| m.modes.contains(MapModes::INSERT))
            .map(|(i, m)| MappingSpec::new(m.lhs.clone(), ArgShape::None, i))
            .collect();
        self.normal = CommandParser::new(normal, self.motions.clone());
        self.visual = CommandParser::new(visual, self.motions.clone());
        self.insert = MappingTrie::build(insert);
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &KeyEvent> {
        self.pending.iter().map(|q| &q.key)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn push(&mut self, key: KeyEvent) {
        self.pending.push_back(Queued { key, remap: true });
        self.deadline = None;
        self.expansions = 0;
    }

    /// Remove and return every pending key.
    pub fn take_pending(&mut self) -> Vec<KeyEvent> {
        self.deadline = None;
        self.pending.drain(..).map(|q| q.key).collect()
    }

    /// Drop pending keys (`<ESC>` handling and mode resets).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.deadline = None;
        self.expansions = 0;
    }

    /// True once after a mapping expanded more than [`MAX_MAP_DEPTH`] times
    /// for one typed key; the pending keys were dropped.
    pub fn take_recursion_error(&mut self) -> bool {
        std::mem::take(&mut self.recursive)
    }

    /// Next action the pending keys form in `mode`, if any.
    pub fn next_action(&mut self, mode: Mode, now: Instant) -> Option<Action> {
        self.take(mode, now, false)
    }

    /// Commit an ambiguous prefix whose deadline has passed.
    pub fn flush_timeout(&mut self, mode: Mode, now: Instant) -> Option<Action> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                debug!(target: "input.map", pending = self.pending.len(), "ambiguity_timeout");
                self.take(mode, now, true)
            }
            _ => None,
        }
    }

    /// Parser for `mode`; `remap` selects the table with user mappings.
    fn parser(&self, mode: Mode, remap: bool) -> Option<&Parser> {
        match (mode, remap) {
            (Mode::Normal, true) => Some(&self.normal),
            (Mode::Normal, false) => Some(&self.normal_builtin),
            (Mode::Visual | Mode::VisualLine, true) => Some(&self.visual),
            (Mode::Visual | Mode::VisualLine, false) => Some(&self.visual_builtin),
            _ => None,
        }
    }

    fn take(&mut self, mode: Mode, now: Instant, expired: bool) -> Option<Action> {
        loop {
            if self.pending.is_empty() {
                return None;
            }
            // A buffer holding any noremap key is parsed without user mappings.
            let remap = self.pending.iter().all(|q| q.remap);
            let Some(parser) = self.parser(mode, remap) else {
                match self.insert_step(mode, expired) {
                    InsertStep::Raw => {
                        self.deadline = None;
                        return self.pending.pop_front().map(|q| Action::Key(q.key));
                    }
                    InsertStep::Wait => {
                        if self.deadline.is_none() {
                            self.deadline = self.timeout.map(|t| now + t);
                        }
                        return None;
                    }
                    InsertStep::Expand(index, consumed) => {
                        if !self.expand(index, 0, consumed) {
                            return None;
                        }
                        continue;
                    }
                }
            };
            let keys: Vec<KeyEvent> = self.pending.iter().map(|q| q.key).collect();
            match parser.parse(&keys, expired) {
                ParseOutcome::Complete { command, consumed } => {
                    self.deadline = None;
                    if let ParsedAction::Command {
                        command: CommandKind::Mapped(index),
                        ..
                    } = command.action
                    {
                        let lhs = self.mappings.get(index).map_or(0, |m| m.lhs.len());
                        if !self.expand(index, consumed.saturating_sub(lhs), consumed) {
                            return None;
                        }
                        continue;
                    }
                    self.drain(consumed);
                    trace!(target: "input.map", ?command, "command");
                    return Some(Action::Command(command));
                }
                ParseOutcome::Pending => return None,
                ParseOutcome::Ambiguous { .. } => {
                    if self.deadline.is_none() {
                        self.deadline = self.timeout.map(|t| now + t);
                    }
                    return None;
                }
                ParseOutcome::NoMatch { consumed } => {
                    debug!(target: "input.map", keys = %core_events::format_keys(&keys[..consumed.min(keys.len())]), "unmapped");
                    self.drain(consumed);
                    self.deadline = None;
                }
            }
        }
    }

    /// Match Insert mode mappings against the leading remappable keys.
    fn insert_step(&self, mode: Mode, expired: bool) -> InsertStep {
        if self.insert.is_empty() || MapModes::of(mode) != Some(MapModes::INSERT) {
            return InsertStep::Raw;
        }
        let keys: Vec<KeyEvent> = self
            .pending
            .iter()
            .take_while(|q| q.remap)
            .map(|q| q.key)
            .collect();
        if keys.is_empty() {
            return InsertStep::Raw;
        }
        match self.insert.resolve(&keys) {
            Resolution::Matched {
                consumed,
                output,
                ambiguous,
                ..
            } if !ambiguous || expired => InsertStep::Expand(output, consumed),
            Resolution::Matched { .. } | Resolution::NeedMore if !expired => InsertStep::Wait,
            _ => InsertStep::Raw,
        }
    }

    /// Replace `pending[from..to]` (the left-hand side of mapping `index`)
    /// with its right-hand side. False when the expansion limit was hit.
    fn expand(&mut self, index: usize, from: usize, to: usize) -> bool {
        self.expansions += 1;
        if self.expansions > MAX_MAP_DEPTH {
            debug!(target: "input.map", index, "recursive_mapping");
            self.reset();
            self.recursive = true;
            return false;
        }
        let Some(mapping) = self.mappings.get(index) else {
            self.drain(to);
            return true;
        };
        let remap = !mapping.noremap;
        let rhs: Vec<Queued> = mapping.rhs.iter().map(|&key| Queued { key, remap }).collect();
        trace!(target: "input.map", index, rhs = %core_events::format_keys(&mapping.rhs), "expand");
        let to = to.min(self.pending.len());
        let tail = self.pending.split_off(to);
        self.pending.truncate(from.min(to));
        self.pending.extend(rhs);
        self.pending.extend(tail);
        true
    }

    fn drain(&mut self, n: usize) {
        let n = n.min(self.pending.len());
        self.pending.drain(..n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ParsedAction, ParsedCommand};
    use core_events::parse_keys;
    use core_keymap::ArgShape;
    use pretty_assertions::assert_eq;

    fn feed(t: &mut KeyTranslator, mode: Mode, notation: &str, now: Instant) -> Vec<Action> {
        let mut out = Vec::new();
        for k in parse_keys(notation).unwrap() {
            t.push(k);
            while let Some(a) = t.next_action(mode, now) {
                out.push(a);
            }
        }
        out
    }

    fn motion(m: MotionKind, count: Option<u32>) -> Action {
        Action::Command(ParsedCommand {
            register: None,
            count,
            action: ParsedAction::Motion { motion: m, arg: None },
        })
    }

    #[test]
    fn normal_keys_become_commands() {
        let mut t = KeyTranslator::new(None);
        let now = Instant::now();
        assert_eq!(feed(&mut t, Mode::Normal, "3j", now), vec![motion(MotionKind::Down, Some(3))]);
        assert!(t.is_idle());
    }

    #[test]
    fn partial_operator_stays_pending() {
        let mut t = KeyTranslator::new(None);
        let now = Instant::now();
        assert!(feed(&mut t, Mode::Normal, "d2", now).is_empty());
        assert_eq!(t.pending().count(), 2);
        let actions = feed(&mut t, Mode::Normal, "w", now);
        assert_eq!(actions.len(), 1);
        assert!(t.is_idle());
    }

    #[test]
    fn insert_mode_passes_raw_keys() {
        let mut t = KeyTranslator::new(None);
        let now = Instant::now();
        let actions = feed(&mut t, Mode::Insert, "dw", now);
        assert_eq!(
            actions,
            vec![Action::Key(KeyEvent::char('d')), Action::Key(KeyEvent::char('w'))]
        );
    }

    #[test]
    fn unmapped_key_is_discarded() {
        let mut t = KeyTranslator::new(None);
        let now = Instant::now();
        assert_eq!(feed(&mut t, Mode::Normal, "Qj", now), vec![motion(MotionKind::Down, None)]);
    }

    fn ambiguous_translator(timeout: Option<Duration>) -> KeyTranslator {
        let normal = vec![
            MappingSpec::parse("z", ArgShape::None, CommandKind::Repaint).unwrap(),
            MappingSpec::parse("zt", ArgShape::None, CommandKind::FoldOpenAll).unwrap(),
        ];
        let motions = vec![MappingSpec::parse("j", ArgShape::None, MotionKind::Down).unwrap()];
        KeyTranslator::with_tables(normal, Vec::new(), motions, timeout)
    }

    fn command(c: CommandKind) -> Action {
        Action::Command(ParsedCommand {
            register: None,
            count: None,
            action: ParsedAction::Command { command: c, arg: None },
        })
    }

    #[test]
    fn ambiguous_prefix_waits_then_extends() {
        let mut t = ambiguous_translator(Some(Duration::from_millis(1000)));
        let now = Instant::now();
        assert!(feed(&mut t, Mode::Normal, "z", now).is_empty());
        assert!(t.deadline().is_some());
        assert_eq!(feed(&mut t, Mode::Normal, "t", now), vec![command(CommandKind::FoldOpenAll)]);
        assert!(t.deadline().is_none());
    }

    #[test]
    fn ambiguous_prefix_commits_on_unrelated_key() {
        let mut t = ambiguous_translator(None);
        let now = Instant::now();
        assert!(feed(&mut t, Mode::Normal, "z", now).is_empty());
        assert_eq!(
            feed(&mut t, Mode::Normal, "j", now),
            vec![command(CommandKind::Repaint), motion(MotionKind::Down, None)]
        );
    }

    #[test]
    fn ambiguous_prefix_commits_after_timeout() {
        let mut t = ambiguous_translator(Some(Duration::from_millis(500)));
        let start = Instant::now();
        feed(&mut t, Mode::Normal, "z", start);
        assert_eq!(t.flush_timeout(Mode::Normal, start + Duration::from_millis(100)), None);
        assert_eq!(
            t.flush_timeout(Mode::Normal, start + Duration::from_millis(600)),
            Some(command(CommandKind::Repaint))
        );
        assert!(t.is_idle());
    }

    fn user(modes: MapModes, lhs: &str, rhs: &str, noremap: bool) -> UserMapping {
        UserMapping {
            modes,
            lhs: parse_keys(lhs).unwrap(),
            rhs: parse_keys(rhs).unwrap(),
            noremap,
        }
    }

    #[test]
    fn mapping_expands_before_parsing() {
        let mut t = KeyTranslator::new(None);
        t.map(user(MapModes::NORMAL, "Q", "3j", false));
        let now = Instant::now();
        assert_eq!(feed(&mut t, Mode::Normal, "Q", now), vec![motion(MotionKind::Down, Some(3))]);
        // Visual mode is not covered.
        assert!(feed(&mut t, Mode::Visual, "Q", now).is_empty());
        assert!(t.is_idle());
    }

    #[test]
    fn unmap_narrows_modes() {
        let mut t = KeyTranslator::new(None);
        t.map(user(MapModes::NORMAL | MapModes::VISUAL, "Q", "j", true));
        assert!(t.unmap(&parse_keys("Q").unwrap(), MapModes::NORMAL));
        assert_eq!(t.mappings().len(), 1);
        assert_eq!(t.mappings()[0].modes, MapModes::VISUAL);
        assert!(!t.unmap(&parse_keys("Q").unwrap(), MapModes::NORMAL));
        assert!(t.unmap(&parse_keys("Q").unwrap(), MapModes::VISUAL));
        assert!(t.mappings().is_empty());
    }

    #[test]
    fn remapping_the_same_keys_replaces() {
        let mut t = KeyTranslator::new(None);
        t.map(user(MapModes::NORMAL, "Q", "j", false));
        t.map(user(MapModes::NORMAL, "Q", "k", false));
        assert_eq!(t.mappings().len(), 1);
        let now = Instant::now();
        assert_eq!(feed(&mut t, Mode::Normal, "Q", now), vec![motion(MotionKind::Up, None)]);
    }

    #[test]
    fn self_referencing_mapping_hits_the_limit() {
        let mut t = KeyTranslator::new(None);
        t.map(user(MapModes::NORMAL, "Q", "Q", false));
        let now = Instant::now();
        assert!(feed(&mut t, Mode::Normal, "Q", now).is_empty());
        assert!(t.take_recursion_error());
        assert!(!t.take_recursion_error());
        assert!(t.is_idle());
    }

    #[test]
    fn no_timeout_waits_forever() {
        let mut t = ambiguous_translator(None);
        let start = Instant::now();
        feed(&mut t, Mode::Normal, "z", start);
        assert!(t.deadline().is_none());
        assert_eq!(t.flush_timeout(Mode::Normal, start + Duration::from_secs(3600)), None);
        assert!(!t.is_idle());
    }
}
