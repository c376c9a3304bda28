//! Named cursor marks (`ma`, `'a`) and the visual bounds `'<` / `'>`.

use core_text::{BufferOperation, OperationKind, Position};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct Marks {
    marks: BTreeMap<char, Position>,
}

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid_name(c: char) -> bool {
        c.is_ascii_lowercase() || matches!(c, '<' | '>' | '\'' | '`')
    }

    /// Set mark `c`. Returns false for names that cannot be set.
    pub fn set(&mut self, c: char, pos: Position) -> bool {
        if !Self::is_valid_name(c) {
            return false;
        }
        let c = if c == '`' { '\'' } else { c };
        self.marks.insert(c, pos);
        true
    }

    pub fn get(&self, c: char) -> Option<Position> {
        let c = if c == '`' { '\'' } else { c };
        self.marks.get(&c).copied()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    /// Keep marks on their text when lines are inserted or removed above them.
    pub fn apply_line_change(&mut self, op: &BufferOperation) {
        match op.kind {
            OperationKind::InsertLine => {
                for pos in self.marks.values_mut() {
                    if pos.line >= op.line {
                        pos.line += 1;
                    }
                }
            }
            OperationKind::DeleteLine => {
                for pos in self.marks.values_mut() {
                    if pos.line > op.line {
                        pos.line -= 1;
                    } else if pos.line == op.line {
                        pos.col = 0;
                    }
                }
            }
            _ => {}
        }
    }
}
