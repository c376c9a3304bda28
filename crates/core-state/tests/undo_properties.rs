//! Property-based tests for undo/redo replay over random edit sequences.

use core_state::{Document, Registers};
use core_text::{Buffer, Position};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Insert { col: usize, line: usize, text: String },
    Delete { col: usize, line: usize, count: usize },
    NewLine { col: usize, line: usize },
    DeleteLine { line: usize, count: usize },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..12, 0usize..8, "[a-zé\t ]{1,5}").prop_map(|(col, line, text)| Edit::Insert { col, line, text }),
        (0usize..12, 0usize..8, 1usize..6).prop_map(|(col, line, count)| Edit::Delete { col, line, count }),
        (0usize..12, 0usize..8).prop_map(|(col, line)| Edit::NewLine { col, line }),
        (0usize..8, 1usize..4).prop_map(|(line, count)| Edit::DeleteLine { line, count }),
    ]
}

/// Apply `e` with its line folded into range; returns the caret after the edit.
fn apply(doc: &mut Document, regs: &mut Registers, e: &Edit) -> Position {
    let lines = doc.buffer().line_count();
    let pos = match *e {
        Edit::Insert { col, line, ref text } => {
            let line = line % lines;
            doc.insert_char(col, line, text);
            Position::new(line, col + text.chars().count())
        }
        Edit::Delete { col, line, count } => {
            let line = line % lines;
            doc.delete_char(col, line, count);
            Position::new(line, col)
        }
        Edit::NewLine { col, line } => {
            let line = line % lines;
            doc.insert_new_line(col, line);
            Position::new(line + 1, 0)
        }
        Edit::DeleteLine { line, count } => {
            let line = line % lines;
            doc.delete_line(line, count, regs, None);
            Position::new(line, 0)
        }
    };
    doc.buffer().clamp(pos)
}

fn initial() -> Buffer {
    Buffer::from_str("prop", "alpha beta\n\tgamma\n\nδelta")
}

proptest! {
    #[test]
    fn undo_all_restores_content_and_caret(edits in prop::collection::vec(edit(), 1..24)) {
        let mut doc = Document::new(initial());
        let mut regs = Registers::new();
        let original = doc.buffer().contents();
        let mut before = Position::origin();
        let mut first_start = None;
        doc.commit(before);
        for e in &edits {
            let pending = doc.undo_log().pending().operations.len();
            let after = apply(&mut doc, &mut regs, e);
            if first_start.is_none() && doc.undo_log().pending().operations.len() > pending {
                first_start = Some(before);
            }
            doc.commit(after);
            before = after;
            prop_assert!(doc.buffer().line_count() >= 1);
        }
        let items = doc.undo_log().len();
        let mut restored = None;
        for _ in 0..items {
            restored = doc.undo(before);
            prop_assert!(restored.is_some());
        }
        prop_assert!(doc.undo(Position::origin()).is_none());
        prop_assert_eq!(doc.buffer().contents(), original);
        prop_assert_eq!(restored, first_start);
    }

    #[test]
    fn redo_after_undo_reproduces_state(edits in prop::collection::vec(edit(), 1..24), depth in 1usize..24) {
        let mut doc = Document::new(initial());
        let mut regs = Registers::new();
        for e in &edits {
            let after = apply(&mut doc, &mut regs, e);
            doc.commit(after);
        }
        let edited = doc.buffer().contents();
        let depth = depth.min(doc.undo_log().len());
        for _ in 0..depth {
            doc.undo(Position::origin());
        }
        for _ in 0..depth {
            prop_assert!(doc.redo(Position::origin()).is_some());
        }
        prop_assert!(doc.redo(Position::origin()).is_none());
        prop_assert_eq!(doc.buffer().contents(), edited);
    }

    #[test]
    fn repeated_commit_adds_no_empty_items(n in 1usize..10) {
        let mut doc = Document::new(initial());
        doc.insert_char(0, 0, "x");
        for _ in 0..n {
            doc.commit(Position::new(0, 1));
        }
        prop_assert_eq!(doc.undo_log().len(), 1);
        prop_assert!(doc.undo_log().items().iter().all(|i| !i.is_empty()));
    }
}
