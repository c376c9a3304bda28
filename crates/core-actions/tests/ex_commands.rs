//! Ex command line: ranges, commands and error reporting.

mod common;

use common::{after, editor, keys, pos};
use core_state::{Mode, RegisterStore};
use pretty_assertions::assert_eq;

#[test]
fn delete_ranges() {
    assert_eq!(after("a\nb\nc\nd", ":2,3d<ENTER>"), "a\nd");
    assert_eq!(after("a\nb\nc\nd", ":3,2d<ENTER>"), "a\nd");
    assert_eq!(after("a\nb\nc\nd", ":%d<ENTER>"), "");
    assert_eq!(after("a\nb\nc\nd", "j:.,$d<ENTER>"), "a");
    assert_eq!(after("a\nb\nc\nd", ":.+1,.+2d<ENTER>"), "a\nd");
}

#[test]
fn delete_into_register() {
    let mut ed = editor("a\nb\nc");
    keys(&mut ed, ":2d x<ENTER>");
    assert_eq!(ed.contents(), "a\nc");
    let x = ed.state().registers.get_register('x').unwrap_or_default();
    assert_eq!(x.lines, vec!["b".to_string()]);
    assert!(x.linewise);
}

#[test]
fn yank_does_not_move_caret() {
    let mut ed = editor("a\nb\nc");
    keys(&mut ed, ":2,3y<ENTER>");
    assert_eq!(ed.caret(), pos(0, 0));
    keys(&mut ed, "p");
    assert_eq!(ed.contents(), "a\nb\nc\nb\nc");
}

#[test]
fn count_prefills_range() {
    let mut ed = editor("a\nb\nc");
    keys(&mut ed, "2:");
    assert_eq!(ed.state().command_line.buffer(), ".,.+1");
    keys(&mut ed, "d<ENTER>");
    assert_eq!(ed.contents(), "c");
}

#[test]
fn substitute_forms() {
    assert_eq!(after("foo\nboo", ":s/o/0/<ENTER>"), "f0o\nboo");
    assert_eq!(after("foo\nboo", ":%s/o/0/g<ENTER>"), "f00\nb00");
    assert_eq!(after("abc", ":s/b/[&]/<ENTER>"), "a[b]c");
    assert_eq!(after("a&b", ":s/&/\\&\\&/<ENTER>"), "a&&b");
    assert_eq!(after("hello world", ":s/(\\w+) (\\w+)/\\2 \\1/<ENTER>"), "world hello");
    assert_eq!(after("a/b", ":s#/#-#<ENTER>"), "a-b");
    assert_eq!(after("cost", ":s/cost/$5/<ENTER>"), "$5");
}

#[test]
fn substitute_reuses_last_search() {
    let mut ed = editor("one two\ntwo");
    keys(&mut ed, "/two<ENTER>");
    keys(&mut ed, ":%s//2/<ENTER>");
    assert_eq!(ed.contents(), "one 2\n2");
}

#[test]
fn substitute_moves_to_last_changed_line() {
    let mut ed = editor("x\n  y\nz");
    keys(&mut ed, ":%s/y/Y/<ENTER>");
    assert_eq!(ed.caret(), pos(1, 2));
}

#[test]
fn failed_substitute_reports() {
    let mut ed = editor("abc");
    keys(&mut ed, ":s/zzz/y/<ENTER>");
    assert_eq!(ed.contents(), "abc");
    assert_eq!(ed.status(), Some("Pattern not found: zzz"));
    assert_eq!(ed.mode(), Mode::Normal);
}

#[test]
fn range_errors_abort() {
    let mut ed = editor("a\nb\nc");
    keys(&mut ed, ":5d<ENTER>");
    assert_eq!(ed.contents(), "a\nb\nc");
    assert_eq!(ed.status(), Some("Invalid range"));
    keys(&mut ed, ":'q,$d<ENTER>");
    assert_eq!(ed.status(), Some("Mark not set: q"));
    keys(&mut ed, ":/nothing/d<ENTER>");
    assert_eq!(ed.status(), Some("Pattern not found: nothing"));
    assert_eq!(ed.contents(), "a\nb\nc");
}

#[test]
fn unknown_command_reports() {
    let mut ed = editor("a");
    keys(&mut ed, ":frobnicate<ENTER>");
    assert_eq!(ed.status(), Some("Not an editor command: frobnicate"));
}

#[test]
fn search_addresses() {
    assert_eq!(after("a\nb\nc", ":/c/d<ENTER>"), "a\nb");
    assert_eq!(after("a\nb\nc", "G:?a?,.-1d<ENTER>"), "c");
}

#[test]
fn goto_line_sets_jump_mark() {
    let mut ed = editor("a\n  b\nc");
    keys(&mut ed, ":2<ENTER>");
    assert_eq!(ed.caret(), pos(1, 2));
    keys(&mut ed, "''");
    assert_eq!(ed.caret(), pos(0, 0));
}

#[test]
fn join_commands() {
    assert_eq!(after("a\nb\nc", ":j<ENTER>"), "a b\nc");
    assert_eq!(after("a\nb\nc", ":1,3j<ENTER>"), "a b c");
    assert_eq!(after("a\nb\nc", ":2j<ENTER>"), "a\nb c");
}

#[test]
fn shift_commands() {
    assert_eq!(after("a\nb", ":%><ENTER>"), "\ta\n\tb");
    assert_eq!(after("a", ":>><ENTER>"), "\t\ta");
    assert_eq!(after("\t\ta", ":<LT><ENTER>"), "\ta");
}

#[test]
fn mark_commands() {
    let mut ed = editor("a\nb\nc");
    keys(&mut ed, ":3ma x<ENTER>");
    assert_eq!(ed.state().marks.get('x'), Some(pos(2, 0)));
    keys(&mut ed, ":2ky<ENTER>");
    assert_eq!(ed.state().marks.get('y'), Some(pos(1, 0)));
    keys(&mut ed, "'x");
    assert_eq!(ed.caret(), pos(2, 0));
}

#[test]
fn fold_commands() {
    let mut ed = editor("a\nb\nc\nd");
    keys(&mut ed, ":2,3fo<ENTER>");
    let folds = |ed: &core_actions::Editor| -> Vec<(usize, usize, bool)> {
        ed.view().folds.iter().map(|f| (f.from, f.to, f.closed)).collect()
    };
    assert_eq!(folds(&ed), vec![(1, 3, true)]);
    keys(&mut ed, ":%foldo<ENTER>");
    assert_eq!(folds(&ed), vec![(1, 3, false)]);
    keys(&mut ed, ":3foldc<ENTER>");
    assert_eq!(folds(&ed), vec![(1, 3, true)]);
    keys(&mut ed, ":3,4fold<ENTER>");
    assert!(ed.status().is_some());
    assert_eq!(ed.view().folds.len(), 1);
}

#[test]
fn undo_and_redo_commands() {
    let mut ed = editor("a\nb");
    keys(&mut ed, "dd:u<ENTER>");
    assert_eq!(ed.contents(), "a\nb");
    keys(&mut ed, ":red<ENTER>");
    assert_eq!(ed.contents(), "b");
}

#[test]
fn quit_requires_force_when_modified() {
    let mut ed = editor("a");
    let result = ed.send_keys(":q<ENTER>").unwrap();
    assert!(result.quit);

    let mut ed = editor("a");
    let result = ed.send_keys("x:q<ENTER>").unwrap();
    assert!(!result.quit);
    assert_eq!(
        ed.status(),
        Some("No write since last change (add ! to override)")
    );
    let result = ed.send_keys(":q!<ENTER>").unwrap();
    assert!(result.quit);
}

#[test]
fn visual_command_is_accepted() {
    let mut ed = editor("a");
    keys(&mut ed, ":vi<ENTER>");
    assert_eq!(ed.mode(), Mode::Normal);
    assert_eq!(ed.status(), None);
}

#[test]
fn command_line_editing() {
    let mut ed = editor("a\nb\nc\nd");
    keys(&mut ed, ":2x<BS>d<ENTER>");
    assert_eq!(ed.contents(), "a\nc\nd");
    keys(&mut ed, ":<UP><ENTER>");
    assert_eq!(ed.contents(), "a\nd");
    keys(&mut ed, ":<BS>");
    assert_eq!(ed.mode(), Mode::Normal);
    keys(&mut ed, ":d<ESC>");
    assert_eq!(ed.mode(), Mode::Normal);
    assert_eq!(ed.contents(), "a\nd");
}
