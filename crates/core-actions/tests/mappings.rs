//! User mappings: `:map` and friends feeding the key translator.

mod common;

use common::{editor, ex, keys, pos};
use core_events::KeyEvent;
use core_state::Mode;
use pretty_assertions::assert_eq;
use std::time::Instant;

#[test]
fn prefix_of_a_builtin_commits_on_timeout() {
    let mut ed = editor("a\nb\nc");
    ex(&mut ed, "nmap g dd");
    let start = Instant::now();
    ed.send_key_at(KeyEvent::char('g'), start);
    assert_eq!(ed.contents(), "a\nb\nc");
    let deadline = ed.deadline().expect("ambiguous prefix starts a deadline");
    assert!(!ed.flush_timeout(start).dirty);
    assert_eq!(ed.contents(), "a\nb\nc");
    ed.flush_timeout(deadline);
    assert_eq!(ed.contents(), "b\nc");
    assert!(ed.translator().is_idle());
    // A second key still reaches the longer built-in.
    keys(&mut ed, "Ggg");
    assert_eq!(ed.caret(), pos(0, 0));
    assert_eq!(ed.contents(), "b\nc");
}

#[test]
fn count_prefix_carries_into_expansion() {
    let mut ed = editor("a\nb\nc");
    ex(&mut ed, "nmap Q dd");
    keys(&mut ed, "2Q");
    assert_eq!(ed.contents(), "c");
}

#[test]
fn noremap_expansion_uses_builtins() {
    let mut ed = editor("abc\ndef");
    ex(&mut ed, "nmap x dd");
    ex(&mut ed, "nnoremap Q x");
    ex(&mut ed, "nmap Z x");
    keys(&mut ed, "Q");
    assert_eq!(ed.contents(), "bc\ndef");
    keys(&mut ed, "Z");
    assert_eq!(ed.contents(), "def");
}

#[test]
fn insert_mapping_waits_for_its_second_key() {
    let mut ed = editor("");
    ex(&mut ed, "inoremap jk <ESC>");
    keys(&mut ed, "ihijk");
    assert_eq!(ed.contents(), "hi");
    assert_eq!(ed.mode(), Mode::Normal);
    keys(&mut ed, "ajjx");
    assert_eq!(ed.contents(), "hijjx");
    // A lone `j` is typed once the timeout passes.
    let start = Instant::now();
    ed.send_key_at(KeyEvent::char('j'), start);
    assert_eq!(ed.contents(), "hijjx");
    let deadline = ed.deadline().expect("partial mapping starts a deadline");
    ed.flush_timeout(deadline);
    assert_eq!(ed.contents(), "hijjxj");
    assert_eq!(ed.mode(), Mode::Insert);
}

#[test]
fn visual_and_both_mode_mappings() {
    let mut ed = editor("abc\ndef");
    ex(&mut ed, "vmap Q d");
    keys(&mut ed, "vlQ");
    assert_eq!(ed.contents(), "c\ndef");
    // `Q` is unmapped in Normal mode.
    keys(&mut ed, "Q");
    assert_eq!(ed.contents(), "c\ndef");
    ex(&mut ed, "map W x");
    keys(&mut ed, "W");
    assert_eq!(ed.contents(), "\ndef");
    keys(&mut ed, "jvW");
    assert_eq!(ed.contents(), "\nef");
}

#[test]
fn recursive_mapping_is_cut_off() {
    let mut ed = editor("abc");
    ex(&mut ed, "nmap a b");
    ex(&mut ed, "nmap b a");
    keys(&mut ed, "a");
    assert_eq!(ed.status(), Some("Recursive mapping"));
    assert_eq!(ed.contents(), "abc");
    assert!(ed.translator().is_idle());
    assert_eq!(ed.mode(), Mode::Normal);
}

#[test]
fn unmap_restores_the_builtin() {
    let mut ed = editor("abc\ndef");
    ex(&mut ed, "nmap x dd");
    ex(&mut ed, "nunmap x");
    assert!(ed.translator().mappings().is_empty());
    keys(&mut ed, "x");
    assert_eq!(ed.contents(), "bc\ndef");
    ex(&mut ed, "nunmap x");
    assert_eq!(ed.status(), Some("No such mapping"));
}

#[test]
fn malformed_mappings_report() {
    let mut ed = editor("abc");
    ex(&mut ed, "nmap <NOPE> x");
    assert_eq!(ed.status(), Some("Invalid key notation: <NOPE>"));
    ex(&mut ed, "nmap Q");
    assert_eq!(ed.status(), Some("Argument required"));
    assert!(ed.translator().mappings().is_empty());
}
