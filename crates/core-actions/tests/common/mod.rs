#![allow(dead_code)] // Shared across the integration tests; each binary uses a subset.

use core_actions::Editor;
use core_config::Config;
use core_model::RecordingSink;
use core_text::{Buffer, Position};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn editor(text: &str) -> Editor {
    init_tracing();
    Editor::new(Buffer::from_str("test", text), Config::default())
}

pub fn editor_with(text: &str, config: Config) -> Editor {
    init_tracing();
    Editor::new(Buffer::from_str("test", text), config)
}

pub fn recording_editor(text: &str) -> Editor<RecordingSink> {
    init_tracing();
    Editor::with_sink(
        Buffer::from_str("test", text),
        Config::default(),
        RecordingSink::default(),
        false,
    )
}

/// Send keys in angle-bracket notation; panics on malformed notation.
pub fn keys<S: core_model::RenderSink>(ed: &mut Editor<S>, notation: &str) {
    ed.send_keys(notation).expect("valid key notation");
}

/// Run `notation` on a fresh editor over `text` and return the buffer.
pub fn after(text: &str, notation: &str) -> String {
    let mut ed = editor(text);
    keys(&mut ed, notation);
    ed.contents()
}

pub fn pos(line: usize, col: usize) -> Position {
    Position::new(line, col)
}

/// Run one Ex command typed literally, so `<` and `>` reach the command line.
pub fn ex<S: core_model::RenderSink>(ed: &mut Editor<S>, line: &str) {
    ed.send_key(core_events::KeyEvent::char(':'));
    for c in line.chars() {
        ed.send_key(core_events::KeyEvent::char(c));
    }
    keys(ed, "<ENTER>");
}
