//! [`Editor`]: the owning context a driver talks to.
//!
//! One editor holds the model (state plus view), the configuration, the key
//! translator and the render sink. Each key runs inside one paint scope; the
//! sink hears about damage, the cursor and the mode only when that scope
//! closes. Macro replays open nested scopes and feed their keys through the
//! same path as typed keys. Ex commands that change the key tables or save
//! the buffer hand their work back here as an [`EditorRequest`].

use crate::dispatcher::{self, Cx, DispatchResult, EditorRequest, ExError, Session};
use crate::key_translator::KeyTranslator;
use crate::macros::{MacroRequest, MacroState};
use crate::writer::DocumentWriter;
use crate::{Action, Env};
use core_config::{Config, ConfigContext};
use core_events::{KeyCode, KeyEvent, KeyNotationError, parse_keys};
use core_model::{EditorModel, NullSink, RenderSink, View};
use core_state::{Document, EditorState, Mode, ModeStack, RegisterContent, RegisterStore};
use core_text::{Buffer, Position};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

pub struct Editor<S: RenderSink = NullSink> {
    model: EditorModel,
    config: Config,
    env: Env,
    translator: KeyTranslator,
    session: Session,
    macros: MacroState,
    writer: Option<Box<dyn DocumentWriter>>,
    sink: S,
}

impl Editor<NullSink> {
    pub fn new(buffer: Buffer, config: Config) -> Self {
        Self::with_sink(buffer, config, NullSink, false)
    }

    /// Editor that starts on the intro screen; the first key leaves it.
    pub fn with_intro(buffer: Buffer, config: Config) -> Self {
        Self::with_sink(buffer, config, NullSink, true)
    }
}

impl<S: RenderSink> Editor<S> {
    pub fn with_sink(buffer: Buffer, mut config: Config, sink: S, intro: bool) -> Self {
        let view = &config.file.view;
        let ctx = ConfigContext::new(view.columns, view.lines, 1);
        config.apply_context(ctx);
        let document = Document::with_undo_levels(buffer, config.undo_levels());
        let mut state = EditorState::with_document(document);
        if intro {
            state.modes = ModeStack::with_intro();
        }
        let env = Env::from_config(&config);
        let translator = KeyTranslator::new(config.file.input.timeout_duration());
        let mut model = EditorModel::with_view(View::new(), state);
        model.sync_view(env.opts, env.margin);
        let caret = model.caret();
        model.state_mut().document.commit(caret);
        debug!(target: "actions.dispatch", intro, ?env, "editor_created");
        Self {
            model,
            config,
            env,
            translator,
            session: Session::default(),
            macros: MacroState::new(),
            writer: None,
            sink,
        }
    }

    pub fn model(&self) -> &EditorModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut EditorModel {
        &mut self.model
    }

    pub fn state(&self) -> &EditorState {
        self.model.state()
    }

    pub fn view(&self) -> &View {
        self.model.view()
    }

    pub fn mode(&self) -> Mode {
        self.model.state().mode()
    }

    pub fn contents(&self) -> String {
        self.model.state().buffer().contents()
    }

    pub fn caret(&self) -> Position {
        self.model.caret()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Backend for `:w`; without one, writes report an error.
    pub fn set_writer(&mut self, writer: impl DocumentWriter + 'static) {
        self.writer = Some(Box::new(writer));
    }

    pub fn translator(&self) -> &KeyTranslator {
        &self.translator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn status(&self) -> Option<&str> {
        self.model.state().status_text()
    }

    /// Register a macro is being recorded into.
    pub fn recording(&self) -> Option<char> {
        self.macros.recording()
    }

    /// When an ambiguous key prefix commits if no further key arrives.
    pub fn deadline(&self) -> Option<Instant> {
        self.translator.deadline()
    }

    pub fn send_key(&mut self, key: KeyEvent) -> DispatchResult {
        self.send_key_at(key, Instant::now())
    }

    /// Handle one key at time `now` (used for the ambiguity deadline).
    pub fn send_key_at(&mut self, key: KeyEvent, now: Instant) -> DispatchResult {
        self.paint_scope().feed(key, now)
    }

    /// Send keys written in angle-bracket notation, stopping after a quit.
    pub fn send_keys(&mut self, notation: &str) -> Result<DispatchResult, KeyNotationError> {
        let keys = parse_keys(notation)?;
        let mut result = DispatchResult::clean();
        for key in keys {
            result = result.merge(self.send_key(key));
            if result.quit {
                break;
            }
        }
        Ok(result)
    }

    /// Commit an ambiguous prefix once its deadline has passed.
    pub fn flush_timeout(&mut self, now: Instant) -> DispatchResult {
        let mode = self.mode();
        let Some(action) = self.translator.flush_timeout(mode, now) else {
            return DispatchResult::clean();
        };
        let mut ed = self.paint_scope();
        ed.run(action, now).merge(ed.drain(now))
    }

    /// Apply a new viewport size.
    pub fn resize(&mut self, ctx: ConfigContext) {
        self.config.apply_context(ctx);
        self.env = Env::from_config(&self.config);
        let mut ed = self.paint_scope();
        ed.model.view_mut().paint.damage_all();
        let (opts, margin) = (ed.env.opts, ed.env.margin);
        ed.model.sync_view(opts, margin);
    }

    fn paint_scope(&mut self) -> PaintScope<'_, S> {
        self.model.view_mut().paint.begin();
        PaintScope { editor: self }
    }

    fn with_cx<R>(&mut self, f: impl FnOnce(&mut Cx<'_>) -> R) -> R {
        let (state, view) = self.model.split();
        let mut cx = Cx {
            state,
            view,
            env: &self.env,
            session: &mut self.session,
        };
        f(&mut cx)
    }

    fn feed(&mut self, key: KeyEvent, now: Instant) -> DispatchResult {
        let mut result = DispatchResult::clean();
        if self.mode() == Mode::Intro {
            // The key that leaves the intro screen is handled in Normal mode.
            result = self.with_cx(|cx| dispatcher::mode::change(cx, Mode::Normal));
            self.model.sync_view(self.env.opts, self.env.margin);
        }
        let stops_recording = self.macros.recording().is_some()
            && self.macros.depth() == 0
            && self.translator.is_idle()
            && matches!(self.mode(), Mode::Normal | Mode::Visual | Mode::VisualLine)
            && key == KeyEvent::char('q');
        if stops_recording {
            if let Some((register, text)) = self.macros.stop() {
                let state = self.model.state_mut();
                state
                    .registers
                    .set_register(register, RegisterContent::charwise(&text));
                state.ephemeral_status = None;
            }
            return result.merge(DispatchResult::dirty());
        }
        self.macros.record(key);
        if key.code == KeyCode::Esc && self.mode() == Mode::Normal && !self.translator.is_idle() {
            trace!(target: "input.map", "pending_discarded");
            self.translator.reset();
            return result;
        }
        self.translator.push(key);
        result.merge(self.drain(now))
    }

    fn drain(&mut self, now: Instant) -> DispatchResult {
        let mut result = DispatchResult::clean();
        loop {
            let mode = self.mode();
            let Some(action) = self.translator.next_action(mode, now) else {
                break;
            };
            result = result.merge(self.run(action, now));
            if result.quit {
                self.translator.reset();
                break;
            }
        }
        if self.translator.take_recursion_error() {
            self.model.state_mut().report("Recursive mapping");
            result = result.merge(DispatchResult::dirty());
        }
        result
    }

    fn run(&mut self, action: Action, now: Instant) -> DispatchResult {
        let mut result = self.with_cx(|cx| dispatcher::dispatch(action, cx));
        self.model.sync_view(self.env.opts, self.env.margin);
        if !self.mode().is_edit_mode() {
            let caret = self.model.caret();
            self.model.state_mut().document.commit(caret);
        }
        if let Some(request) = self.session.request.take() {
            result = result.merge(self.handle_request(request));
        }
        if let Some(request) = self.session.macro_request.take() {
            result = result.merge(self.handle_macro(request, now));
        }
        result
    }

    fn handle_request(&mut self, request: EditorRequest) -> DispatchResult {
        match request {
            EditorRequest::Map(mapping) => {
                self.translator.map(mapping);
                DispatchResult::clean()
            }
            EditorRequest::Unmap { modes, lhs } => {
                if self.translator.unmap(&lhs, modes) {
                    return DispatchResult::clean();
                }
                self.model.state_mut().report(ExError::NoMapping.to_string());
                DispatchResult::dirty()
            }
            EditorRequest::Write { path, quit } => self.write(path, quit),
        }
    }

    /// Save the buffer through the writer. Writing to the buffer's own file
    /// (or naming one for a buffer without) marks it saved.
    fn write(&mut self, path: PathBuf, quit: bool) -> DispatchResult {
        let contents = self.contents();
        let lines = self.state().buffer().line_count();
        let Some(writer) = self.writer.as_mut() else {
            warn!(target: "actions.ex", path = %path.display(), "no_writer");
            self.model.state_mut().report("Cannot write: no file backend");
            return DispatchResult::dirty();
        };
        if let Err(e) = writer.write(&path, &contents) {
            warn!(target: "actions.ex", path = %path.display(), error = %e, "write_failed");
            self.model
                .state_mut()
                .report(format!("Can't write \"{}\": {e}", path.display()));
            return DispatchResult::dirty();
        }
        info!(target: "actions.ex", path = %path.display(), lines, bytes = contents.len(), "written");
        let state = self.model.state_mut();
        let own = *state.file_name.get_or_insert_with(|| path.clone()) == path;
        if own {
            state.document.mark_saved();
        }
        state.report(format!("\"{}\" {lines}L, {}B written", path.display(), contents.len()));
        if quit {
            DispatchResult::quit()
        } else {
            DispatchResult::dirty()
        }
    }

    fn handle_macro(&mut self, request: MacroRequest, now: Instant) -> DispatchResult {
        match request {
            MacroRequest::Record(register) => {
                let msg = match self.macros.start(register) {
                    Ok(()) => format!("recording @{register}"),
                    Err(e) => e.to_string(),
                };
                self.model.state_mut().report(msg);
                DispatchResult::dirty()
            }
            MacroRequest::Replay { register, count } => self.replay(register, count, now),
        }
    }

    fn replay(&mut self, register: char, count: usize, now: Instant) -> DispatchResult {
        let keys = match self.macro_keys(register) {
            Ok(keys) => keys,
            Err(msg) => {
                self.model.state_mut().report(msg);
                return DispatchResult::dirty();
            }
        };
        if let Err(e) = self.macros.enter() {
            self.model.state_mut().report(e.to_string());
            return DispatchResult::dirty();
        }
        debug!(target: "actions.dispatch", %register, count, keys = keys.len(), depth = self.macros.depth(), "macro_replay");
        // Keys typed after `@x` run once the macro is done.
        let stashed = self.translator.take_pending();
        let mut result = DispatchResult::clean();
        {
            let mut ed = self.paint_scope();
            'outer: for _ in 0..count.max(1) {
                for key in &keys {
                    result = result.merge(ed.feed(*key, now));
                    if result.quit {
                        break 'outer;
                    }
                }
            }
        }
        self.macros.leave();
        for key in stashed {
            self.translator.push(key);
        }
        result
    }

    fn macro_keys(&mut self, register: char) -> Result<Vec<KeyEvent>, String> {
        let name = self.macros.resolve(register).map_err(|e| e.to_string())?;
        let content = self
            .model
            .state()
            .registers
            .get_register(name.to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| format!("Register {name} is empty"))?;
        parse_keys(&content.text()).map_err(|e| e.to_string())
    }
}

/// One open paint scope. Dropping it closes the scope, and closing the
/// outermost scope flushes the batch to the sink.
struct PaintScope<'a, S: RenderSink> {
    editor: &'a mut Editor<S>,
}

impl<S: RenderSink> Deref for PaintScope<'_, S> {
    type Target = Editor<S>;

    fn deref(&self) -> &Editor<S> {
        self.editor
    }
}

impl<S: RenderSink> DerefMut for PaintScope<'_, S> {
    fn deref_mut(&mut self) -> &mut Editor<S> {
        self.editor
    }
}

impl<S: RenderSink> Drop for PaintScope<'_, S> {
    fn drop(&mut self) {
        let Editor { model, sink, .. } = &mut *self.editor;
        let paint = &mut model.view_mut().paint;
        if paint.end() && !std::thread::panicking() {
            paint.flush(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{RecordingSink, RenderEvent};

    fn editor(text: &str) -> Editor {
        Editor::new(Buffer::from_str("t", text), Config::default())
    }

    #[test]
    fn keys_edit_the_buffer() {
        let mut ed = editor("hello");
        ed.send_keys("xA!<ESC>").unwrap();
        assert_eq!(ed.contents(), "ello!");
        assert_eq!(ed.mode(), Mode::Normal);
        assert_eq!(ed.caret(), Position::new(0, 4));
    }

    #[test]
    fn intro_key_is_handled_in_normal_mode() {
        let mut ed = Editor::with_intro(Buffer::default(), Config::default());
        assert_eq!(ed.mode(), Mode::Intro);
        ed.send_keys("ihi<ESC>").unwrap();
        assert_eq!(ed.mode(), Mode::Normal);
        assert_eq!(ed.contents(), "hi");
    }

    #[test]
    fn escape_discards_pending_operator() {
        let mut ed = editor("one two");
        ed.send_keys("d<ESC>w").unwrap();
        assert_eq!(ed.contents(), "one two");
        assert_eq!(ed.caret(), Position::new(0, 4));
    }

    #[test]
    fn sink_hears_once_per_key() {
        let mut ed = Editor::with_sink(Buffer::from_str("t", "ab"), Config::default(), RecordingSink::default(), false);
        ed.send_keys("i").unwrap();
        let events = ed.sink_mut().take();
        assert!(events.contains(&RenderEvent::ModeChanged("INSERT".into())));
        assert_eq!(
            events.iter().filter(|e| matches!(e, RenderEvent::CursorMoved(_))).count(),
            1
        );
    }

    #[test]
    fn early_returns_close_the_paint_scope() {
        let mut ed = Editor::with_sink(Buffer::from_str("t", "ab\ncd"), Config::default(), RecordingSink::default(), false);
        // Pending discard, recording stop, failed replay and quit all leave early.
        for keys in ["d<ESC>", "qaxq", "@z", "2@a", ":q!<ENTER>"] {
            ed.send_keys(keys).unwrap();
            assert_eq!(ed.view().paint.depth(), 0, "after {keys}");
        }
        ed.sink_mut().take();
        ed.send_keys("j").unwrap();
        assert_eq!(ed.sink_mut().take(), vec![RenderEvent::CursorMoved(core_model::ScreenPos::new(1, 0))]);
    }

    #[test]
    fn quit_stops_key_stream() {
        let mut ed = editor("x");
        let result = ed.send_keys(":q<ENTER>ihello").unwrap();
        assert!(result.quit);
        assert_eq!(ed.contents(), "x");
    }
}
