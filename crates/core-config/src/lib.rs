//! Configuration loading and parsing.
//!
//! Options live in `quill.toml` (or an override path provided by the binary).
//! Every field has a serde default so a partial file, a missing file or an
//! unparsable file all yield a usable [`Config`]. Unknown fields are ignored.
//!
//! The editing core reads options through [`Config::view_options`] at the
//! start of each navigation call and never writes them back. The vertical
//! scroll margin is clamped against the live viewport by
//! [`Config::apply_context`]; the raw parsed value is retained so a resize can
//! re-clamp.

use anyhow::Result;
use core_model::ViewOptions;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{info, warn};

pub const FILE_NAME: &str = "quill.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigContext {
    pub viewport_columns: u16,
    pub viewport_rows: u16,
    /// Rows reserved below the text (status / command line).
    pub status_rows: u16,
}

impl ConfigContext {
    pub fn new(viewport_columns: u16, viewport_rows: u16, status_rows: u16) -> Self {
        Self {
            viewport_columns,
            viewport_rows,
            status_rows,
        }
    }

    pub fn text_rows(&self) -> u16 {
        self.viewport_rows.saturating_sub(self.status_rows)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    #[serde(default = "ViewConfig::default_tabstop")]
    pub tabstop: u16,
    #[serde(default = "ViewConfig::default_wrap")]
    pub wrap: bool,
    #[serde(default = "ViewConfig::default_columns")]
    pub columns: u16,
    #[serde(default = "ViewConfig::default_lines")]
    pub lines: u16,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            tabstop: Self::default_tabstop(),
            wrap: Self::default_wrap(),
            columns: Self::default_columns(),
            lines: Self::default_lines(),
        }
    }
}

impl ViewConfig {
    const fn default_tabstop() -> u16 {
        8
    }
    const fn default_wrap() -> bool {
        true
    }
    const fn default_columns() -> u16 {
        80
    }
    const fn default_lines() -> u16 {
        24
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EditConfig {
    #[serde(default = "EditConfig::default_shiftwidth")]
    pub shiftwidth: u16,
    #[serde(default)]
    pub expandtab: bool,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            shiftwidth: Self::default_shiftwidth(),
            expandtab: false,
        }
    }
}

impl EditConfig {
    const fn default_shiftwidth() -> u16 {
        8
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct MarginConfig {
    #[serde(default)]
    pub vertical: u16,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ScrollConfig {
    #[serde(default)]
    pub margin: MarginConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_timeout")]
    pub timeout: bool,
    /// Milliseconds to wait before committing an ambiguous key sequence.
    #[serde(default = "InputConfig::default_timeoutlen")]
    pub timeoutlen: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            timeout: Self::default_timeout(),
            timeoutlen: Self::default_timeoutlen(),
        }
    }
}

impl InputConfig {
    const fn default_timeout() -> bool {
        true
    }
    const fn default_timeoutlen() -> u32 {
        1000
    }

    /// Wait before an ambiguous sequence commits; `None` waits forever.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
            .then(|| Duration::from_millis(u64::from(self.timeoutlen)))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UndoConfig {
    #[serde(default = "UndoConfig::default_levels")]
    pub levels: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            levels: Self::default_levels(),
        }
    }
}

impl UndoConfig {
    const fn default_levels() -> usize {
        1000
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub edit: EditConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub undo: UndoConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,            // original file string (optional)
    pub file: ConfigFile,               // parsed (or default) data
    pub effective_vertical_margin: u16, // clamped to viewport semantics
    context: Option<ConfigContext>,
}

/// Best-effort config path: local working directory first, then the platform
/// config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("quill").join(FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
                ..Config::default()
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Apply the live viewport to compute the clamped vertical margin.
    /// Returns the effective (possibly clamped) value.
    pub fn apply_context(&mut self, ctx: ConfigContext) -> u16 {
        let raw = self.file.scroll.margin.vertical;
        let text_rows = ctx.text_rows();
        let (clamped, max) = if text_rows <= 3 {
            (0, 0)
        } else {
            let max = text_rows.saturating_sub(2) / 2;
            (raw.min(max), max)
        };

        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max,
                text_rows,
                viewport_rows = ctx.viewport_rows,
                status_rows = ctx.status_rows,
                "scroll_margin_vertical_clamped"
            );
        }
        self.context = Some(ctx);
        self.effective_vertical_margin = clamped;
        clamped
    }

    /// Recompute after a viewport change. Returns `Some(new_margin)` when the
    /// effective value changed.
    pub fn recompute_with_context(&mut self, ctx: ConfigContext) -> Option<u16> {
        let prev = self.effective_vertical_margin;
        let current = self.apply_context(ctx);
        (current != prev).then_some(current)
    }

    /// Read-only option snapshot for one navigation call. The live viewport
    /// wins over `[view] columns/lines` once a context was applied; one row is
    /// kept for the status line otherwise.
    pub fn view_options(&self) -> ViewOptions {
        let view = &self.file.view;
        let (columns, rows) = match self.context {
            Some(ctx) => (ctx.viewport_columns, ctx.text_rows()),
            None => (view.columns, view.lines.saturating_sub(1)),
        };
        ViewOptions {
            tab_width: usize::from(view.tabstop.max(1)),
            wrap: view.wrap,
            columns: usize::from(columns.max(1)),
            rows: usize::from(rows.max(1)),
        }
    }

    pub fn scroll_margin(&self) -> usize {
        usize::from(self.effective_vertical_margin)
    }

    pub fn shiftwidth(&self) -> usize {
        usize::from(self.file.edit.shiftwidth.max(1))
    }

    pub fn expandtab(&self) -> bool {
        self.file.edit.expandtab
    }

    pub fn undo_levels(&self) -> usize {
        self.file.undo.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    fn ctx_with_text_rows(rows: u16) -> ConfigContext {
        ConfigContext::new(80, rows, 0)
    }

    fn load_str(text: &str) -> Config {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), text).unwrap();
        load_from(Some(tmp.path().to_path_buf())).unwrap()
    }

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn defaults_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file, ConfigFile::default());
        assert_eq!(cfg.file.view.tabstop, 8);
        assert!(cfg.file.view.wrap);
        assert_eq!(cfg.file.edit.shiftwidth, 8);
        assert!(!cfg.file.edit.expandtab);
        assert!(cfg.file.input.timeout);
        assert_eq!(cfg.file.input.timeoutlen, 1000);
        assert_eq!(cfg.undo_levels(), 1000);
        assert_eq!(
            cfg.view_options(),
            ViewOptions {
                tab_width: 8,
                wrap: true,
                columns: 80,
                rows: 23
            }
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = load_str("[view]\ntabstop = 4\nwrap = false\n[edit]\nexpandtab = true\n");
        assert_eq!(cfg.file.view.tabstop, 4);
        assert!(!cfg.file.view.wrap);
        assert_eq!(cfg.file.view.columns, 80);
        assert!(cfg.expandtab());
        assert_eq!(cfg.shiftwidth(), 8);
        assert_eq!(cfg.file.scroll.margin.vertical, 0);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let cfg = load_str("[view\ntabstop = ");
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file, ConfigFile::default());
    }

    #[test]
    fn clamps_when_value_exceeds_half_minus_one() {
        let mut cfg = load_str("[scroll.margin]\nvertical = 50\n");
        // text rows 20 -> max = (20 - 2)/2 = 9
        assert_eq!(cfg.apply_context(ctx_with_text_rows(20)), 9);
        assert_eq!(cfg.scroll_margin(), 9);
    }

    #[test]
    fn recompute_with_context_changes_when_height_shrinks() {
        let mut cfg = load_str("[scroll.margin]\nvertical = 10\n");
        cfg.apply_context(ctx_with_text_rows(50));
        assert_eq!(cfg.effective_vertical_margin, 10);
        assert_eq!(cfg.recompute_with_context(ctx_with_text_rows(10)), Some(4));
        assert_eq!(cfg.recompute_with_context(ctx_with_text_rows(11)), None);
        assert_eq!(cfg.recompute_with_context(ctx_with_text_rows(3)), Some(0));
    }

    #[test]
    fn live_viewport_overrides_view_size() {
        let mut cfg = load_str("[view]\ncolumns = 100\nlines = 40\n");
        assert_eq!(cfg.view_options().columns, 100);
        assert_eq!(cfg.view_options().rows, 39);
        cfg.apply_context(ConfigContext::new(60, 20, 2));
        assert_eq!(cfg.view_options().columns, 60);
        assert_eq!(cfg.view_options().rows, 18);
    }

    #[test]
    fn input_timeout_fields() {
        let cfg = load_str("[input]\ntimeout = false\ntimeoutlen = 250\n");
        assert!(!cfg.file.input.timeout);
        assert_eq!(cfg.file.input.timeoutlen, 250);
        assert_eq!(cfg.file.input.timeout_duration(), None);
        let cfg = load_str("[input]\ntimeoutlen = 250\n");
        assert_eq!(
            cfg.file.input.timeout_duration(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let mut cfg = load_str("[scroll.margin]\nvertical = 8\n");
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        with_default(subscriber, || {
            // text rows 6 -> max = (6 - 2)/2 = 2
            cfg.apply_context(ConfigContext::new(80, 7, 1));
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("scroll_margin_vertical_clamped"));
        assert_eq!(cfg.effective_vertical_margin, 2);
    }
}
