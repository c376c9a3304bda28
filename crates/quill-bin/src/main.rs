//! quill entrypoint: loads a file, drives the editing core with a key script
//! and prints or writes the result.
use anyhow::{Context, Result, bail};
use clap::Parser;
use core_actions::{DocumentWriter, Editor};
use core_config::load_from;
use core_text::{Buffer, normalize_line_endings};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "quill.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "quill", version, about = "Headless modal text editor")]
struct Args {
    /// File to edit. Without one the editor starts on the intro screen.
    pub path: Option<PathBuf>,
    /// Keys to replay, in angle-bracket notation (`dd`, `ihello<ESC>`, `:2d<ENTER>`).
    #[arg(long = "keys", default_value = "")]
    pub keys: String,
    /// Configuration file (overrides discovery of `quill.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Write the buffer back to PATH instead of printing it.
    #[arg(long = "write")]
    pub write: bool,
    /// Directory for `quill.log`.
    #[arg(long = "log-dir", default_value = ".")]
    pub log_dir: PathBuf,
}

/// Text read from disk plus what is needed to write it back faithfully.
struct LoadedFile {
    buffer: Buffer,
    trailing_newline: bool,
    existed: bool,
}

fn configure_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn load_file(path: &Path) -> Result<LoadedFile> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string();
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let normalized = normalize_line_endings(&content);
            if normalized.len() != content.len() {
                warn!(target: "io", file = %path.display(), "line_endings_normalized");
            }
            debug!(
                target: "io",
                file = %path.display(),
                size_bytes = content.len(),
                line_count = normalized.lines().count(),
                "file_read_ok"
            );
            Ok(LoadedFile {
                trailing_newline: normalized.ends_with('\n'),
                buffer: Buffer::from_str(name, &normalized),
                existed: true,
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(target: "io", file = %path.display(), "new_file");
            Ok(LoadedFile {
                buffer: Buffer::new(name),
                trailing_newline: true,
                existed: false,
            })
        }
        Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
    }
}

/// Filesystem backend for `:w` and `--write`. Restores the trailing newline
/// the file was loaded with.
struct FileWriter {
    trailing_newline: bool,
}

impl DocumentWriter for FileWriter {
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        let mut out = contents.to_string();
        if self.trailing_newline && !out.is_empty() {
            out.push('\n');
        }
        std::fs::write(path, &out)?;
        debug!(target: "io", file = %path.display(), size_bytes = out.len(), "file_write_ok");
        Ok(())
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_from(args.config.clone())?;
    let loaded = args.path.as_deref().map(load_file).transpose()?;
    let mut editor = match &loaded {
        Some(file) => Editor::new(file.buffer.clone(), config),
        None => Editor::with_intro(Buffer::default(), config),
    };
    if let Some(path) = &args.path {
        editor.model_mut().state_mut().file_name = Some(path.clone());
    }
    let trailing_newline = loaded.as_ref().is_none_or(|f| f.trailing_newline);
    editor.set_writer(FileWriter { trailing_newline });
    info!(
        target: "runtime.startup",
        path = ?args.path,
        existed = loaded.as_ref().map(|f| f.existed),
        config_override = args.config.is_some(),
        "bootstrap_complete"
    );

    let result = editor
        .send_keys(&args.keys)
        .with_context(|| format!("bad key notation: {}", args.keys))?;
    if let Some(status) = editor.status() {
        eprintln!("{status}");
    }
    info!(target: "runtime", quit = result.quit, modified = editor.state().document.is_modified(), "keys_replayed");

    if args.write {
        let Some(path) = &args.path else {
            bail!("--write needs a file name");
        };
        FileWriter { trailing_newline }
            .write(path, &editor.contents())
            .with_context(|| format!("cannot write {}", path.display()))?;
    } else {
        println!("{}", editor.contents());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(&args.log_dir);
    install_panic_hook();
    info!(target: "runtime", "startup");
    let outcome = run(args);
    if let Err(e) = &outcome {
        tracing::error!(target: "runtime", error = %e, "exit_with_error");
    }
    outcome
}
