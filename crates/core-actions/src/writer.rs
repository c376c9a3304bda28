//! File backend for `:w`, `:wq` and `:x`.
//!
//! The editor core never touches the filesystem. A driver that can save
//! hands the editor a [`DocumentWriter`]; without one, write commands report
//! an error and leave the buffer modified.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub trait DocumentWriter {
    /// Store `contents` (lines joined with `\n`, no trailing newline) at
    /// `path`. Line ending policy belongs to the implementation.
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Keeps every write in memory, newest last. Clones share one log, so a
/// caller can keep a handle after giving the writer to an editor.
#[derive(Debug, Default, Clone)]
pub struct MemoryWriter {
    writes: Rc<RefCell<Vec<(PathBuf, String)>>>,
}

impl MemoryWriter {
    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes.borrow().clone()
    }
}

impl DocumentWriter for MemoryWriter {
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }
}
