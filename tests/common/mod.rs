#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Per-test scratch directory. Test inputs go in through [`Scratch::file`],
/// results come back out through [`Scratch::read`], and everything is
/// removed when the value drops.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create scratch dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates `name` under the scratch dir with the given contents and
    /// returns its full path.
    pub fn file(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write scratch file");
        path
    }

    /// Reads `name` (a path relative to the scratch dir) back as a string.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).expect("read scratch file")
    }
}
