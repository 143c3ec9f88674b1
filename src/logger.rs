//! Serialized append-only error log shared across workers.
//!
//! Each append opens the file in append mode, writes one record, and closes
//! it again, entirely under the mutex; a crash mid-run leaves every
//! previously logged record intact on disk. The file is created lazily on
//! the first append, so clean runs leave no log behind.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};

#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `message` followed by a line break as one atomic record.
    pub fn append(&self, message: &str) -> Result<()> {
        let mut record = String::with_capacity(message.len() + 1);
        record.push_str(message);
        record.push('\n');
        self.write_locked(&record)
    }

    /// Appends a pre-formatted block of newline-terminated records in one
    /// exclusive write. Empty blocks are skipped without touching the file.
    pub fn append_block(&self, block: &str) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }
        self.write_locked(block)
    }

    fn write_locked(&self, text: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Opening error log {:?}", self.path))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("Appending to error log {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, thread};

    use super::*;

    #[test]
    fn append_terminates_each_record_with_a_line_break() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log = ErrorLog::new(dir.path().join("run.log"));
        log.append("first").expect("append");
        log.append("second").expect("append");
        let contents = fs::read_to_string(log.path()).expect("read log");
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn file_is_created_lazily() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log = ErrorLog::new(dir.path().join("run.log"));
        assert!(!log.path().exists());
        log.append("now").expect("append");
        assert!(log.path().exists());
    }

    #[test]
    fn empty_block_does_not_create_the_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log = ErrorLog::new(dir.path().join("run.log"));
        log.append_block("").expect("append");
        assert!(!log.path().exists());
    }

    #[test]
    fn concurrent_appends_never_interleave_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log = ErrorLog::new(dir.path().join("run.log"));
        thread::scope(|scope| {
            for worker in 0..8 {
                let log = &log;
                scope.spawn(move || {
                    for i in 0..50 {
                        log.append(&format!("worker {worker} message {i}"))
                            .expect("append");
                    }
                });
            }
        });
        let contents = fs::read_to_string(log.path()).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 8 * 50);
        for line in lines {
            assert!(
                line.starts_with("worker ") && line.contains(" message "),
                "malformed record: {line:?}"
            );
        }
    }
}
