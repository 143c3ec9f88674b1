//! I/O utilities for line-oriented CSV reading, writing, and delimiter resolution.
//!
//! All file I/O in csv-sieve flows through this module. It provides:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Reader/writer construction**: buffered line readers and writers over
//!   plain files. The data path is raw UTF-8 lines with LF endings; no quoting
//!   layer sits between the file and the row splitter.
//! - **Header access**: `read_header_line` for the one line every run parses
//!   before any engine starts.

use std::{
    env,
    fs::File,
    io::{BufRead, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_line_reader(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(BufReader::new(file))
}

pub fn create_line_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    Ok(BufWriter::new(file))
}

/// Reads the first line of `path`. A file with no line at all is an error;
/// every run needs a header before any engine starts.
pub fn read_header_line(path: &Path) -> Result<String> {
    let mut reader = open_line_reader(path)?;
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .with_context(|| format!("Reading header from {path:?}"))?;
    if read == 0 {
        return Err(anyhow!("Input file {path:?} is empty (no header line)"));
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

/// Printable form of a delimiter byte for log lines; only the tab needs an
/// escape, everything else accepted by the CLI is already visible.
pub fn describe_delimiter(delimiter: u8) -> String {
    if delimiter == b'\t' {
        "\\t".to_string()
    } else {
        char::from(delimiter).to_string()
    }
}

/// Best-effort absolute form of `path` for diagnostics. Falls back to joining
/// onto the current directory when the path does not exist yet.
pub fn absolute_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn resolve_delimiter_prefers_explicit_value() {
        assert_eq!(resolve_delimiter(Path::new("data.tsv"), Some(b';')), b';');
    }

    #[test]
    fn resolve_delimiter_detects_tsv_extension() {
        assert_eq!(resolve_delimiter(Path::new("data.TSV"), None), b'\t');
        assert_eq!(resolve_delimiter(Path::new("data.csv"), None), b',');
        assert_eq!(resolve_delimiter(Path::new("data"), None), b',');
    }

    #[test]
    fn read_header_line_strips_line_endings() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("crlf.csv");
        let mut file = File::create(&path).expect("create");
        file.write_all(b"a,b,c\r\n1,2,3\n").expect("write");
        assert_eq!(read_header_line(&path).expect("header"), "a,b,c");
    }

    #[test]
    fn read_header_line_rejects_empty_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.csv");
        File::create(&path).expect("create");
        let err = read_header_line(&path).expect_err("empty file should fail");
        assert!(err.to_string().contains("no header"));
    }
}
