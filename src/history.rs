//! Execution-history bookkeeping.
//!
//! Appends one record per run to `metrics/run-history.csv` under the current
//! working directory, creating the directory and the header row on first
//! use. This file is the one place the tool emits properly quoted CSV, since
//! user-supplied paths may contain commas.

use std::{
    fs::{self, OpenOptions},
    path::Path,
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

const HISTORY_DIR: &str = "metrics";
const HISTORY_FILE: &str = "run-history.csv";

pub fn append(mode: &str, input: &Path, output: &Path, elapsed: Duration) -> Result<()> {
    fs::create_dir_all(HISTORY_DIR)
        .with_context(|| format!("Creating history directory {HISTORY_DIR:?}"))?;
    let path = Path::new(HISTORY_DIR).join(HISTORY_FILE);
    let write_header = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Opening history file {path:?}"))?;
    let mut writer = csv::WriterBuilder::new().from_writer(file);
    if write_header {
        writer
            .write_record(["timestamp", "mode", "input", "output", "millis", "seconds"])
            .context("Writing history header")?;
    }
    writer
        .write_record([
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            mode.to_string(),
            input.display().to_string(),
            output.display().to_string(),
            elapsed.as_millis().to_string(),
            format!("{:.2}", elapsed.as_secs_f64()),
        ])
        .context("Writing history record")?;
    writer.flush().context("Flushing history file")
}
