//! End-of-run reporting.
//!
//! One multi-line `info!` record per run: engine label, file names, wall
//! time in milliseconds and seconds, absolute output and log paths, the
//! part-directory path for the file-part engine, and the row accounting.

use std::{path::Path, time::Duration};

use log::info;

use crate::{context::RowStats, io_utils};

pub struct RunSummary<'a> {
    pub label: &'static str,
    pub input: &'a Path,
    pub output: &'a Path,
    pub log_path: &'a Path,
    pub temp_dir: Option<&'a Path>,
    pub elapsed: Duration,
    pub stats: RowStats,
}

pub fn report(summary: &RunSummary<'_>) {
    let mut lines = vec![
        format!("{} run finished", summary.label),
        format!("input: {}", summary.input.display()),
        format!("output: {}", summary.output.display()),
        format!("elapsed_ms: {}", summary.elapsed.as_millis()),
        format!("elapsed_secs: {:.2}", summary.elapsed.as_secs_f64()),
        format!(
            "output_path: {}",
            io_utils::absolute_path(summary.output).display()
        ),
        format!(
            "log_path: {}",
            io_utils::absolute_path(summary.log_path).display()
        ),
    ];
    if let Some(temp_dir) = summary.temp_dir {
        lines.push(format!(
            "part_dir: {}",
            io_utils::absolute_path(temp_dir).display()
        ));
    }
    lines.push(format!(
        "rows: {} valid, {} error",
        summary.stats.valid_lines, summary.stats.error_lines
    ));
    info!("{}", lines.join("\n"));
}
