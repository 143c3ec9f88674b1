//! Single-threaded reference engine.
//!
//! Reads the input line by line, skips blank lines, logs rows whose column
//! count disagrees with the header, filters, projects, and writes. The two
//! concurrent engines must produce the same set of output rows; this one
//! defines the expected order and the log message shape for bad rows.

use std::{
    io::{BufRead, Write},
    path::Path,
};

use anyhow::{Context, Result};

use crate::{
    context::{ProcessingContext, RowOutcome, RowStats},
    io_utils,
    logger::ErrorLog,
};

pub fn execute(
    context: &ProcessingContext,
    input: &Path,
    output: &Path,
    log: &ErrorLog,
) -> Result<RowStats> {
    let reader = io_utils::open_line_reader(input)?;
    let mut writer = io_utils::create_line_writer(output)?;
    writeln!(writer, "{}", context.projected_header())
        .with_context(|| format!("Writing header to {output:?}"))?;

    let mut stats = RowStats::default();
    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("Reading line {number} from {input:?}"))?;
        if number == 1 {
            // Header was parsed by the caller when the context was built.
            continue;
        }
        if crate::rows::is_blank(&line) {
            continue;
        }
        match context.transform(&line) {
            RowOutcome::Row(projected) => {
                writeln!(writer, "{projected}")
                    .with_context(|| format!("Writing row to {output:?}"))?;
                stats.valid_lines += 1;
            }
            RowOutcome::Filtered => {}
            RowOutcome::BadColumns(found) => {
                log.append(&format!(
                    "Line {number} invalid columns: {found} (expected {})",
                    context.total_columns
                ))?;
                stats.error_lines += 1;
            }
        }
    }
    writer
        .flush()
        .with_context(|| format!("Flushing output {output:?}"))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_input(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("input.csv");
        fs::write(&path, contents).expect("write input");
        path
    }

    fn run(
        dir: &tempfile::TempDir,
        contents: &str,
        columns: &str,
        filter: Option<&str>,
    ) -> (String, String, RowStats) {
        let input = write_input(dir, contents);
        let output = dir.path().join("output.csv");
        let log = ErrorLog::new(dir.path().join("run.log"));
        let header = io_utils::read_header_line(&input).expect("header");
        let context = ProcessingContext::build(&header, columns, filter, ',').expect("context");
        let stats = execute(&context, &input, &output, &log).expect("run");
        let produced = fs::read_to_string(&output).expect("read output");
        let logged = fs::read_to_string(log.path()).unwrap_or_default();
        (produced, logged, stats)
    }

    #[test]
    fn select_all_without_filter_reproduces_the_input() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (output, logged, stats) = run(&dir, "a,b,c\n1,2,3\n4,5,6\n", "*", None);
        assert_eq!(output, "a,b,c\n1,2,3\n4,5,6\n");
        assert!(logged.is_empty());
        assert_eq!(stats.valid_lines, 2);
        assert_eq!(stats.error_lines, 0);
    }

    #[test]
    fn column_subset_reorders_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (output, _, _) = run(&dir, "a,b,c\n1,2,3\n4,5,6\n", "3,1", None);
        assert_eq!(output, "c,a\n3,1\n6,4\n");
    }

    #[test]
    fn numeric_filter_keeps_matching_rows_in_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (output, _, stats) = run(
            &dir,
            "name,age\nalice,30\nbob,17\ncarol,42\n",
            "*",
            Some("age >= 18"),
        );
        assert_eq!(output, "name,age\nalice,30\ncarol,42\n");
        assert_eq!(stats.valid_lines, 2);
    }

    #[test]
    fn malformed_row_is_logged_and_dropped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (output, logged, stats) = run(&dir, "a,b\n1,2\nx,y,z\n3,4\n", "*", None);
        assert_eq!(output, "a,b\n1,2\n3,4\n");
        assert_eq!(logged, "Line 3 invalid columns: 3 (expected 2)\n");
        assert_eq!(stats.valid_lines, 2);
        assert_eq!(stats.error_lines, 1);
    }

    #[test]
    fn blank_lines_are_skipped_silently() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (output, logged, stats) = run(&dir, "a,b\n1,2\n\n   \n3,4\n", "*", None);
        assert_eq!(output, "a,b\n1,2\n3,4\n");
        assert!(logged.is_empty());
        assert_eq!(stats.valid_lines, 2);
        assert_eq!(stats.error_lines, 0);
    }
}
