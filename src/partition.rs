//! File-part concurrent engine.
//!
//! Three phases: a single-threaded split writes the data lines into N
//! headerless part files as contiguous equal-sized chunks in input order; one
//! scoped thread per part filters and projects its file into a partial
//! output; a single-threaded merge writes the projected header and
//! concatenates the partial outputs in part order. Contiguous chunking plus
//! order-preserving workers means the merged output keeps the input's row
//! order, matching the sequential engine byte for byte.
//!
//! All intermediate files live in a temp directory created next to the
//! output file and removed on every exit path, success or failure.

use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
    thread,
};

use anyhow::{Context, Result, anyhow};
use log::debug;

use crate::{
    context::{ProcessingContext, RowOutcome, RowStats},
    io_utils,
    logger::ErrorLog,
    rows,
};

pub struct PartitionOutcome {
    pub stats: RowStats,
    /// Where the part files lived. The directory is already gone when the
    /// engine returns; the path is kept for the run summary.
    pub temp_dir: PathBuf,
}

pub fn execute(
    context: &ProcessingContext,
    input: &Path,
    output: &Path,
    log: &ErrorLog,
    parts: usize,
) -> Result<PartitionOutcome> {
    let parts = parts.max(1);
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = tempfile::Builder::new()
        .prefix("csv-sieve-parts-")
        .tempdir_in(parent)
        .with_context(|| format!("Creating part directory under {parent:?}"))?;
    let temp_dir = temp.path().to_path_buf();

    split_into_parts(input, temp.path(), parts)?;

    let stats = thread::scope(|scope| -> Result<RowStats> {
        let mut handles = Vec::with_capacity(parts);
        for index in 0..parts {
            let part = part_path(&temp_dir, index);
            let part_output = part_output_path(&temp_dir, index);
            handles.push(scope.spawn(move || process_part(context, &part, &part_output, index, log)));
        }
        let mut total = RowStats::default();
        for (index, handle) in handles.into_iter().enumerate() {
            let part_stats = handle
                .join()
                .map_err(|_| anyhow!("Worker for part {index} panicked"))??;
            total.absorb(part_stats);
        }
        Ok(total)
    })?;

    merge_parts(context, &temp_dir, output, parts)?;

    Ok(PartitionOutcome { stats, temp_dir })
}

fn part_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("part_{index}.csv"))
}

fn part_output_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("part_{index}_out.csv"))
}

/// Writes the input's data lines into `parts` headerless chunk files. The
/// first `total % parts` chunks receive one extra line so the sizes differ by
/// at most one.
fn split_into_parts(input: &Path, dir: &Path, parts: usize) -> Result<()> {
    let total = count_data_lines(input)?;
    let base = total / parts;
    let remainder = total % parts;
    debug!("Splitting {total} data line(s) into {parts} part(s) of ~{base}");

    let reader = io_utils::open_line_reader(input)?;
    let mut data_lines = reader
        .lines()
        .skip(1)
        .filter(|line| !matches!(line, Ok(line) if rows::is_blank(line)));

    for index in 0..parts {
        let quota = base + usize::from(index < remainder);
        let path = part_path(dir, index);
        let mut writer = io_utils::create_line_writer(&path)?;
        for _ in 0..quota {
            let line = data_lines
                .next()
                .ok_or_else(|| anyhow!("Input shrank while splitting into parts"))?
                .with_context(|| format!("Reading data line from {input:?}"))?;
            writeln!(writer, "{line}").with_context(|| format!("Writing part file {path:?}"))?;
        }
        writer
            .flush()
            .with_context(|| format!("Flushing part file {path:?}"))?;
    }
    Ok(())
}

fn count_data_lines(input: &Path) -> Result<usize> {
    let reader = io_utils::open_line_reader(input)?;
    let mut count = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Counting lines in {input:?}"))?;
        if index == 0 || rows::is_blank(&line) {
            continue;
        }
        count += 1;
    }
    Ok(count)
}

/// Transforms one part file into its partial output, preserving row order.
/// Bad rows are appended to the shared log with part-local line numbers.
fn process_part(
    context: &ProcessingContext,
    part: &Path,
    part_output: &Path,
    index: usize,
    log: &ErrorLog,
) -> Result<RowStats> {
    let reader = io_utils::open_line_reader(part)?;
    let mut writer = io_utils::create_line_writer(part_output)?;
    let mut stats = RowStats::default();
    for (offset, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log.append(&format!("Part {index} I/O error: {err}"))?;
                return Err(err).with_context(|| format!("Reading part file {part:?}"));
            }
        };
        match context.transform(&line) {
            RowOutcome::Row(projected) => {
                writeln!(writer, "{projected}")
                    .with_context(|| format!("Writing part output {part_output:?}"))?;
                stats.valid_lines += 1;
            }
            RowOutcome::Filtered => {}
            RowOutcome::BadColumns(found) => {
                log.append(&format!(
                    "Part {index} line {} invalid columns: {found} (expected {})",
                    offset + 1,
                    context.total_columns
                ))?;
                stats.error_lines += 1;
            }
        }
    }
    writer
        .flush()
        .with_context(|| format!("Flushing part output {part_output:?}"))?;
    Ok(stats)
}

/// Writes the projected header, then the partial outputs in part order.
fn merge_parts(
    context: &ProcessingContext,
    dir: &Path,
    output: &Path,
    parts: usize,
) -> Result<()> {
    let mut writer = io_utils::create_line_writer(output)?;
    writeln!(writer, "{}", context.projected_header())
        .with_context(|| format!("Writing header to {output:?}"))?;
    for index in 0..parts {
        let path = part_output_path(dir, index);
        let reader = io_utils::open_line_reader(&path)?;
        for line in reader.lines() {
            let line = line.with_context(|| format!("Reading part output {path:?}"))?;
            if rows::is_blank(&line) {
                continue;
            }
            writeln!(writer, "{line}").with_context(|| format!("Merging into {output:?}"))?;
        }
    }
    writer
        .flush()
        .with_context(|| format!("Flushing output {output:?}"))
}
