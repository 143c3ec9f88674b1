//! In-memory batch concurrent engine.
//!
//! A single reader streams the input, accumulates non-blank data lines into
//! fixed-size batches, and submits them to a pool of worker threads over a
//! channel bounded to the pool size, so the reader blocks while every worker
//! is busy. Workers transform their batch into an immutable [`BatchResult`]
//! without touching any shared file; a dedicated merge thread appends result
//! output and log text strictly in batch-number order. Output order therefore
//! equals input order, and the hot path needs no locking at all.
//!
//! This trades the file-part engine's two-pass split-and-merge I/O for one
//! batch of lines in memory per in-flight task.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufWriter, Write},
    mem,
    path::Path,
    thread,
};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, bounded, unbounded};

use crate::{
    context::{ProcessingContext, RowOutcome, RowStats},
    io_utils,
    logger::ErrorLog,
    rows,
};

/// A worker's entire contribution for one batch, returned by value.
#[derive(Debug)]
pub struct BatchResult {
    batch_number: usize,
    output: String,
    log: String,
    processed_lines: u64,
    error_lines: u64,
}

struct Batch {
    number: usize,
    lines: Vec<String>,
}

pub fn execute(
    context: &ProcessingContext,
    input: &Path,
    output: &Path,
    log: &ErrorLog,
    workers: usize,
    batch_size: usize,
) -> Result<RowStats> {
    let workers = workers.max(1);
    let batch_size = batch_size.max(1);

    let reader = io_utils::open_line_reader(input)?;
    let mut writer = io_utils::create_line_writer(output)?;
    writeln!(writer, "{}", context.projected_header())
        .with_context(|| format!("Writing header to {output:?}"))?;

    thread::scope(|scope| -> Result<RowStats> {
        let (batch_tx, batch_rx) = bounded::<Batch>(workers);
        let (result_tx, result_rx) = unbounded::<BatchResult>();

        for _ in 0..workers {
            let batch_rx = batch_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for batch in batch_rx.iter() {
                    if result_tx.send(process_batch(context, batch)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(batch_rx);
        drop(result_tx);

        let merger = scope.spawn(move || merge_results(result_rx, writer, log));

        let mut number = 0usize;
        let mut pending: Vec<String> = Vec::with_capacity(batch_size);
        for (index, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("Reading line {} from {input:?}", index + 1))?;
            if index == 0 || rows::is_blank(&line) {
                continue;
            }
            pending.push(line);
            if pending.len() == batch_size {
                let lines = mem::replace(&mut pending, Vec::with_capacity(batch_size));
                batch_tx
                    .send(Batch { number, lines })
                    .context("Submitting batch to worker pool")?;
                number += 1;
            }
        }
        if !pending.is_empty() {
            batch_tx
                .send(Batch {
                    number,
                    lines: pending,
                })
                .context("Submitting final batch to worker pool")?;
        }
        drop(batch_tx);

        merger
            .join()
            .map_err(|_| anyhow!("Merge thread panicked"))?
    })
}

/// Transforms one batch entirely in memory. Per-row faults are recorded in
/// the result's log buffer and never abort the batch.
fn process_batch(context: &ProcessingContext, batch: Batch) -> BatchResult {
    let mut output = String::new();
    let mut log = String::new();
    let mut processed_lines = 0u64;
    let mut error_lines = 0u64;
    for line in &batch.lines {
        match context.transform(line) {
            RowOutcome::Row(projected) => {
                output.push_str(&projected);
                output.push('\n');
                processed_lines += 1;
            }
            RowOutcome::Filtered => {}
            RowOutcome::BadColumns(found) => {
                log.push_str(&format!(
                    "Batch {} - Error in line: invalid columns: {found} (expected {}) | Content: {line}\n",
                    batch.number, context.total_columns
                ));
                error_lines += 1;
            }
        }
    }
    BatchResult {
        batch_number: batch.number,
        output,
        log,
        processed_lines,
        error_lines,
    }
}

/// Appends results in batch-number order. Out-of-order arrivals wait in a
/// map keyed by batch number; batch numbers are dense, so the next expected
/// result always arrives eventually.
fn merge_results(
    results: Receiver<BatchResult>,
    mut writer: BufWriter<File>,
    log: &ErrorLog,
) -> Result<RowStats> {
    let mut pending: BTreeMap<usize, BatchResult> = BTreeMap::new();
    let mut next = 0usize;
    let mut stats = RowStats::default();
    for result in results.iter() {
        pending.insert(result.batch_number, result);
        while let Some(result) = pending.remove(&next) {
            writer
                .write_all(result.output.as_bytes())
                .context("Appending batch output")?;
            log.append_block(&result.log)?;
            stats.valid_lines += result.processed_lines;
            stats.error_lines += result.error_lines;
            next += 1;
        }
    }
    writer.flush().context("Flushing output")?;
    Ok(stats)
}
