//! The `process` command: plan a run, dispatch an engine, report.

use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use crate::{
    batch,
    cli::{Engine, ProcessArgs},
    context::ProcessingContext,
    history, io_utils,
    logger::ErrorLog,
    partition, sequential,
    summary::{self, RunSummary},
};

pub fn execute(args: &ProcessArgs) -> Result<()> {
    let delimiter = io_utils::resolve_delimiter(&args.input, args.delimiter);
    let separator = delimiter as char;
    if !args.input.is_file() {
        return Err(anyhow!(
            "Input file {:?} does not exist or is not a regular file",
            args.input
        ));
    }
    info!(
        "Processing '{}' -> '{}' (engine {}, delimiter '{}')",
        args.input.display(),
        args.output.display(),
        args.engine.label(),
        io_utils::describe_delimiter(delimiter)
    );

    let header_line = io_utils::read_header_line(&args.input)?;
    let context = ProcessingContext::build(
        &header_line,
        &args.columns,
        args.filter.as_deref(),
        separator,
    )
    .with_context(|| format!("Planning run for {:?}", args.input))?;

    let log_path = args
        .error_log
        .clone()
        .unwrap_or_else(|| args.output.with_extension("log"));
    let error_log = ErrorLog::new(&log_path);
    let parts = args.parts.unwrap_or_else(num_cpus::get).max(1);

    let started = Instant::now();
    let (stats, temp_dir) = match args.engine {
        Engine::Sequential => (
            sequential::execute(&context, &args.input, &args.output, &error_log)?,
            None,
        ),
        Engine::FileParts => {
            let outcome =
                partition::execute(&context, &args.input, &args.output, &error_log, parts)?;
            (outcome.stats, Some(outcome.temp_dir))
        }
        Engine::InMemory => (
            batch::execute(
                &context,
                &args.input,
                &args.output,
                &error_log,
                parts,
                args.batch_size,
            )?,
            None,
        ),
    };
    let elapsed = started.elapsed();

    summary::report(&RunSummary {
        label: args.engine.label(),
        input: &args.input,
        output: &args.output,
        log_path: &log_path,
        temp_dir: temp_dir.as_deref(),
        elapsed,
        stats,
    });
    if let Err(err) = history::append(args.engine.label(), &args.input, &args.output, elapsed) {
        warn!("Failed to append run history: {err:#}");
    }
    Ok(())
}
