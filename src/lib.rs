pub mod batch;
pub mod cli;
pub mod columns;
pub mod context;
pub mod filter;
pub mod history;
pub mod install;
pub mod io_utils;
pub mod logger;
pub mod partition;
pub mod process;
pub mod rows;
pub mod sequential;
pub mod summary;

use std::{env, sync::Once, time::Instant};

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use log::{LevelFilter, debug, error, info};

use crate::cli::{Cli, Commands};

static INIT_LOGGER: Once = Once::new();

fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var_os("RUST_LOG").is_none() {
            builder.filter_module("csv_sieve", LevelFilter::Info);
        }
        let _ = builder.try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Process(args) => run_operation("process", || process::execute(&args)),
        Commands::Install(args) => run_operation("install", || install::execute(&args)),
    }
}

/// Wraps one command invocation with timing and outcome logging.
fn run_operation<F>(name: &str, op: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    debug!("Starting operation '{name}' at {started_at}");
    let timer = Instant::now();
    let result = op();
    let elapsed_ms = timer.elapsed().as_millis();

    match &result {
        Ok(()) => info!("Operation '{name}' finished in {elapsed_ms} ms (started {started_at})"),
        Err(err) => error!(
            "Operation '{name}' failed after {elapsed_ms} ms (started {started_at}): {err:#}"
        ),
    }

    result
}
