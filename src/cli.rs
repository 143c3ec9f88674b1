use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Filter and project CSV files in parallel", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Transform a CSV file by filtering rows and projecting columns
    Process(ProcessArgs),
    /// Install the csv-sieve binary via cargo install
    Install(InstallArgs),
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input CSV file to process
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Columns to keep: `*` for all, or a comma-separated list of 1-based positions such as `3,1`
    #[arg(short = 'C', long = "columns", default_value = "*")]
    pub columns: String,
    /// Row filter such as `age >= 18 AND stress >= 7 OR city = "Roma"`
    #[arg(short = 'f', long = "filter")]
    pub filter: Option<String>,
    /// Execution engine to run the transformation with
    #[arg(long = "engine", value_enum, default_value = "sequential")]
    pub engine: Engine,
    /// Number of parts/workers (defaults to the logical CPU count)
    #[arg(long = "parts")]
    pub parts: Option<usize>,
    /// Lines per batch for the in-memory engine
    #[arg(long = "batch-size", default_value_t = 10_000)]
    pub batch_size: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Error log file (defaults to the output path with a `.log` extension)
    #[arg(long = "error-log")]
    pub error_log: Option<PathBuf>,
}

/// Execution strategies for the `process` command.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum Engine {
    /// Single-threaded read-filter-project-write baseline
    #[default]
    Sequential,
    /// Split the input into part files and process them on parallel threads
    FileParts,
    /// Stream line batches through a worker pool, merging results in order
    InMemory,
}

impl Engine {
    pub fn label(self) -> &'static str {
        match self {
            Engine::Sequential => "SEQUENTIAL",
            Engine::FileParts => "CONCURRENT",
            Engine::InMemory => "CONCURRENT IN-MEMORY",
        }
    }
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Install a specific published version
    #[arg(long)]
    pub version: Option<String>,
    /// Force reinstallation even if already installed
    #[arg(long)]
    pub force: bool,
    /// Use --locked to honour Cargo.lock for dependencies
    #[arg(long)]
    pub locked: bool,
    /// Install into an alternate root directory
    #[arg(long)]
    pub root: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
