//! Entry point for the csv-sieve binary.
//!
//! Delegates to [`csv_sieve::run()`] and translates its `Result` into
//! process exit codes: `0` on success, `1` on any error.

fn main() {
    if csv_sieve::run().is_err() {
        std::process::exit(1);
    }
}
