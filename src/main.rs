//! groundcast CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Failures are
//! printed to stderr and the process exits non-zero.

use groundcast::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
