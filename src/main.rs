//! csvgate CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`, prints errors to
//! stderr and exits with:
//! - 0 when the read completed
//! - 1 on any error
//! - 2 when the read stopped at the bad-row ceiling

use csvgate::cli;

fn main() {
    match cli::run() {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
