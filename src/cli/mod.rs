//! CLI module for csvgate
//!
//! Provides command-line interface for:
//! - validate: Stream a file, print valid records, report bad rows
//! - schema: Resolve a configuration and print its schema

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command, schema, schema_summary, stream_records, validate, Outcome};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_record};
