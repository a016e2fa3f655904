//! CLI argument definitions using clap
//!
//! Commands:
//! - csvgate validate --config <path> --input <path> [--errors <path>] [--log <path>]
//! - csvgate schema --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// csvgate - validating reader for delimited text
#[derive(Parser, Debug)]
#[command(name = "csvgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a file and print its valid records as JSON lines
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./csvgate.json")]
        config: PathBuf,

        /// Delimited text file to read
        #[arg(long)]
        input: PathBuf,

        /// Write accumulated errors here instead of stderr
        #[arg(long)]
        errors: Option<PathBuf>,

        /// Append JSON log lines to this file
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Resolve a configuration and print its schema
    Schema {
        /// Path to configuration file
        #[arg(long, default_value = "./csvgate.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
