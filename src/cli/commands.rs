//! CLI command implementations
//!
//! `validate` streams one file through the reader and prints its valid
//! records; `schema` resolves a configuration without reading any data.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::observability::JsonLogger;
use crate::reader::{
    FileErrorSink, Pull, RawRecordSource, ReaderConfig, StderrSink, StreamBuilder,
    StreamIterator, Termination,
};
use crate::schema::{Conversion, FieldRule, PluginRegistry};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_record};

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Finished normally
    Completed,
    /// The read stopped because too many rows were bad
    LimitExceeded,
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::LimitExceeded => 2,
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<Outcome> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Outcome> {
    match cmd {
        Command::Validate {
            config,
            input,
            errors,
            log,
        } => validate(&config, &input, errors.as_deref(), log.as_deref()),
        Command::Schema { config } => schema(&config),
    }
}

/// Validate `input` and print its valid records to stdout
///
/// Errors go to `errors_path` when given, otherwise to stderr after the
/// records.
pub fn validate(
    config_path: &Path,
    input: &Path,
    errors_path: Option<&Path>,
    log_path: Option<&Path>,
) -> CliResult<Outcome> {
    let config = ReaderConfig::load(config_path)?;
    let registry = PluginRegistry::with_builtins();
    let mut builder = config.builder(&registry)?;

    builder = match errors_path {
        Some(path) => builder.error_sink(FileErrorSink::new(path)),
        None => builder.error_sink(StderrSink),
    };
    if let Some(path) = log_path {
        let logger = JsonLogger::append_to(path).map_err(|e| {
            CliError::io_error(format!("Failed to open log {}: {}", path.display(), e))
        })?;
        builder = builder.log_sink(logger);
    }

    let source = config.open_source(input)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let outcome = stream_records(builder, source, &mut out)?;
    out.flush()?;
    Ok(outcome)
}

/// Pulls every row from `source`, writing valid records to `out`.
pub fn stream_records<S: RawRecordSource, W: Write>(
    builder: StreamBuilder,
    source: S,
    out: &mut W,
) -> CliResult<Outcome> {
    let mut stream: StreamIterator<S> = builder.build(source);
    loop {
        match stream.pull()? {
            Pull::Record(record) => write_record(out, &record)?,
            Pull::Skip => {}
            Pull::End => break,
        }
    }

    match stream.termination() {
        Some(Termination::LimitExceeded) => Ok(Outcome::LimitExceeded),
        _ => Ok(Outcome::Completed),
    }
}

/// Resolve a configuration and print the schema it describes
pub fn schema(config_path: &Path) -> CliResult<Outcome> {
    let config = ReaderConfig::load(config_path)?;
    let summary = schema_summary(&config, &PluginRegistry::with_builtins())?;

    let stdout = io::stdout();
    write_json(&mut stdout.lock(), &summary)?;
    Ok(Outcome::Completed)
}

/// JSON description of a resolved configuration.
pub fn schema_summary(config: &ReaderConfig, registry: &PluginRegistry) -> CliResult<Value> {
    let schema = config.schema(registry)?;
    config.csv_options()?;

    let columns: Vec<Value> = schema
        .columns()
        .iter()
        .map(|rule| rule.as_ref().map_or(Value::Null, rule_summary))
        .collect();

    Ok(json!({
        "columns": columns,
        "fields": &schema.field_names()[..],
        "max_bad_rows": config.max_bad_rows,
        "num_header_lines": config.num_header_lines,
        "source_options": config.source_options,
    }))
}

fn rule_summary(rule: &FieldRule) -> Value {
    let converter = match rule.conversion() {
        Conversion::Custom { name, .. } => Some(name.as_str()),
        _ => None,
    };

    json!({
        "name": rule.name(),
        "desc": rule.desc(),
        "type": rule.kind().type_name(),
        "base": rule.base(),
        "converter": converter,
        "error_checker": rule.checker_name(),
        "valid_values": rule.valid_values(),
        "min": rule.min(),
        "max": rule.max(),
        "min_len": rule.min_len(),
        "max_len": rule.max_len(),
        "default": rule.default_value(),
    })
}
