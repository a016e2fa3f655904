//! Reader configuration
//!
//! One JSON object drives a read. The reader consumes `max_bad_rows`,
//! `num_header_lines` and `validation_params`; every other key is kept as a
//! source option and interpreted by `CsvSourceOptions`.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::schema::{FieldRuleSpec, PluginRegistry, RowSchema, SchemaError};

use super::errors::ConfigError;
use super::source::{CsvRecordSource, CsvSourceOptions};
use super::state::DEFAULT_MAX_BAD_ROWS;
use super::stream::StreamBuilder;

/// Configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// Bad rows tolerated before the read stops (default 100)
    #[serde(default = "default_max_bad_rows")]
    pub max_bad_rows: usize,

    /// Physical lines discarded before parsing (default 0)
    #[serde(default)]
    pub num_header_lines: usize,

    /// One rule per column, `null` for ignored columns (required)
    #[serde(default)]
    pub validation_params: Option<Vec<Option<FieldRuleSpec>>>,

    /// Everything else, handed to the source untouched
    #[serde(flatten)]
    pub source_options: Map<String, Value>,
}

fn default_max_bad_rows() -> usize {
    DEFAULT_MAX_BAD_ROWS
}

impl ReaderConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Resolves `validation_params` against `registry`.
    pub fn schema(&self, registry: &PluginRegistry) -> Result<RowSchema, ConfigError> {
        let specs = self
            .validation_params
            .as_deref()
            .ok_or(SchemaError::MissingValidationParams)?;
        Ok(RowSchema::from_specs(specs, registry)?)
    }

    /// Interprets the pass-through keys as CSV dialect options.
    pub fn csv_options(&self) -> Result<CsvSourceOptions, ConfigError> {
        CsvSourceOptions::from_map(&self.source_options)
    }

    /// Opens `path` as a CSV source, skipping the configured header lines.
    pub fn open_source(
        &self,
        path: &Path,
    ) -> Result<CsvRecordSource<BufReader<File>>, ConfigError> {
        CsvRecordSource::open(path, &self.csv_options()?, self.num_header_lines)
    }

    /// A stream builder carrying this configuration's schema and ceiling.
    pub fn builder(&self, registry: &PluginRegistry) -> Result<StreamBuilder, ConfigError> {
        Ok(StreamBuilder::new(self.schema(registry)?).max_bad_rows(self.max_bad_rows))
    }
}
