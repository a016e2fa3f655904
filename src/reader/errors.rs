//! Reader error types
//!
//! Row-level problems never show up here; they become text in the reader's
//! error list. These types cover what is left:
//! - `SourceError`: the raw record source failed to produce a record
//! - `ReaderError`: the read cannot continue (source I/O or error sink failure)
//! - `ConfigError`: the reader configuration cannot be loaded or applied

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;

/// Failure to produce the next raw record.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying input failed; the read cannot continue
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    /// One record could not be decoded; later records may still be readable
    #[error("record at line {at} could not be decoded: {reason}", at = display_line(.line))]
    Malformed { line: Option<u64>, reason: String },
}

fn display_line(line: &Option<u64>) -> String {
    line.map_or_else(|| "?".to_string(), |l| l.to_string())
}

impl SourceError {
    /// Whether reading may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::Malformed { .. })
    }
}

impl From<csv::Error> for SourceError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line());
        match e.into_kind() {
            csv::ErrorKind::Io(io_err) => SourceError::Io(io_err),
            csv::ErrorKind::Utf8 { err, .. } => SourceError::Malformed {
                line,
                reason: err.to_string(),
            },
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => SourceError::Malformed {
                line,
                reason: format!("expected {} fields, found {}", expected_len, len),
            },
            other => SourceError::Malformed {
                line,
                reason: format!("{:?}", other),
            },
        }
    }
}

/// A read that had to stop for a reason other than exhaustion or the bad-row ceiling.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to write errors: {0}")]
    Sink(#[source] io::Error),
}

/// Result type for reader operations
pub type ReaderResult<T> = Result<T, ReaderError>;

/// The reader configuration cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid source option \"{key}\": {reason}")]
    SourceOption { key: String, reason: String },

    #[error("failed to open input {path}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_is_recoverable() {
        let err = SourceError::Malformed {
            line: Some(4),
            reason: "invalid utf-8".into(),
        };
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "record at line 4 could not be decoded: invalid utf-8"
        );

        let io_err = SourceError::Io(io::Error::new(io::ErrorKind::Other, "disk gone"));
        assert!(!io_err.is_recoverable());
    }

    #[test]
    fn test_missing_validation_params_message() {
        let err = ConfigError::from(SchemaError::MissingValidationParams);
        assert_eq!(err.to_string(), "\"validation_params\" not found in parameters");
    }
}
