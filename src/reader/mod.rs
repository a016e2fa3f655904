//! Streaming validation of delimited text
//!
//! A `StreamIterator` pulls raw rows from a `RawRecordSource`, validates each
//! against a `RowSchema`, yields the valid ones as `ValidatedRecord`s and
//! accumulates the errors of the rest. When more than `max_bad_rows` rows
//! fail, or the input ends, the accumulated errors are written once to the
//! configured `ErrorSink`.

mod config;
mod errors;
mod sink;
mod source;
mod state;
mod stream;

pub use config::ReaderConfig;
pub use errors::{ConfigError, ReaderError, ReaderResult, SourceError};
pub use sink::{ErrorSink, FileErrorSink, MemorySink, StderrSink};
pub use source::{CsvRecordSource, CsvSourceOptions, RawRecordSource, RawRow, VecRecordSource};
pub use state::{ReaderState, DEFAULT_MAX_BAD_ROWS};
pub use stream::{Pull, Records, StreamBuilder, StreamIterator, Termination};
