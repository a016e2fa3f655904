//! Pull-based validating reader
//!
//! State machine:
//! - `Reading`: pull the next raw row and validate it
//! - valid row: emit a record, stay in `Reading`
//! - bad row: record its errors, emit `Skip`, stay in `Reading`
//! - bad row past the ceiling, end of input, or source failure: flush the
//!   errors to the sink and move to `Terminated`
//! - `Terminated` is absorbing; every later pull returns `End`
//!
//! Each pull is one complete transition. The reader owns its state
//! exclusively and is not meant to be shared between threads.

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::observability::{Event, LogEntry, LogSink};
use crate::schema::{
    ErrorBatch, FieldError, FieldErrorKind, RowSchema, RowValidator, ValidatedRecord,
};

use super::errors::{ReaderError, ReaderResult, SourceError};
use super::sink::ErrorSink;
use super::source::RawRecordSource;
use super::state::{ReaderState, DEFAULT_MAX_BAD_ROWS};

/// Outcome of one pull.
#[derive(Debug, Clone, PartialEq)]
pub enum Pull {
    /// The row was valid
    Record(ValidatedRecord),
    /// The row was rejected; its errors were recorded
    Skip,
    /// The read is over
    End,
}

/// Why a read stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The source ran out of rows
    Exhausted,
    /// More rows failed than `max_bad_rows` allows
    LimitExceeded,
    /// The source failed unrecoverably
    SourceFailed,
}

/// Configures a `StreamIterator` before it starts.
pub struct StreamBuilder {
    schema: RowSchema,
    max_bad_rows: usize,
    sink: Option<Box<dyn ErrorSink>>,
    log: Option<Box<dyn LogSink>>,
}

impl StreamBuilder {
    pub fn new(schema: RowSchema) -> Self {
        Self {
            schema,
            max_bad_rows: DEFAULT_MAX_BAD_ROWS,
            sink: None,
            log: None,
        }
    }

    /// Number of bad rows tolerated; one more stops the read.
    pub fn max_bad_rows(mut self, max_bad_rows: usize) -> Self {
        self.max_bad_rows = max_bad_rows;
        self
    }

    /// Where the error list is written when the read stops.
    pub fn error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Where run events are logged.
    pub fn log_sink(mut self, log: impl LogSink + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    /// Starts a read over `source`, logging the effective configuration.
    pub fn build<S: RawRecordSource>(self, source: S) -> StreamIterator<S> {
        let mut stream = StreamIterator {
            source: Some(source),
            schema: self.schema,
            state: ReaderState::new(self.max_bad_rows),
            sink: self.sink,
            log: self.log,
            run_id: Uuid::new_v4(),
            rows_read: 0,
            records_emitted: 0,
            termination: None,
        };

        let field_names = json!(&stream.schema.field_names()[..]);
        stream.log_event(
            Event::ReaderStart,
            &[
                ("columns", json!(stream.schema.len())),
                ("fields", field_names),
                ("max_bad_rows", json!(stream.state.max_bad_rows())),
                ("skipped_columns", json!(stream.schema.skipped_columns())),
            ],
        );
        stream
    }
}

/// Validating reader over a raw record source.
pub struct StreamIterator<S> {
    source: Option<S>,
    schema: RowSchema,
    state: ReaderState,
    sink: Option<Box<dyn ErrorSink>>,
    log: Option<Box<dyn LogSink>>,
    run_id: Uuid,
    rows_read: u64,
    records_emitted: u64,
    termination: Option<Termination>,
}

impl<S: RawRecordSource> StreamIterator<S> {
    /// A reader with the default ceiling and no sink or log.
    pub fn new(source: S, schema: RowSchema) -> Self {
        StreamBuilder::new(schema).build(source)
    }

    pub fn builder(schema: RowSchema) -> StreamBuilder {
        StreamBuilder::new(schema)
    }

    /// Performs one transition of the read.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::Source` if the source fails unrecoverably and
    /// `ReaderError::Sink` if the error list cannot be written. The reader is
    /// terminated in both cases.
    pub fn pull(&mut self) -> ReaderResult<Pull> {
        if self.termination.is_some() {
            return Ok(Pull::End);
        }
        let Some(source) = self.source.as_mut() else {
            return Ok(Pull::End);
        };

        let row = match source.next_record() {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.finish(Termination::Exhausted)?;
                return Ok(Pull::End);
            }
            Err(SourceError::Malformed { line, reason }) => {
                self.rows_read += 1;
                let context = match line {
                    Some(line) => format!("[unreadable record at line {}]", line),
                    None => "[unreadable record]".to_string(),
                };
                let error = FieldError::new(
                    FieldErrorKind::Structure,
                    format!("Record could not be decoded: {}", reason),
                );
                return self.reject(ErrorBatch::unreadable(context, error));
            }
            Err(err) => {
                self.log_event(Event::SourceFailed, &[("reason", json!(err.to_string()))]);
                self.finish(Termination::SourceFailed).ok();
                return Err(ReaderError::Source(err));
            }
        };
        self.rows_read += 1;

        match RowValidator::new(&self.schema).validate(&row) {
            Ok(values) => {
                self.records_emitted += 1;
                let names = Arc::clone(self.schema.field_names());
                Ok(Pull::Record(ValidatedRecord::new(names, values)))
            }
            Err(batch) => self.reject(batch),
        }
    }

    fn reject(&mut self, batch: ErrorBatch) -> ReaderResult<Pull> {
        let entries = json!(batch.entries());
        let row = json!(self.rows_read);

        if self.state.record_bad_row(batch) {
            self.log_event(
                Event::BadRowLimitExceeded,
                &[
                    ("bad_rows", json!(self.state.bad_row_count())),
                    ("errors", entries),
                    ("max_bad_rows", json!(self.state.max_bad_rows())),
                    ("row", row),
                ],
            );
            self.finish(Termination::LimitExceeded)?;
            return Ok(Pull::End);
        }

        self.log_event(Event::RowSkipped, &[("errors", entries), ("row", row)]);
        Ok(Pull::Skip)
    }

    /// Moves to `Terminated`: releases the source and flushes errors once.
    fn finish(&mut self, termination: Termination) -> ReaderResult<()> {
        self.termination = Some(termination);
        self.state.terminate();
        self.source = None;

        self.log_event(
            Event::ReaderComplete,
            &[
                ("bad_rows", json!(self.state.bad_row_count())),
                ("records", json!(self.records_emitted)),
                ("rows", json!(self.rows_read)),
                ("termination", json!(format!("{:?}", termination))),
            ],
        );

        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        sink.write_errors(self.state.errors()).map_err(|e| {
            self.log_event(Event::SinkFailed, &[("reason", json!(e.to_string()))]);
            ReaderError::Sink(e)
        })
    }

    fn log_event(&mut self, event: Event, fields: &[(&str, JsonValue)]) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let mut all_fields = Vec::with_capacity(fields.len() + 1);
        all_fields.push(("run_id", json!(self.run_id.to_string())));
        all_fields.extend(fields.iter().cloned());
        log.log(LogEntry::new(event, &all_fields));
    }

    /// Iterates valid records only, pulling past skipped rows.
    pub fn records(&mut self) -> Records<'_, S> {
        Records {
            stream: self,
            error: None,
        }
    }

    /// Errors accumulated so far, in the order they were recorded.
    pub fn errors(&self) -> &[String] {
        self.state.errors()
    }

    pub fn bad_row_count(&self) -> usize {
        self.state.bad_row_count()
    }

    pub fn max_bad_rows(&self) -> usize {
        self.state.max_bad_rows()
    }

    /// Raw rows pulled from the source, valid or not.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn records_emitted(&self) -> u64 {
        self.records_emitted
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

/// Iterator over the valid records of a read.
///
/// Stops on `End` or on the first `ReaderError`, which is kept for inspection.
pub struct Records<'a, S> {
    stream: &'a mut StreamIterator<S>,
    error: Option<ReaderError>,
}

impl<S> Records<'_, S> {
    /// Returns the error if iteration failed.
    pub fn error(&self) -> Option<&ReaderError> {
        self.error.as_ref()
    }

    /// Consumes the iterator and returns the error if any.
    pub fn into_error(self) -> Option<ReaderError> {
        self.error
    }
}

impl<S: RawRecordSource> Iterator for Records<'_, S> {
    type Item = ValidatedRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }

        loop {
            match self.stream.pull() {
                Ok(Pull::Record(record)) => return Some(record),
                Ok(Pull::Skip) => continue,
                Ok(Pull::End) => return None,
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
        }
    }
}
