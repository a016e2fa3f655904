//! Run log events
//!
//! Every entry the reader writes to its run log is one of these.

use std::fmt;

use super::logger::Severity;

/// Observable events of a validating read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Reader constructed; carries the effective configuration
    ReaderStart,
    /// A row failed validation and was skipped
    RowSkipped,
    /// The bad-row ceiling was exceeded; the read stops
    BadRowLimitExceeded,
    /// The raw record source failed
    SourceFailed,
    /// The error sink could not be written
    SinkFailed,
    /// The read finished; carries row counts
    ReaderComplete,
}

impl Event {
    /// Returns the event name string
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ReaderStart => "READER_START",
            Event::RowSkipped => "ROW_SKIPPED",
            Event::BadRowLimitExceeded => "BAD_ROW_LIMIT_EXCEEDED",
            Event::SourceFailed => "SOURCE_FAILED",
            Event::SinkFailed => "SINK_FAILED",
            Event::ReaderComplete => "READER_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ReaderStart | Event::ReaderComplete => Severity::Info,
            Event::RowSkipped => Severity::Warn,
            Event::BadRowLimitExceeded | Event::SourceFailed | Event::SinkFailed => {
                Severity::Error
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
