//! Structured JSON run log
//!
//! - One log line = one event
//! - Keys in deterministic (alphabetical) order
//! - Explicit severity levels
//! - Every entry carries an RFC 3339 UTC timestamp
//! - Synchronous; each line is flushed as it is written
//!
//! Logging goes to whatever `LogSink` the caller hands the reader. There is
//! no process-wide logger.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One structured log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub severity: Severity,
    pub event: String,
    pub timestamp: String,
    pub fields: Map<String, Value>,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(event: Event, fields: &[(&str, Value)]) -> Self {
        Self {
            severity: event.severity(),
            event: event.as_str().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Renders the entry as a single JSON line, newline included.
    ///
    /// `event`, `severity` and `timestamp` cannot be overridden by fields.
    pub fn to_json_line(&self) -> String {
        let mut object = self.fields.clone();
        object.insert("event".into(), Value::String(self.event.clone()));
        object.insert("severity".into(), Value::String(self.severity.as_str().into()));
        object.insert("timestamp".into(), Value::String(self.timestamp.clone()));

        let mut line = Value::Object(object).to_string();
        line.push('\n');
        line
    }
}

/// Destination for run log entries.
pub trait LogSink {
    fn log(&mut self, entry: LogEntry);
}

/// Writes entries as JSON lines to any writer.
pub struct JsonLogger<W: Write> {
    writer: W,
}

impl<W: Write> JsonLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLogger<BufWriter<File>> {
    /// Opens (or creates) a log file for appending.
    pub fn append_to(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl JsonLogger<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> LogSink for JsonLogger<W> {
    fn log(&mut self, entry: LogEntry) {
        // A failing log must not stop the read.
        let _ = self.writer.write_all(entry.to_json_line().as_bytes());
        let _ = self.writer.flush();
    }
}

/// Keeps entries in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Names of logged events, in order.
    pub fn events(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.event).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemoryLog {
    fn log(&mut self, entry: LogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
