//! Observability for validating reads
//!
//! Provides:
//! - Structured logging (JSON lines)
//! - Typed run events
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes what the reader emits
//! 2. Loggers are injected, never global
//! 3. No async or background threads
//! 4. Deterministic output apart from timestamps

mod events;
mod logger;

pub use events::Event;
pub use logger::{JsonLogger, LogEntry, LogSink, MemoryLog, Severity};
