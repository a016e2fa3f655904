//! Error sinks
//!
//! A sink receives the reader's full error list once, after the read has
//! decided to stop. Each error is written as one line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Destination for the accumulated error list.
pub trait ErrorSink {
    fn write_errors(&mut self, errors: &[String]) -> io::Result<()>;
}

/// Writes each error as one line, adding the newline when missing.
fn write_lines<W: Write>(writer: &mut W, errors: &[String]) -> io::Result<()> {
    for error in errors {
        writer.write_all(error.as_bytes())?;
        if !error.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()
}

/// Writes errors to a file.
///
/// The file is created (or truncated) only when errors are written, and
/// closed before `write_errors` returns on every path.
#[derive(Debug, Clone)]
pub struct FileErrorSink {
    path: PathBuf,
}

impl FileErrorSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorSink for FileErrorSink {
    fn write_errors(&mut self, errors: &[String]) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        write_lines(&mut writer, errors)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()
    }
}

/// Writes errors to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl ErrorSink for StderrSink {
    fn write_errors(&mut self, errors: &[String]) -> io::Result<()> {
        let stderr = io::stderr();
        let mut lock = stderr.lock();
        write_lines(&mut lock, errors)
    }
}

/// Keeps written errors in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    writes: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every error list written so far, one entry per write.
    pub fn writes(&self) -> Vec<Vec<String>> {
        match self.writes.lock() {
            Ok(writes) => writes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes().len()
    }
}

impl ErrorSink for MemorySink {
    fn write_errors(&mut self, errors: &[String]) -> io::Result<()> {
        let mut writes = self
            .writes
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink poisoned"))?;
        writes.push(errors.to_vec());
        Ok(())
    }
}
