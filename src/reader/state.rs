//! Bad-row bookkeeping for one read

use crate::schema::ErrorBatch;

/// Default ceiling on tolerated bad rows.
pub const DEFAULT_MAX_BAD_ROWS: usize = 100;

/// Counts bad rows, accumulates their errors and decides when to stop.
///
/// The error list only ever grows, except that the limit summary is placed
/// at its front when the ceiling is exceeded.
#[derive(Debug, Clone)]
pub struct ReaderState {
    bad_row_count: usize,
    max_bad_rows: usize,
    errors: Vec<String>,
    terminated: bool,
}

impl ReaderState {
    pub fn new(max_bad_rows: usize) -> Self {
        Self {
            bad_row_count: 0,
            max_bad_rows,
            errors: Vec::new(),
            terminated: false,
        }
    }

    /// Records a rejected row.
    ///
    /// Returns `true` if this row pushed the count past the ceiling, in which
    /// case the limit summary has been put at the front of the error list.
    pub fn record_bad_row(&mut self, batch: ErrorBatch) -> bool {
        self.errors.extend(batch.into_entries());
        self.bad_row_count += 1;

        if self.limit_exceeded() {
            self.errors.insert(0, self.limit_message());
            return true;
        }
        false
    }

    pub fn limit_exceeded(&self) -> bool {
        self.bad_row_count > self.max_bad_rows
    }

    /// The summary placed at the front of the errors when the ceiling is exceeded.
    pub fn limit_message(&self) -> String {
        format!(
            "{} bad CSV rows. max_bad_rows limit exceeded.",
            self.bad_row_count
        )
    }

    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn bad_row_count(&self) -> usize {
        self.bad_row_count
    }

    pub fn max_bad_rows(&self) -> usize {
        self.max_bad_rows
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl Default for ReaderState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BAD_ROWS)
    }
}
