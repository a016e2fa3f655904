//! csvgate - a validating, fault-tolerant reader for delimited text
//!
//! Rows are checked against a per-column `RowSchema` as they stream in.
//! Valid rows come out as typed `ValidatedRecord`s; bad rows are skipped and
//! their errors collected until a configurable ceiling stops the read.

pub mod cli;
pub mod observability;
pub mod reader;
pub mod schema;
