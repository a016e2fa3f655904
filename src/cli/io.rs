//! JSON output for the CLI
//!
//! - Records: one JSON object per line, fields in schema order
//! - UTF-8 only

use std::io::Write;

use serde::Serialize;

use crate::schema::ValidatedRecord;

use super::errors::CliResult;

/// Write one record as a JSON line
pub fn write_record<W: Write>(out: &mut W, record: &ValidatedRecord) -> CliResult<()> {
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)?;
    Ok(())
}

/// Write a pretty-printed JSON document
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
