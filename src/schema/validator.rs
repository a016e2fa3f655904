//! Row validation against a `RowSchema`
//!
//! Every column is evaluated, so one row reports all of its failing fields.
//! Skipped (`None`) columns are never looked at.

use std::fmt::Write as _;

use super::errors::FieldError;
use super::evaluator::evaluate_field;
use super::rule::RowSchema;
use super::types::Value;

/// Error messages for one rejected row.
///
/// The first entry renders the raw row; each following entry is one failing
/// field's message, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBatch {
    entries: Vec<String>,
}

impl ErrorBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field failure, prefixing the rendered row on the first one.
    pub fn push_failure(&mut self, row: &[String], error: FieldError) {
        if self.entries.is_empty() {
            self.entries.push(render_row(row));
        }
        self.entries.push(error.into_message());
    }

    /// A batch for a record that could not be decoded into a row.
    ///
    /// `context` takes the place of the row rendering.
    pub fn unreadable(context: impl Into<String>, error: FieldError) -> Self {
        Self {
            entries: vec![context.into(), error.into_message()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries, including the row rendering.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of failing fields.
    pub fn failure_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Renders a raw row as a bracketed list of quoted fields: `['1997', 'Ford']`.
///
/// A field containing `'` but no `"` is wrapped in double quotes instead, so
/// only the chosen quote character is ever escaped.
pub fn render_row(row: &[String]) -> String {
    let mut out = String::from("[");
    for (i, field) in row.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let quote = if field.contains('\'') && !field.contains('"') { '"' } else { '\'' };
        out.push(quote);
        for c in field.chars() {
            match c {
                c if c == quote => {
                    out.push('\\');
                    out.push(c);
                }
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(out, "\\x{:02x}", c as u32);
                }
                c => out.push(c),
            }
        }
        out.push(quote);
    }
    out.push(']');
    out
}

/// Applies a schema to raw rows.
///
/// Validation does not mutate the schema and is deterministic: the same row
/// always yields the same values or the same `ErrorBatch`.
pub struct RowValidator<'a> {
    schema: &'a RowSchema,
}

impl<'a> RowValidator<'a> {
    pub fn new(schema: &'a RowSchema) -> Self {
        Self { schema }
    }

    /// Validates one row.
    ///
    /// Returns the converted values of the non-skipped columns in schema order,
    /// or the row's `ErrorBatch` if any field failed. A row whose length differs
    /// from the schema fails with a single structural message.
    pub fn validate(&self, row: &[String]) -> Result<Vec<Value>, ErrorBatch> {
        let mut errors = ErrorBatch::new();

        if row.len() != self.schema.len() {
            errors.push_failure(row, FieldError::wrong_field_count(row.len(), self.schema.len()));
            return Err(errors);
        }

        let mut values = Vec::with_capacity(self.schema.field_names().len());
        for (raw, rule) in row.iter().zip(self.schema.columns()) {
            let Some(rule) = rule else { continue };
            match evaluate_field(raw, rule) {
                Ok(value) => values.push(value),
                Err(error) => errors.push_failure(row, error),
            }
        }

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(errors)
        }
    }
}
