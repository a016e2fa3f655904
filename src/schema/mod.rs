//! Declarative per-column schema for delimited records
//!
//! A schema is an ordered list of field rules, one per input column, with
//! `None` marking a column that is carried in the input but neither validated
//! nor emitted.
//!
//! # Design Principles
//!
//! - Rules are resolved once, at construction; nothing is looked up per row
//! - Checks run in a fixed order and the first failure wins for a field
//! - Range, membership and length compare converted values, never raw text
//! - Field failures are data (`FieldError`), not Rust errors
//! - Configuration problems are fatal (`SchemaError`)

mod errors;
mod evaluator;
mod plugins;
mod record;
mod rule;
mod types;
mod validator;

pub use errors::{FieldError, FieldErrorKind, SchemaError, SchemaResult};
pub use evaluator::evaluate_field;
pub use plugins::{FieldChecker, FieldConverter, PatternChecker, PluginRegistry};
pub use record::ValidatedRecord;
pub use rule::{Conversion, FieldRule, RowSchema};
pub use types::{CheckerSpec, Complex, FieldKind, FieldRuleSpec, Value};
pub use validator::{render_row, ErrorBatch, RowValidator};
