//! Schema and field error types
//!
//! Two families live here:
//! - `SchemaError`: the configuration is unusable. Raised while the schema is
//!   built, never recovered.
//! - `FieldError`: one field of one row failed. Row-local; the reader records
//!   the message and moves on.

use std::fmt;

use thiserror::Error;

/// Per-field failure categories, in the order the evaluator checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// Empty field on a non-string type with no default
    EmptyValue,
    /// Raw text could not be converted to the field type
    Conversion,
    /// Converted value is not among `valid_values`
    Membership,
    /// Converted value is outside `min`/`max`
    Range,
    /// Converted value length is outside `min_len`/`max_len`
    Length,
    /// A custom checker rejected the value
    CustomCheck,
    /// The row does not have one field per schema column
    Structure,
}

impl FieldErrorKind {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            FieldErrorKind::EmptyValue => "CSVGATE_EMPTY_VALUE",
            FieldErrorKind::Conversion => "CSVGATE_CONVERSION",
            FieldErrorKind::Membership => "CSVGATE_MEMBERSHIP",
            FieldErrorKind::Range => "CSVGATE_RANGE",
            FieldErrorKind::Length => "CSVGATE_LENGTH",
            FieldErrorKind::CustomCheck => "CSVGATE_CUSTOM_CHECK",
            FieldErrorKind::Structure => "CSVGATE_ROW_STRUCTURE",
        }
    }
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single field failure. `Display` renders the message verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    kind: FieldErrorKind,
    message: String,
}

impl FieldError {
    pub fn new(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn empty_value() -> Self {
        Self::new(
            FieldErrorKind::EmptyValue,
            "Empty string cannot be converted to non-string types",
        )
    }

    pub fn not_integer(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Conversion,
            format!("Value \"{}\" is not an integer", raw),
        )
    }

    /// Integer syntax, but too large for 64 bits.
    pub fn integer_out_of_range(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Conversion,
            format!("Value \"{}\" is outside the 64-bit integer range", raw),
        )
    }

    pub fn not_float(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Conversion,
            format!("Value \"{}\" is not a float", raw),
        )
    }

    pub fn not_complex(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Conversion,
            format!("Value \"{}\" is not a complex number", raw),
        )
    }

    pub fn not_member(raw: &str, field_name: &str) -> Self {
        Self::new(
            FieldErrorKind::Membership,
            format!("{} is not a valid value of the {} field", raw, field_name),
        )
    }

    pub fn below_min(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Range,
            format!("Value \"{}\" is less than the specified min value", raw),
        )
    }

    pub fn above_max(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Range,
            format!("Value \"{}\" is greater than the specified max value", raw),
        )
    }

    /// Comparison against the bound was undefined (e.g. NaN).
    pub fn not_comparable(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Range,
            format!("Value \"{}\" cannot be compared with the specified bounds", raw),
        )
    }

    pub fn shorter_than_min(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Length,
            format!("The length of value \"{}\" is less than min_len", raw),
        )
    }

    pub fn longer_than_max(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Length,
            format!("The length of value \"{}\" is greater than max_len", raw),
        )
    }

    pub fn no_length(raw: &str) -> Self {
        Self::new(
            FieldErrorKind::Length,
            format!("Value \"{}\" has no length", raw),
        )
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(FieldErrorKind::CustomCheck, message)
    }

    pub fn wrong_field_count(found: usize, expected: usize) -> Self {
        Self::new(
            FieldErrorKind::Structure,
            format!("Row has {} fields but the schema defines {}", found, expected),
        )
    }

    pub fn kind(&self) -> FieldErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The configuration cannot be turned into a usable schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("\"validation_params\" not found in parameters")]
    MissingValidationParams,

    #[error("\"type\" parameter \"{type_name}\" is invalid")]
    InvalidType { field: String, type_name: String },

    #[error("field name at column {column} is empty")]
    EmptyName { column: usize },

    #[error("field name \"{0}\" is used more than once")]
    DuplicateName(String),

    #[error("field \"{field}\": base {base} is outside 2..=36")]
    InvalidBase { field: String, base: u32 },

    #[error("field \"{field}\": unknown converter \"{name}\"")]
    UnknownConverter { field: String, name: String },

    #[error("field \"{field}\": unknown error checker \"{name}\"")]
    UnknownChecker { field: String, name: String },

    #[error("field \"{field}\": invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("field \"{field}\": {param} value {value} cannot be used as a {type_name}")]
    InvalidParam {
        field: String,
        param: &'static str,
        value: String,
        type_name: &'static str,
    },

    #[error("field \"{field}\": min/max are not supported for {type_name} values")]
    UnorderedBounds {
        field: String,
        type_name: &'static str,
    },

    #[error("field \"{field}\": min_len {min_len} is greater than max_len {max_len}")]
    InvertedLengthBounds {
        field: String,
        min_len: usize,
        max_len: usize,
    },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;
