//! Typed field values and the declarative rule format
//!
//! Supported field types:
//! - string: the raw text, unchanged
//! - integer: 64-bit signed integer, parsed with a configurable radix
//! - float: 64-bit floating point
//! - complex: pair of 64-bit floats written as `a+bj`

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Built-in conversion kinds selectable by the `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Complex,
}

impl FieldKind {
    /// Resolves a `type` name from configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "str" => Some(FieldKind::String),
            "integer" | "int" => Some(FieldKind::Integer),
            "float" => Some(FieldKind::Float),
            "complex" => Some(FieldKind::Complex),
            _ => None,
        }
    }

    /// Returns the type name for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Complex => "complex",
        }
    }

    /// Whether values of this kind have a total-enough order for min/max.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, FieldKind::Complex)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Complex number with `f64` parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Parses `5`, `3j`, `1+2j`, `-1.5e3-2J` or any of those in parentheses.
    ///
    /// Surrounding whitespace is ignored; whitespace inside the number is not.
    pub fn parse(input: &str) -> Option<Self> {
        let mut s = input.trim();
        if let Some(inner) = s.strip_prefix('(') {
            s = inner.strip_suffix(')')?.trim();
        }
        if s.is_empty() || s.contains(char::is_whitespace) {
            return None;
        }

        let Some(body) = s.strip_suffix(['j', 'J']) else {
            return parse_real(s).map(|re| Self::new(re, 0.0));
        };

        // Split point is the last sign that is not the leading sign and not an exponent sign.
        let bytes = body.as_bytes();
        let split = (1..bytes.len())
            .rev()
            .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'));

        match split {
            Some(i) => {
                let re = parse_real(&body[..i])?;
                let im = parse_imag(&body[i..])?;
                Some(Self::new(re, im))
            }
            None => parse_imag(body).map(|im| Self::new(0.0, im)),
        }
    }
}

fn parse_real(s: &str) -> Option<f64> {
    if s.is_empty() || s.starts_with("++") || s.starts_with("--") {
        return None;
    }
    s.parse::<f64>().ok()
}

fn parse_imag(s: &str) -> Option<f64> {
    match s {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        _ => parse_real(s),
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.re == 0.0 && self.re.is_sign_positive() {
            write!(f, "{}j", self.im)
        } else if self.im.is_sign_negative() {
            write!(f, "({}{}j)", self.re, self.im)
        } else {
            write!(f, "({}+{}j)", self.re, self.im)
        }
    }
}

/// A converted field value.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Complex(Complex),
}

impl Value {
    /// Name of the value's type for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Length of sequence-like values. Only strings have one; it counts characters.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    /// Whether this is an empty string value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::String(s) if s.is_empty())
    }
}

/// Integers and floats compare numerically with each other.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Complex(c), v) | (v, Value::Complex(c)) => {
                c.im == 0.0 && v.as_f64().is_some_and(|x| x == c.re)
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

/// Strings order lexically, numbers numerically; anything else is unordered.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Complex(_), _) | (_, Value::Complex(_)) => None,
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Complex(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Complex> for Value {
    fn from(c: Complex) -> Self {
        Value::Complex(c)
    }
}

/// Complex values serialize as `{"re": .., "im": ..}`; everything else as the JSON scalar.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Complex(c) => {
                use serde::ser::SerializeStruct;
                let mut st = serializer.serialize_struct("Complex", 2)?;
                st.serialize_field("re", &c.re)?;
                st.serialize_field("im", &c.im)?;
                st.end()
            }
        }
    }
}

/// How a rule names its custom checker in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckerSpec {
    /// A checker registered under this name
    Named(String),
    /// A regular expression the raw field must match
    Pattern {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// One entry of `validation_params` as written in configuration.
///
/// Bounds, defaults and valid values stay as raw JSON here; they are
/// converted to the rule's type when the schema is built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRuleSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_checker: Option<CheckerSpec>,
}

impl FieldRuleSpec {
    /// Creates a string rule with no checks
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn with_base(mut self, base: u32) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_range(mut self, min: serde_json::Value, max: serde_json::Value) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_valid_values(mut self, values: Vec<serde_json::Value>) -> Self {
        self.valid_values = Some(values);
        self
    }

    pub fn with_len(mut self, min_len: Option<usize>, max_len: Option<usize>) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_converter(mut self, name: impl Into<String>) -> Self {
        self.converter = Some(name.into());
        self
    }

    pub fn with_checker(mut self, name: impl Into<String>) -> Self {
        self.error_checker = Some(CheckerSpec::Named(name.into()));
        self
    }
}
