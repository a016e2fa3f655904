//! Custom converters and checkers
//!
//! Configuration can only name a converter or checker, so implementations are
//! registered here and looked up once, when the schema is built. Closures with
//! the right signature implement both traits.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::errors::{SchemaError, SchemaResult};
use super::evaluator::{parse_float, parse_integer};
use super::rule::FieldRule;
use super::types::{CheckerSpec, Value};

/// Replaces built-in type conversion for a field.
///
/// Receives the raw field and the rule's radix. An `Err` carries the message
/// reported for the field.
pub trait FieldConverter: Send + Sync {
    fn convert(&self, raw: &str, base: u32) -> Result<Value, String>;
}

impl<F> FieldConverter for F
where
    F: Fn(&str, u32) -> Result<Value, String> + Send + Sync,
{
    fn convert(&self, raw: &str, base: u32) -> Result<Value, String> {
        self(raw, base)
    }
}

/// Arbitrary validation run after every built-in check passed.
///
/// Returns the error message, or `None` if the field is acceptable.
pub trait FieldChecker: Send + Sync {
    fn check(&self, raw: &str, rule: &FieldRule) -> Option<String>;
}

impl<F> FieldChecker for F
where
    F: Fn(&str, &FieldRule) -> Option<String> + Send + Sync,
{
    fn check(&self, raw: &str, rule: &FieldRule) -> Option<String> {
        self(raw, rule)
    }
}

/// Checker that requires the raw field to match a regular expression.
pub struct PatternChecker {
    regex: Regex,
    message: Option<String>,
}

impl PatternChecker {
    pub fn new(pattern: &str, message: Option<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message,
        })
    }
}

impl FieldChecker for PatternChecker {
    fn check(&self, raw: &str, _rule: &FieldRule) -> Option<String> {
        if self.regex.is_match(raw) {
            return None;
        }
        Some(match &self.message {
            Some(message) => message.clone(),
            None => format!(
                "Value \"{}\" does not match the pattern {}",
                raw,
                self.regex.as_str()
            ),
        })
    }
}

/// Named converters and checkers available to configuration.
#[derive(Clone)]
pub struct PluginRegistry {
    converters: HashMap<String, Arc<dyn FieldConverter>>,
    checkers: HashMap<String, Arc<dyn FieldChecker>>,
}

impl PluginRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
            checkers: HashMap::new(),
        }
    }

    /// A registry with the built-in converters and checkers.
    ///
    /// Converters: `integer`, `round`, `trim`, `lowercase`, `uppercase`.
    /// Checkers: `not_blank`, `ascii`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        registry.register_converter("integer", |raw: &str, base: u32| {
            parse_integer(raw, base)
                .map(Value::Integer)
                .map_err(|e| e.field_error(raw).into_message())
        });
        registry.register_converter("round", |raw: &str, _base: u32| {
            parse_float(raw)
                .filter(|x| x.is_finite() && x.abs() < i64::MAX as f64)
                .map(|x| Value::Integer(x.round() as i64))
                .ok_or_else(|| format!("Value \"{}\" is not a float", raw))
        });
        registry.register_converter("trim", |raw: &str, _base: u32| {
            Ok(Value::String(raw.trim().to_string()))
        });
        registry.register_converter("lowercase", |raw: &str, _base: u32| {
            Ok(Value::String(raw.to_lowercase()))
        });
        registry.register_converter("uppercase", |raw: &str, _base: u32| {
            Ok(Value::String(raw.to_uppercase()))
        });

        registry.register_checker("not_blank", |raw: &str, rule: &FieldRule| {
            raw.trim()
                .is_empty()
                .then(|| format!("Value of the {} field is blank", rule.name()))
        });
        registry.register_checker("ascii", |raw: &str, _rule: &FieldRule| {
            (!raw.is_ascii()).then(|| format!("Value \"{}\" contains non-ASCII characters", raw))
        });

        registry
    }

    /// Registers a converter, replacing any previous one with the same name.
    pub fn register_converter(
        &mut self,
        name: impl Into<String>,
        converter: impl FieldConverter + 'static,
    ) -> &mut Self {
        self.converters.insert(name.into(), Arc::new(converter));
        self
    }

    /// Registers a checker, replacing any previous one with the same name.
    pub fn register_checker(
        &mut self,
        name: impl Into<String>,
        checker: impl FieldChecker + 'static,
    ) -> &mut Self {
        self.checkers.insert(name.into(), Arc::new(checker));
        self
    }

    pub fn converter(&self, name: &str) -> Option<Arc<dyn FieldConverter>> {
        self.converters.get(name).cloned()
    }

    pub fn checker(&self, name: &str) -> Option<Arc<dyn FieldChecker>> {
        self.checkers.get(name).cloned()
    }

    /// Resolves a converter name for `field`.
    pub(crate) fn resolve_converter(
        &self,
        field: &str,
        name: &str,
    ) -> SchemaResult<Arc<dyn FieldConverter>> {
        self.converter(name).ok_or_else(|| SchemaError::UnknownConverter {
            field: field.to_string(),
            name: name.to_string(),
        })
    }

    /// Resolves a checker spec for `field`, compiling patterns.
    pub(crate) fn resolve_checker(
        &self,
        field: &str,
        spec: &CheckerSpec,
    ) -> SchemaResult<(String, Arc<dyn FieldChecker>)> {
        match spec {
            CheckerSpec::Named(name) => {
                let checker = self.checker(name).ok_or_else(|| SchemaError::UnknownChecker {
                    field: field.to_string(),
                    name: name.clone(),
                })?;
                Ok((name.clone(), checker))
            }
            CheckerSpec::Pattern { pattern, message } => {
                let checker = PatternChecker::new(pattern, message.clone()).map_err(|e| {
                    SchemaError::InvalidPattern {
                        field: field.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok((format!("pattern {}", pattern), Arc::new(checker)))
            }
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut converters: Vec<_> = self.converters.keys().collect();
        let mut checkers: Vec<_> = self.checkers.keys().collect();
        converters.sort();
        checkers.sort();
        f.debug_struct("PluginRegistry")
            .field("converters", &converters)
            .field("checkers", &checkers)
            .finish()
    }
}
