//! Resolved field rules and the row schema
//!
//! A `FieldRuleSpec` from configuration is resolved once into a `FieldRule`:
//! the type name becomes a `Conversion`, converter and checker names become
//! trait objects, and bounds, defaults and valid values are converted to
//! typed `Value`s. Nothing is looked up per row.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::evaluator::convert_builtin;
use super::plugins::{FieldChecker, FieldConverter, PluginRegistry};
use super::types::{FieldKind, FieldRuleSpec, Value};

const DEFAULT_BASE: u32 = 10;

/// How raw text becomes a typed value.
#[derive(Clone)]
pub enum Conversion {
    /// String fields: the raw text is the value
    Identity,
    /// Built-in parsing for a non-string kind
    Builtin(FieldKind),
    /// A registered converter replaces built-in parsing
    Custom {
        name: String,
        converter: Arc<dyn FieldConverter>,
    },
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversion::Identity => write!(f, "Identity"),
            Conversion::Builtin(kind) => write!(f, "Builtin({:?})", kind),
            Conversion::Custom { name, .. } => write!(f, "Custom({})", name),
        }
    }
}

/// A resolved checker together with the name it was configured under.
#[derive(Clone)]
struct NamedChecker {
    name: String,
    checker: Arc<dyn FieldChecker>,
}

impl fmt::Debug for NamedChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// How one column is converted and validated. Immutable once built.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    desc: Option<String>,
    kind: FieldKind,
    base: u32,
    conversion: Conversion,
    valid_values: Option<Vec<Value>>,
    min: Option<Value>,
    max: Option<Value>,
    min_len: Option<usize>,
    max_len: Option<usize>,
    default: Option<Value>,
    checker: Option<NamedChecker>,
}

impl FieldRule {
    /// Resolves a configured rule against the plugin registry.
    pub fn from_spec(spec: &FieldRuleSpec, registry: &PluginRegistry) -> SchemaResult<Self> {
        let name = spec.name.clone();

        let kind = match spec.field_type.as_deref() {
            None => FieldKind::String,
            Some(type_name) => {
                FieldKind::from_name(type_name).ok_or_else(|| SchemaError::InvalidType {
                    field: name.clone(),
                    type_name: type_name.to_string(),
                })?
            }
        };

        let base = spec.base.unwrap_or(DEFAULT_BASE);
        if base != 0 && !(2..=36).contains(&base) {
            return Err(SchemaError::InvalidBase { field: name, base });
        }

        let conversion = match (&spec.converter, kind) {
            (Some(converter_name), _) => Conversion::Custom {
                name: converter_name.clone(),
                converter: registry.resolve_converter(&name, converter_name)?,
            },
            (None, FieldKind::String) => Conversion::Identity,
            (None, kind) => Conversion::Builtin(kind),
        };

        let mut rule = Self {
            name,
            desc: spec.desc.clone(),
            kind,
            base,
            conversion,
            valid_values: None,
            min: None,
            max: None,
            min_len: spec.min_len,
            max_len: spec.max_len,
            default: None,
            checker: None,
        };

        if let Some(values) = &spec.valid_values {
            let typed = values
                .iter()
                .map(|v| rule.typed_param("valid_values", v))
                .collect::<SchemaResult<Vec<_>>>()?;
            rule.valid_values = Some(typed);
        }

        if (spec.min.is_some() || spec.max.is_some())
            && !kind.is_ordered()
            && !rule.has_custom_converter()
        {
            return Err(SchemaError::UnorderedBounds {
                field: rule.name,
                type_name: kind.type_name(),
            });
        }
        rule.min = spec.min.as_ref().map(|v| rule.typed_param("min", v)).transpose()?;
        rule.max = spec.max.as_ref().map(|v| rule.typed_param("max", v)).transpose()?;

        if let (Some(min_len), Some(max_len)) = (rule.min_len, rule.max_len) {
            if min_len > max_len {
                return Err(SchemaError::InvertedLengthBounds {
                    field: rule.name,
                    min_len,
                    max_len,
                });
            }
        }

        rule.default = spec
            .default
            .as_ref()
            .map(|v| rule.typed_param("default", v))
            .transpose()?;

        if let Some(checker_spec) = &spec.error_checker {
            let (checker_name, checker) = registry.resolve_checker(&rule.name, checker_spec)?;
            rule.checker = Some(NamedChecker {
                name: checker_name,
                checker,
            });
        }

        Ok(rule)
    }

    /// Converts a configured parameter to the type this rule produces.
    ///
    /// Strings go through the built-in conversion for the rule's kind. Numbers
    /// are taken as numbers, except on plain string fields where they could
    /// never compare equal to a field value.
    fn typed_param(&self, param: &'static str, value: &serde_json::Value) -> SchemaResult<Value> {
        let invalid = || SchemaError::InvalidParam {
            field: self.name.clone(),
            param,
            value: value.to_string(),
            type_name: self.kind.type_name(),
        };

        match value {
            serde_json::Value::String(s) => {
                convert_builtin(self.kind, s, self.base).map_err(|_| invalid())
            }
            serde_json::Value::Number(n)
                if self.kind != FieldKind::String || self.has_custom_converter() =>
            {
                match n.as_i64() {
                    Some(i) if self.kind != FieldKind::Float => Ok(Value::Integer(i)),
                    _ => n.as_f64().map(Value::Float).ok_or_else(invalid),
                }
            }
            _ => Err(invalid()),
        }
    }

    fn has_custom_converter(&self) -> bool {
        matches!(self.conversion, Conversion::Custom { .. })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn valid_values(&self) -> Option<&[Value]> {
        self.valid_values.as_deref()
    }

    pub fn min(&self) -> Option<&Value> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    pub fn min_len(&self) -> Option<usize> {
        self.min_len
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn checker(&self) -> Option<&dyn FieldChecker> {
        self.checker.as_ref().map(|c| c.checker.as_ref())
    }

    pub fn checker_name(&self) -> Option<&str> {
        self.checker.as_ref().map(|c| c.name.as_str())
    }
}

/// One entry per input column; `None` columns are passed over unvalidated
/// and produce no output field.
#[derive(Debug, Clone)]
pub struct RowSchema {
    columns: Vec<Option<FieldRule>>,
    field_names: Arc<[String]>,
}

impl RowSchema {
    /// Builds a schema, checking that output field names are non-empty and unique.
    pub fn new(columns: Vec<Option<FieldRule>>) -> SchemaResult<Self> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        for (column, rule) in columns.iter().enumerate() {
            let Some(rule) = rule else { continue };
            if rule.name().is_empty() {
                return Err(SchemaError::EmptyName { column });
            }
            if !seen.insert(rule.name()) {
                return Err(SchemaError::DuplicateName(rule.name().to_string()));
            }
            names.push(rule.name().to_string());
        }

        Ok(Self {
            columns,
            field_names: names.into(),
        })
    }

    /// Resolves configured rules, in column order.
    pub fn from_specs(
        specs: &[Option<FieldRuleSpec>],
        registry: &PluginRegistry,
    ) -> SchemaResult<Self> {
        let columns = specs
            .iter()
            .map(|spec| {
                spec.as_ref()
                    .map(|s| FieldRule::from_spec(s, registry))
                    .transpose()
            })
            .collect::<SchemaResult<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Resolves a JSON array of rule objects and `null`s.
    pub fn from_json(value: &serde_json::Value, registry: &PluginRegistry) -> SchemaResult<Self> {
        let specs: Vec<Option<FieldRuleSpec>> = serde_json::from_value(value.clone())?;
        Self::from_specs(&specs, registry)
    }

    /// Number of input columns, including skipped ones.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Option<FieldRule>] {
        &self.columns
    }

    /// Output field names in column order.
    pub fn field_names(&self) -> &Arc<[String]> {
        &self.field_names
    }

    /// Number of columns that produce no output.
    pub fn skipped_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.is_none()).count()
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.columns.iter().flatten().find(|r| r.name() == name)
    }
}
