//! Field evaluation: convert one raw field and run its checks
//!
//! Check order, first failure wins:
//! 1. Empty-field substitution (ends evaluation when it produces a value)
//! 2. Type conversion, built-in or custom
//! 3. Set membership
//! 4. Range
//! 5. Length
//! 6. Custom checker
//!
//! Membership, range and length all look at the converted value.

use std::cmp::Ordering;
use std::num::IntErrorKind;

use super::errors::{FieldError, FieldErrorKind};
use super::rule::{Conversion, FieldRule};
use super::types::{Complex, FieldKind, Value};

/// Converts and validates one raw field against its rule.
pub fn evaluate_field(raw: &str, rule: &FieldRule) -> Result<Value, FieldError> {
    if raw.is_empty() {
        return substitute_empty(rule);
    }

    let value = convert(raw, rule)?;
    check_membership(raw, &value, rule)?;
    check_range(raw, &value, rule)?;
    check_length(raw, &value, rule)?;

    if let Some(checker) = rule.checker() {
        match checker.check(raw, rule) {
            Some(message) if !message.is_empty() => return Err(FieldError::custom(message)),
            _ => {}
        }
    }

    Ok(value)
}

/// Empty strings are valid strings; other kinds need a default.
fn substitute_empty(rule: &FieldRule) -> Result<Value, FieldError> {
    match (rule.kind(), rule.default_value()) {
        (FieldKind::String, Some(default)) if !default.is_empty() => Ok(default.clone()),
        (FieldKind::String, _) => Ok(Value::String(String::new())),
        (_, Some(default)) => Ok(default.clone()),
        (_, None) => Err(FieldError::empty_value()),
    }
}

fn convert(raw: &str, rule: &FieldRule) -> Result<Value, FieldError> {
    match rule.conversion() {
        Conversion::Identity => Ok(Value::String(raw.to_string())),
        Conversion::Builtin(kind) => convert_builtin(*kind, raw, rule.base()),
        Conversion::Custom { converter, .. } => converter
            .convert(raw, rule.base())
            .map_err(|message| FieldError::new(FieldErrorKind::Conversion, message)),
    }
}

/// Built-in conversion for `kind`.
pub(crate) fn convert_builtin(kind: FieldKind, raw: &str, base: u32) -> Result<Value, FieldError> {
    match kind {
        FieldKind::String => Ok(Value::String(raw.to_string())),
        FieldKind::Integer => parse_integer(raw, base)
            .map(Value::Integer)
            .map_err(|e| e.field_error(raw)),
        FieldKind::Float => parse_float(raw)
            .map(Value::Float)
            .ok_or_else(|| FieldError::not_float(raw)),
        FieldKind::Complex => Complex::parse(raw)
            .map(Value::Complex)
            .ok_or_else(|| FieldError::not_complex(raw)),
    }
}

fn check_membership(raw: &str, value: &Value, rule: &FieldRule) -> Result<(), FieldError> {
    match rule.valid_values() {
        Some(valid) if !valid.contains(value) => Err(FieldError::not_member(raw, rule.name())),
        _ => Ok(()),
    }
}

fn check_range(raw: &str, value: &Value, rule: &FieldRule) -> Result<(), FieldError> {
    if let Some(min) = rule.min() {
        match value.partial_cmp(min) {
            Some(Ordering::Less) => return Err(FieldError::below_min(raw)),
            None => return Err(FieldError::not_comparable(raw)),
            _ => {}
        }
    }
    if let Some(max) = rule.max() {
        match value.partial_cmp(max) {
            Some(Ordering::Greater) => return Err(FieldError::above_max(raw)),
            None => return Err(FieldError::not_comparable(raw)),
            _ => {}
        }
    }
    Ok(())
}

fn check_length(raw: &str, value: &Value, rule: &FieldRule) -> Result<(), FieldError> {
    if rule.min_len().is_none() && rule.max_len().is_none() {
        return Ok(());
    }
    let len = value.len().ok_or_else(|| FieldError::no_length(raw))?;

    if rule.min_len().is_some_and(|min_len| len < min_len) {
        return Err(FieldError::shorter_than_min(raw));
    }
    if rule.max_len().is_some_and(|max_len| len > max_len) {
        return Err(FieldError::longer_than_max(raw));
    }
    Ok(())
}

/// Why a field did not parse as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntegerError {
    /// Not integer syntax for the base
    Invalid,
    /// Well-formed, but outside `i64`
    OutOfRange,
}

impl IntegerError {
    pub(crate) fn field_error(self, raw: &str) -> FieldError {
        match self {
            IntegerError::Invalid => FieldError::not_integer(raw),
            IntegerError::OutOfRange => FieldError::integer_out_of_range(raw),
        }
    }
}

/// Parses an integer the way configuration authors expect from `int(text, base)`.
///
/// Accepts surrounding whitespace, a sign, single underscores between digits,
/// and a `0x`/`0o`/`0b` prefix matching the base. Base 0 infers the radix from
/// the prefix. Values are limited to 64 bits.
pub(crate) fn parse_integer(raw: &str, base: u32) -> Result<i64, IntegerError> {
    let s = raw.trim();
    let (negative, unsigned) = match s.as_bytes().first().ok_or(IntegerError::Invalid)? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = split_radix_prefix(unsigned, base).ok_or(IntegerError::Invalid)?;
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || digits.starts_with(['+', '-'])
    {
        return Err(IntegerError::Invalid);
    }

    let mut cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if negative {
        cleaned.insert(0, '-');
    }
    i64::from_str_radix(&cleaned, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => IntegerError::OutOfRange,
        _ => IntegerError::Invalid,
    })
}

fn split_radix_prefix(s: &str, base: u32) -> Option<(u32, &str)> {
    if base == 0 {
        for radix in [16, 8, 2] {
            if let Some(rest) = strip_radix_prefix(s, radix) {
                return Some((radix, rest));
            }
        }
        // Without a prefix, leading zeros are ambiguous.
        if s.len() > 1 && s.starts_with('0') && s.chars().any(|c| c != '0' && c != '_') {
            return None;
        }
        return Some((10, s));
    }

    Some((base, strip_radix_prefix(s, base).unwrap_or(s)))
}

fn strip_radix_prefix(s: &str, radix: u32) -> Option<&str> {
    let prefix = s.get(..2)?;
    let matches = match radix {
        16 => prefix.eq_ignore_ascii_case("0x"),
        8 => prefix.eq_ignore_ascii_case("0o"),
        2 => prefix.eq_ignore_ascii_case("0b"),
        _ => false,
    };
    if matches {
        s.get(2..)
    } else {
        None
    }
}

/// Parses a float, ignoring surrounding whitespace.
///
/// Single underscores between digits are accepted, as for integers.
pub(crate) fn parse_float(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if !s.contains('_') {
        return s.parse::<f64>().ok();
    }

    let bytes = s.as_bytes();
    let grouped = bytes.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
    });
    if !grouped {
        return None;
    }
    s.replace('_', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::plugins::PluginRegistry;
    use crate::schema::types::FieldRuleSpec;
    use serde_json::json;

    fn rule(spec: serde_json::Value) -> FieldRule {
        let spec: FieldRuleSpec = serde_json::from_value(spec).unwrap();
        FieldRule::from_spec(&spec, &PluginRegistry::with_builtins()).unwrap()
    }

    fn message(result: Result<Value, FieldError>) -> String {
        result.unwrap_err().into_message()
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42", 10), Ok(42));
        assert_eq!(parse_integer(" -17 ", 10), Ok(-17));
        assert_eq!(parse_integer("1_000", 10), Ok(1000));
        assert_eq!(parse_integer("ff", 16), Ok(255));
        assert_eq!(parse_integer("0xff", 16), Ok(255));
        assert_eq!(parse_integer("0b101", 0), Ok(5));
        assert_eq!(parse_integer("-9223372036854775808", 10), Ok(i64::MIN));
        assert_eq!(parse_integer("012", 0), Err(IntegerError::Invalid));
        assert_eq!(parse_integer("1__0", 10), Err(IntegerError::Invalid));
        assert_eq!(parse_integer("+-1", 10), Err(IntegerError::Invalid));
        assert_eq!(parse_integer("19.5", 10), Err(IntegerError::Invalid));
        assert_eq!(parse_integer("", 10), Err(IntegerError::Invalid));
        assert_eq!(
            parse_integer("99999999999999999999", 10),
            Err(IntegerError::OutOfRange)
        );
        assert_eq!(
            parse_integer("-0x8000000000000001", 16),
            Err(IntegerError::OutOfRange)
        );
    }

    #[test]
    fn test_oversized_integer_is_not_a_syntax_error() {
        let odometer = rule(json!({"name": "odometer", "type": "integer"}));
        let err = evaluate_field("99999999999999999999", &odometer).unwrap_err();
        assert_eq!(err.kind(), FieldErrorKind::Conversion);
        assert_eq!(
            err.message(),
            "Value \"99999999999999999999\" is outside the 64-bit integer range"
        );
        assert_eq!(
            message(evaluate_field("12a", &odometer)),
            "Value \"12a\" is not an integer"
        );
    }

    #[test]
    fn test_grouped_float_field() {
        let price = rule(json!({"name": "price", "type": "float"}));
        assert_eq!(evaluate_field("1_000.5", &price), Ok(Value::Float(1000.5)));
        assert_eq!(
            message(evaluate_field("1__000.5", &price)),
            "Value \"1__000.5\" is not a float"
        );
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(" 2.5 "), Some(2.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert!(parse_float("inf").is_some_and(|x| x.is_infinite()));
        assert_eq!(parse_float("two"), None);
        assert_eq!(parse_float("1_000.5"), Some(1000.5));
        assert_eq!(parse_float("1_000_000e-3"), Some(1000.0));
        assert_eq!(parse_float("1__000.5"), None);
        assert_eq!(parse_float("_1.5"), None);
        assert_eq!(parse_float("1_.5"), None);
        assert_eq!(parse_float("1._5"), None);
    }

    #[test]
    fn test_string_passthrough() {
        let make = rule(json!({"name": "make"}));
        assert_eq!(evaluate_field("Ford", &make), Ok(Value::from("Ford")));
    }

    #[test]
    fn test_empty_string_field() {
        let plain = rule(json!({"name": "model"}));
        assert_eq!(evaluate_field("", &plain), Ok(Value::from("")));

        let defaulted = rule(json!({"name": "model", "default": "Unknown"}));
        assert_eq!(evaluate_field("", &defaulted), Ok(Value::from("Unknown")));
    }

    #[test]
    fn test_empty_non_string_field() {
        let year = rule(json!({"name": "year", "type": "integer"}));
        let err = evaluate_field("", &year).unwrap_err();
        assert_eq!(err.kind(), FieldErrorKind::EmptyValue);
        assert_eq!(err.message(), "Empty string cannot be converted to non-string types");
    }

    #[test]
    fn test_default_bypasses_later_checks() {
        let year = rule(json!({
            "name": "year", "type": "integer", "min": 1996, "max": 1999, "default": 1900
        }));
        assert_eq!(evaluate_field("", &year), Ok(Value::Integer(1900)));
    }

    #[test]
    fn test_conversion_failures() {
        let int = rule(json!({"name": "n", "type": "integer"}));
        let float = rule(json!({"name": "x", "type": "float"}));
        let complex = rule(json!({"name": "z", "type": "complex"}));

        assert_eq!(message(evaluate_field("abc", &int)), "Value \"abc\" is not an integer");
        assert_eq!(message(evaluate_field("abc", &float)), "Value \"abc\" is not a float");
        assert_eq!(
            message(evaluate_field("abc", &complex)),
            "Value \"abc\" is not a complex number"
        );
        assert_eq!(
            evaluate_field("1-2j", &complex),
            Ok(Value::Complex(Complex::new(1.0, -2.0)))
        );
    }

    #[test]
    fn test_membership_uses_converted_value() {
        let year = rule(json!({"name": "year", "type": "integer", "valid_values": [1996, 1997]}));
        assert_eq!(evaluate_field(" 1997", &year), Ok(Value::Integer(1997)));
        assert_eq!(
            message(evaluate_field("2001", &year)),
            "2001 is not a valid value of the year field"
        );
    }

    #[test]
    fn test_range() {
        let year = rule(json!({"name": "year", "type": "integer", "min": 1996, "max": 1999}));
        assert_eq!(
            message(evaluate_field("1995", &year)),
            "Value \"1995\" is less than the specified min value"
        );
        assert_eq!(
            message(evaluate_field("2001", &year)),
            "Value \"2001\" is greater than the specified max value"
        );
        assert_eq!(evaluate_field("1999", &year), Ok(Value::Integer(1999)));
    }

    #[test]
    fn test_range_rejects_nan() {
        let x = rule(json!({"name": "x", "type": "float", "min": 0}));
        let err = evaluate_field("nan", &x).unwrap_err();
        assert_eq!(err.kind(), FieldErrorKind::Range);
    }

    #[test]
    fn test_string_range_is_lexical() {
        let model = rule(json!({"name": "model", "min": "AAA", "max": "zzz"}));
        assert!(evaluate_field("Mustang", &model).is_ok());
        assert_eq!(
            message(evaluate_field("9000", &model)),
            "Value \"9000\" is less than the specified min value"
        );
    }

    #[test]
    fn test_length() {
        let model = rule(json!({"name": "model", "min_len": 2, "max_len": 5}));
        assert_eq!(
            message(evaluate_field("A", &model)),
            "The length of value \"A\" is less than min_len"
        );
        assert_eq!(
            message(evaluate_field("Mustang", &model)),
            "The length of value \"Mustang\" is greater than max_len"
        );
        assert!(evaluate_field("Jeep", &model).is_ok());
    }

    #[test]
    fn test_length_on_number_fails() {
        let n = rule(json!({"name": "n", "type": "integer", "max_len": 3}));
        let err = evaluate_field("12", &n).unwrap_err();
        assert_eq!(err.kind(), FieldErrorKind::Length);
    }

    #[test]
    fn test_first_failure_wins() {
        let year = rule(json!({
            "name": "year", "type": "integer", "valid_values": [1997], "max": 1999
        }));
        let err = evaluate_field("2001", &year).unwrap_err();
        assert_eq!(err.kind(), FieldErrorKind::Membership);
    }

    #[test]
    fn test_custom_checker_runs_last() {
        let desc = rule(json!({
            "name": "description", "max_len": 40, "error_checker": {"pattern": "^.{0,15}$", "message": "Description is too long"}
        }));
        assert!(evaluate_field("Nice car", &desc).is_ok());

        let err = evaluate_field("A car with a very long description", &desc).unwrap_err();
        assert_eq!(err.kind(), FieldErrorKind::CustomCheck);
        assert_eq!(err.message(), "Description is too long");
    }

    #[test]
    fn test_custom_converter_replaces_builtin() {
        let price = rule(json!({"name": "price", "type": "float", "converter": "round", "max": 30000}));
        assert_eq!(evaluate_field("19999.5", &price), Ok(Value::Integer(20000)));
        assert_eq!(
            message(evaluate_field("lots", &price)),
            "Value \"lots\" is not a float"
        );
        assert_eq!(
            message(evaluate_field("45000", &price)),
            "Value \"45000\" is greater than the specified max value"
        );
    }
}
