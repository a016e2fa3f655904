//! Schema Invariant Tests
//!
//! Tests for rule resolution and row validation:
//! - Invalid configuration fails when the schema is built, never per row
//! - Valid rows produce typed values in schema order
//! - Bad rows report every failing field, in column order
//! - Validation is deterministic
//! - Empty fields follow the default-substitution rules

use csvgate::schema::{
    evaluate_field, FieldErrorKind, FieldRule, FieldRuleSpec, PluginRegistry, RowSchema,
    RowValidator, SchemaError, Value,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn registry() -> PluginRegistry {
    PluginRegistry::with_builtins()
}

fn schema(params: serde_json::Value) -> RowSchema {
    RowSchema::from_json(&params, &registry()).unwrap()
}

fn rule(spec: FieldRuleSpec) -> FieldRule {
    FieldRule::from_spec(&spec, &registry()).unwrap()
}

fn row(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

fn car_schema() -> RowSchema {
    schema(json!([
        {"name": "year", "type": "integer", "min": 1996, "max": 1999},
        {"name": "make", "valid_values": ["Ford", "Chevy", "Jeep"]}
    ]))
}

// =============================================================================
// Construction Tests
// =============================================================================

/// An unknown type name is rejected with the configured name in the message.
#[test]
fn test_invalid_type_rejected_at_construction() {
    let err = RowSchema::from_json(&json!([{"name": "year", "type": "decimal"}]), &registry())
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidType { .. }));
    assert_eq!(err.to_string(), "\"type\" parameter \"decimal\" is invalid");
}

/// Output names must be unique.
#[test]
fn test_duplicate_names_rejected() {
    let err = RowSchema::from_json(&json!([{"name": "a"}, null, {"name": "a"}]), &registry())
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateName(name) if name == "a"));
}

/// Converter and checker names must be registered.
#[test]
fn test_unknown_plugins_rejected() {
    let err = RowSchema::from_json(&json!([{"name": "a", "converter": "nope"}]), &registry())
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownConverter { .. }));

    let err = RowSchema::from_json(&json!([{"name": "a", "error_checker": "nope"}]), &registry())
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownChecker { .. }));
}

/// Bounds that cannot be converted to the field's type are configuration errors.
#[test]
fn test_unconvertible_bound_rejected() {
    let err = RowSchema::from_json(
        &json!([{"name": "year", "type": "integer", "min": "early"}]),
        &registry(),
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidParam { param: "min", .. }));
}

/// Complex numbers have no order, so range bounds on them are refused.
#[test]
fn test_complex_bounds_rejected() {
    let err = RowSchema::from_json(
        &json!([{"name": "z", "type": "complex", "max": "1+1j"}]),
        &registry(),
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::UnorderedBounds { .. }));
}

/// Absent columns are excluded from the output names.
#[test]
fn test_field_names_skip_absent_columns() {
    let schema = schema(json!([{"name": "year"}, null, {"name": "model"}]));
    assert_eq!(schema.len(), 3);
    assert_eq!(&schema.field_names()[..], &["year".to_string(), "model".to_string()]);
    assert_eq!(schema.skipped_columns(), 1);
}

// =============================================================================
// Row Validation Tests
// =============================================================================

/// A fully valid row yields converted values in schema order.
#[test]
fn test_valid_row_values_in_order() {
    let schema = car_schema();
    let values = RowValidator::new(&schema)
        .validate(&row(&["1997", "Ford"]))
        .unwrap();
    assert_eq!(values, vec![Value::Integer(1997), Value::from("Ford")]);
}

/// Each failing field adds one message after the row context.
#[test]
fn test_bad_row_batch_shape() {
    let schema = car_schema();
    let batch = RowValidator::new(&schema)
        .validate(&row(&["1995", "Dodge"]))
        .unwrap_err();

    assert_eq!(batch.len(), 3);
    assert_eq!(batch.entries()[0], "['1995', 'Dodge']");
    assert_eq!(batch.entries()[1], "Value \"1995\" is less than the specified min value");
    assert_eq!(batch.entries()[2], "Dodge is not a valid value of the make field");
}

/// Same row, same result, every time.
#[test]
fn test_validation_is_deterministic() {
    let schema = car_schema();
    let validator = RowValidator::new(&schema);
    let bad = row(&["2001", "Ford"]);
    let first = validator.validate(&bad);

    for _ in 0..100 {
        assert_eq!(validator.validate(&bad), first);
    }
}

/// An absent column's content is never inspected.
#[test]
fn test_absent_column_never_inspected() {
    let schema = schema(json!([
        {"name": "year", "type": "integer"},
        null,
        {"name": "price", "type": "float"}
    ]));
    let values = RowValidator::new(&schema)
        .validate(&row(&["1998", "not, a \"number\"", "4900.5"]))
        .unwrap();
    assert_eq!(values, vec![Value::Integer(1998), Value::Float(4900.5)]);
}

// =============================================================================
// Field Evaluation Tests
// =============================================================================

/// A default replaces an empty field and skips every later check.
#[test]
fn test_default_bypasses_checks() {
    let year = rule(
        FieldRuleSpec::named("year")
            .with_type("integer")
            .with_range(json!(1996), json!(1999))
            .with_default(json!(0)),
    );
    assert_eq!(evaluate_field("", &year), Ok(Value::Integer(0)));
}

/// Empty non-string fields without a default fail.
#[test]
fn test_empty_without_default_fails() {
    let year = rule(FieldRuleSpec::named("year").with_type("integer"));
    let err = evaluate_field("", &year).unwrap_err();
    assert_eq!(err.kind(), FieldErrorKind::EmptyValue);
}

/// Empty string fields are valid even with length bounds.
#[test]
fn test_empty_string_field_is_valid() {
    let model = rule(FieldRuleSpec::named("model").with_len(Some(3), None));
    assert_eq!(evaluate_field("", &model), Ok(Value::from("")));
}

/// Membership is tested on the converted value.
#[test]
fn test_valid_values_membership() {
    let make = rule(
        FieldRuleSpec::named("make").with_valid_values(vec![json!("Ford"), json!("Jeep")]),
    );
    assert_eq!(evaluate_field("Jeep", &make), Ok(Value::from("Jeep")));
    let err = evaluate_field("Dodge", &make).unwrap_err();
    assert_eq!(err.message(), "Dodge is not a valid value of the make field");

    let doors = rule(
        FieldRuleSpec::named("doors")
            .with_type("integer")
            .with_valid_values(vec![json!(2), json!(4)]),
    );
    assert_eq!(evaluate_field("4", &doors), Ok(Value::Integer(4)));
    assert!(evaluate_field("3", &doors).is_err());
}

/// Length is measured on the converted value.
#[test]
fn test_length_checks() {
    let desc = rule(FieldRuleSpec::named("description").with_len(None, Some(15)));
    let err = evaluate_field("MUST SELL! air, moon roof, loaded", &desc).unwrap_err();
    assert_eq!(
        err.message(),
        "The length of value \"MUST SELL! air, moon roof, loaded\" is greater than max_len"
    );

    let count = rule(FieldRuleSpec::named("doors").with_type("integer").with_len(Some(1), None));
    assert_eq!(evaluate_field("4", &count).unwrap_err().kind(), FieldErrorKind::Length);
}

/// Integers honor the configured radix.
#[test]
fn test_integer_base() {
    let code = rule(FieldRuleSpec::named("code").with_type("integer").with_base(16));
    assert_eq!(evaluate_field("ff", &code), Ok(Value::Integer(255)));
    assert_eq!(evaluate_field("0xff", &code), Ok(Value::Integer(255)));
    assert_eq!(evaluate_field("fg", &code).unwrap_err().kind(), FieldErrorKind::Conversion);
}

/// Custom converters replace built-in parsing.
#[test]
fn test_custom_converter() {
    let price = rule(
        FieldRuleSpec::named("price")
            .with_type("float")
            .with_converter("round"),
    );
    assert_eq!(evaluate_field("4799.50", &price), Ok(Value::Integer(4800)));
}

/// Custom checkers run last and only report non-empty messages.
#[test]
fn test_custom_checker() {
    let mut registry = PluginRegistry::with_builtins();
    registry.register_checker("short", |raw: &str, _rule: &FieldRule| {
        (raw.chars().count() > 15).then(|| "Description is too long".to_string())
    });
    registry.register_checker("silent", |_raw: &str, _rule: &FieldRule| Some(String::new()));

    let desc_spec = FieldRuleSpec::named("description").with_checker("short");
    let desc = FieldRule::from_spec(&desc_spec, &registry).unwrap();
    assert_eq!(
        evaluate_field("MUST SELL! air, moon roof, loaded", &desc).unwrap_err().message(),
        "Description is too long"
    );
    assert!(evaluate_field("ac, abs, moon", &desc).is_ok());

    let silent_spec = FieldRuleSpec::named("note").with_checker("silent");
    let silent = FieldRule::from_spec(&silent_spec, &registry).unwrap();
    assert!(evaluate_field("anything", &silent).is_ok());
}

/// Pattern checkers come straight from configuration.
#[test]
fn test_pattern_checker() {
    let schema = schema(json!([
        {"name": "vin", "error_checker": {"pattern": "^[A-HJ-NPR-Z0-9]{17}$", "message": "bad VIN"}}
    ]));
    let validator = RowValidator::new(&schema);

    assert!(validator.validate(&row(&["1FTRX18W1XKA12345"])).is_ok());
    let batch = validator.validate(&row(&["IOQ"])).unwrap_err();
    assert_eq!(batch.entries()[1], "bad VIN");
}
