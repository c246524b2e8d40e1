//! Built-in type coercion
//!
//! Converts a value's runtime JSON type to a field's declared type. Coercion
//! only acts when [`should_coerce`] holds; otherwise the value is returned
//! untouched, which makes it an identity for values that already match.
//!
//! Copyright (c) 2025 JST Team
//! Licensed under the Apache-2.0 license

use crate::options::TranslationOptions;
use crate::schema::FieldType;
use crate::{Error, Result};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::OnceLock;

/// Property used when wrapping a value into an object and none is configured
pub const DEFAULT_VALUE_PROPERTY: &str = "$value";

// Largest integer an f64 holds exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();

fn float_prefix() -> &'static Regex {
    FLOAT_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("float prefix pattern is valid")
    })
}

/// Runtime type name of an optional JSON value
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// Whether coercion would change `value` for a field of type `target`
///
/// Untyped fields, absent values, and `null` are never coerced.
pub fn should_coerce(value: Option<&Value>, target: Option<FieldType>) -> bool {
    let Some(target) = target else {
        return false;
    };
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(_)) => target != FieldType::Array,
        Some(other) => type_name(Some(other)) != target.as_str(),
    }
}

/// Coerce `value` to `target`, or return it unchanged when no coercion applies
pub fn coerce(
    field: &str,
    value: Option<Value>,
    target: Option<FieldType>,
    options: &TranslationOptions,
) -> Result<Option<Value>> {
    let Some(target_type) = target else {
        return Ok(value);
    };
    if !should_coerce(value.as_ref(), target) {
        return Ok(value);
    }
    let Some(value) = value else {
        return Ok(None);
    };

    let coerced = match target_type {
        FieldType::String => Some(Value::String(to_string(&value, options.join_separator.as_deref()))),
        FieldType::Number => to_number(field, &value)?,
        FieldType::Boolean => Some(Value::Bool(to_boolean(&value))),
        FieldType::Object => {
            let property = options
                .value_property
                .clone()
                .unwrap_or_else(|| DEFAULT_VALUE_PROPERTY.to_string());
            let mut wrapped = Map::new();
            wrapped.insert(property, value);
            Some(Value::Object(wrapped))
        }
        FieldType::Array => Some(Value::Array(vec![value])),
    };

    Ok(coerced)
}

fn to_string(value: &Value, join_separator: Option<&str>) -> String {
    match (value, join_separator) {
        (Value::Array(items), Some(separator)) => items
            .iter()
            .map(element_string)
            .collect::<Vec<_>>()
            .join(separator),
        (Value::Array(_), None) | (Value::Object(_), _) => value.to_string(),
        (other, _) => element_string(other),
    }
}

/// Natural string form of a value inside a joined list
fn element_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(element_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Integral floats print without a fractional part
pub fn number_string(number: &Number) -> String {
    match number.as_f64() {
        Some(f) if !number.is_i64() && !number.is_u64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            format!("{}", f as i64)
        }
        _ => number.to_string(),
    }
}

fn to_number(field: &str, value: &Value) -> Result<Option<Value>> {
    match value {
        Value::Bool(b) => Ok(Some(Value::from(if *b { 1 } else { 0 }))),
        Value::String(s) => Ok(parse_float(s).and_then(number_value)),
        Value::Number(_) => Ok(Some(value.clone())),
        other => Err(Error::Coercion {
            field: field.to_string(),
            from: type_name(Some(other)).to_string(),
            to: FieldType::Number.to_string(),
        }),
    }
}

fn to_boolean(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse the longest leading decimal literal, ignoring trailing text
pub fn parse_float(input: &str) -> Option<f64> {
    let trimmed = input.trim_start();
    let literal = float_prefix().find(trimmed)?.as_str();
    match literal.trim_start_matches(['+', '-']) {
        "Infinity" => Some(if literal.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }),
        _ => literal.parse::<f64>().ok(),
    }
}

/// JSON number for `f`; integral values become integers, non-finite ones nothing
pub fn number_value(f: f64) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}
