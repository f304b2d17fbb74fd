//! Response validation
//!
//! Checks a parsed response body against an [`Expectation`]. Pure functions,
//! no I/O.

use serde_json::{Map, Value};

use crate::models::{ExpectedKey, Expectation};

/// Returns true when `body` satisfies `expectation`
pub fn validate(body: &Value, expectation: &Expectation) -> bool {
    check(body, expectation).is_ok()
}

/// Like [`validate`], but reports the first violated rule
pub fn check(body: &Value, expectation: &Expectation) -> Result<(), String> {
    if expectation.is_empty() {
        return Ok(());
    }

    let key_only = expectation.is_key_only();

    match body {
        Value::Object(map) if map.is_empty() => Err("response body is empty".to_string()),
        Value::Array(items) if items.is_empty() => Err("response body is empty".to_string()),
        Value::Object(map) => check_object(map, expectation, key_only),
        Value::Array(items) => items.iter().enumerate().try_for_each(|(i, item)| {
            let map = item
                .as_object()
                .ok_or_else(|| format!("element {i} is not an object"))?;
            check_object(map, expectation, key_only).map_err(|e| format!("element {i}: {e}"))
        }),
        other => Err(format!(
            "expected an object or array body, got {}",
            json_type(other)
        )),
    }
}

fn check_object(
    map: &Map<String, Value>,
    expectation: &Expectation,
    key_only: bool,
) -> Result<(), String> {
    for entry in expectation.entries() {
        match (key_only, entry) {
            (true, ExpectedKey::Key(key)) => {
                if !map.contains_key(key) {
                    return Err(format!("missing expected key '{key}'"));
                }
            }
            (false, ExpectedKey::Typed { key, ty, value }) => {
                let actual = map
                    .get(key)
                    .ok_or_else(|| format!("missing expected key '{key}'"))?;
                if !ty.matches(actual) {
                    return Err(format!(
                        "key '{key}' expected {ty}, got {}",
                        json_type(actual)
                    ));
                }
                if let Some(expected) = value {
                    if expected != actual {
                        return Err(format!("key '{key}' expected {expected}, got {actual}"));
                    }
                }
            }
            (_, entry) => return Err(format!("malformed expectation entry: {entry:?}")),
        }
    }
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
