//! Response expectation models
//!
//! An expectation is written either as bare key names or as
//! `[key, type]` / `[key, type, value]` entries:
//!
//! ```yaml
//! expected_keys: [id, title]
//! expected_keys: [[id, integer, 1], [title, string]]
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// JSON value type named in a typed expectation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "string" | "str" => Some(ValueType::String),
            "integer" | "int" => Some(ValueType::Integer),
            "number" | "float" => Some(ValueType::Number),
            "boolean" | "bool" => Some(ValueType::Boolean),
            "array" | "list" => Some(ValueType::Array),
            "object" | "dict" => Some(ValueType::Object),
            "null" | "none" => Some(ValueType::Null),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Null => "null",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Integer => value.is_i64() || value.is_u64(),
            ValueType::Number => value.is_number(),
            ValueType::Boolean => value.is_boolean(),
            ValueType::Array => value.is_array(),
            ValueType::Object => value.is_object(),
            ValueType::Null => value.is_null(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single entry of an expectation
#[derive(Clone, Debug, PartialEq)]
pub enum ExpectedKey {
    /// Key must be present
    Key(String),
    /// Key must be present with a value of `ty`, equal to `value` if given
    Typed {
        key: String,
        ty: ValueType,
        value: Option<Value>,
    },
    /// Wrong arity or unknown type name; never satisfied
    Malformed(Value),
}

impl ExpectedKey {
    pub fn typed(key: impl Into<String>, ty: ValueType) -> Self {
        ExpectedKey::Typed {
            key: key.into(),
            ty,
            value: None,
        }
    }

    pub fn valued(key: impl Into<String>, ty: ValueType, value: Value) -> Self {
        ExpectedKey::Typed {
            key: key.into(),
            ty,
            value: Some(value),
        }
    }

    fn from_value(raw: Value) -> Self {
        if let Value::String(key) = &raw {
            return ExpectedKey::Key(key.clone());
        }

        let typed = raw
            .as_array()
            .filter(|items| items.len() == 2 || items.len() == 3)
            .and_then(|items| {
                let key = items[0].as_str()?;
                let ty = items[1].as_str().and_then(ValueType::from_str)?;
                Some(ExpectedKey::Typed {
                    key: key.to_string(),
                    ty,
                    value: items.get(2).cloned(),
                })
            });

        typed.unwrap_or(ExpectedKey::Malformed(raw))
    }

    fn to_value(&self) -> Value {
        match self {
            ExpectedKey::Key(key) => Value::String(key.clone()),
            ExpectedKey::Typed { key, ty, value } => {
                let mut items = vec![Value::String(key.clone()), Value::String(ty.name().into())];
                if let Some(v) = value {
                    items.push(v.clone());
                }
                Value::Array(items)
            }
            ExpectedKey::Malformed(raw) => raw.clone(),
        }
    }
}

/// Expected response shape; empty means "accept anything"
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expectation(Vec<ExpectedKey>);

impl Expectation {
    pub fn new(entries: Vec<ExpectedKey>) -> Self {
        Self(entries)
    }

    /// Bare key names
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(|k| ExpectedKey::Key(k.into())).collect())
    }

    pub fn entries(&self) -> &[ExpectedKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Key-only mode is decided by the first entry
    pub fn is_key_only(&self) -> bool {
        matches!(self.0.first(), Some(ExpectedKey::Key(_)))
    }
}

impl From<Vec<Value>> for Expectation {
    fn from(raw: Vec<Value>) -> Self {
        Self(raw.into_iter().map(ExpectedKey::from_value).collect())
    }
}

impl Serialize for Expectation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw: Vec<Value> = self.0.iter().map(ExpectedKey::to_value).collect();
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expectation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
        Ok(raw.map(Expectation::from).unwrap_or_default())
    }
}
