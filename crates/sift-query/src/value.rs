//! Bound parameter values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value bound to a `?` placeholder in generated SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by flag-style filters (`deleted=1`, `deleted=true`).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Real(r) => *r != 0.0,
            Value::Text(s) => !matches!(s.as_str(), "" | "0" | "false"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<&serde_json::Value> for Value {
    /// Scalars map one to one. Arrays and objects are bound as their JSON text.
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    n.as_f64().map_or_else(|| Value::Text(n.to_string()), Value::Real)
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from(&json!(5)), Value::Integer(5));
        assert_eq!(Value::from(&json!(1.5)), Value::Real(1.5));
        assert_eq!(Value::from(&json!("a")), Value::Text("a".into()));
        assert_eq!(Value::from(&json!(true)), Value::Bool(true));
        assert_eq!(Value::from(&json!(null)), Value::Null);
    }

    #[test]
    fn test_from_json_array_passes_through_as_text() {
        assert_eq!(Value::from(&json!([1, 2])), Value::Text("[1,2]".into()));
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::from("1").is_truthy());
        assert!(Value::from(true).is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::from("false").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
    }

    #[test]
    fn test_display_escapes_quotes() {
        assert_eq!(Value::from("O'Brien").to_string(), "'O''Brien'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
