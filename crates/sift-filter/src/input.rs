//! Request input handed to filters.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FilterError, Result};

/// Field name to value mapping, in the order the fields arrived.
///
/// Entries whose value is the empty string are dropped on construction, so a
/// blank form field never reaches a filter method.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct FilterInput {
    values: Map<String, Value>,
}

impl FilterInput {
    pub fn new(mut values: Map<String, Value>) -> Self {
        values.retain(|_, value| !matches!(value, Value::String(s) if s.is_empty()));
        Self { values }
    }

    /// Builds input from a JSON document, which must be an object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(FilterError::InvalidInput(format!(
                "expected a JSON object, got `{other}`"
            ))),
        }
    }

    /// Parses `a=1&b=two&tags[]=x&tags[]=y`.
    ///
    /// Keys and values are percent-decoded with `+` read as a space. Keys
    /// ending in `[]` collect into an array; a repeated plain key keeps the
    /// last value.
    pub fn from_query_str(query: &str) -> Self {
        let mut values = Map::new();

        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty());

        for pair in pairs {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode(key);
            let value = Value::String(decode(value));

            match key.strip_suffix("[]") {
                Some(name) => {
                    let slot = values
                        .entry(name.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !slot.is_array() {
                        *slot = Value::Array(Vec::new());
                    }
                    if let Value::Array(items) = slot {
                        items.push(value);
                    }
                }
                None => {
                    values.insert(key, value);
                }
            }
        }

        Self::new(values)
    }

    pub fn all(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The entries whose key is one of `fields`, keeping input order.
    pub fn only<S: AsRef<str>>(&self, fields: &[S]) -> FilterInput {
        let values = self
            .values
            .iter()
            .filter(|(key, _)| fields.iter().any(|f| f.as_ref() == key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        FilterInput { values }
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

impl From<Map<String, Value>> for FilterInput {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

impl From<FilterInput> for Map<String, Value> {
    fn from(input: FilterInput) -> Self {
        input.values
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FilterInput {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_strings_are_dropped() {
        let input = FilterInput::from_json(json!({
            "name": "Alice",
            "status": "",
            "age": 0,
            "deleted": null,
            "tags": []
        }))
        .unwrap();

        assert_eq!(
            input.keys().collect::<Vec<_>>(),
            vec!["name", "age", "deleted", "tags"]
        );
        assert!(!input.contains("status"));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(matches!(
            FilterInput::from_json(json!(["a"])),
            Err(FilterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_query_string() {
        let input =
            FilterInput::from_query_str("?name=Alice+Smith&status=&tags[]=a&tags[]=b%20c&q=%C3%A9");

        assert_eq!(input.get("name"), Some(&json!("Alice Smith")));
        assert_eq!(input.get("status"), None);
        assert_eq!(input.get("tags"), Some(&json!(["a", "b c"])));
        assert_eq!(input.get("q"), Some(&json!("é")));
    }

    #[test]
    fn test_query_string_repeated_key_keeps_last() {
        let input = FilterInput::from_query_str("page=1&flag&page=2");
        assert_eq!(input.get("page"), Some(&json!("2")));
        assert_eq!(input.len(), 1);
    }

    #[test]
    fn test_only_keeps_input_order() {
        let input: FilterInput = [
            ("other", json!("y")),
            ("body", json!("x")),
            ("author_id", json!(3)),
        ]
        .into_iter()
        .collect();

        let subset = input.only(&["author_id", "body"]);
        assert_eq!(
            subset.keys().collect::<Vec<_>>(),
            vec!["body", "author_id"]
        );
    }

    #[test]
    fn test_deserialize_sanitizes() {
        let input: FilterInput = serde_json::from_str(r#"{"a": "", "b": "1"}"#).unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(serde_json::to_string(&input).unwrap(), r#"{"b":"1"}"#);
    }
}
