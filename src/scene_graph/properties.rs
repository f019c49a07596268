use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Host-internal key that never takes part in copying or syncing.
pub const RESERVED_KEY: &str = "_RNA_UI";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(value) => write!(f, "{}", value),
            PropertyValue::Int(value) => write!(f, "{}", value),
            PropertyValue::Float(value) => write!(f, "{}", value),
            PropertyValue::String(value) => write!(f, "{:?}", value),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Freeform custom properties, kept in insertion order like the host does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    values: IndexMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.values.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Keys and values excluding [`RESERVED_KEY`].
    pub fn user_entries(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.iter().filter(|(key, _)| *key != RESERVED_KEY)
    }

    pub fn user_keys(&self) -> impl Iterator<Item = &str> {
        self.user_entries().map(|(key, _)| key)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .user_entries()
            .map(|(key, value)| {
                let json = match value {
                    PropertyValue::Bool(value) => serde_json::Value::from(*value),
                    PropertyValue::Int(value) => serde_json::Value::from(*value),
                    PropertyValue::Float(value) => serde_json::Value::from(*value),
                    PropertyValue::String(value) => serde_json::Value::from(value.as_str()),
                };
                (key.to_string(), json)
            })
            .collect::<serde_json::Map<_, _>>();

        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_keeps_insertion_order_of_remaining_keys() {
        let mut props = Properties::new();
        props.insert("a", 1);
        props.insert("b", "two");
        props.insert("c", true);
        props.remove("b");

        assert_eq!(props.user_keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn reserved_key_is_hidden_from_user_entries_and_json() {
        let mut props = Properties::new();
        props.insert(RESERVED_KEY, "internal");
        props.insert("health", 100);

        assert_eq!(props.len(), 2);
        assert_eq!(props.user_keys().collect::<Vec<_>>(), vec!["health"]);
        assert_eq!(props.to_json(), serde_json::json!({ "health": 100 }));
    }

    #[test]
    fn untagged_values_deserialize_by_shape() {
        let props: Properties =
            serde_json::from_str(r#"{ "i": 3, "f": 1.5, "b": false, "s": "x" }"#).unwrap();

        assert_eq!(props.get("i"), Some(&PropertyValue::Int(3)));
        assert_eq!(props.get("f"), Some(&PropertyValue::Float(1.5)));
        assert_eq!(props.get("b"), Some(&PropertyValue::Bool(false)));
        assert_eq!(props.get("s"), Some(&PropertyValue::from("x")));
    }
}
