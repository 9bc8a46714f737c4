//! Request metadata types.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl MetadataValue {
    /// Convert to the JSON scalar sent to the collector.
    ///
    /// Non-finite floats have no JSON representation and yield `None`.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            MetadataValue::Str(s) => Some(serde_json::Value::String(s.clone())),
            MetadataValue::Int(i) => Some(serde_json::Value::from(*i)),
            MetadataValue::Float(f) => json_number(*f),
            MetadataValue::Bool(b) => Some(serde_json::Value::Bool(*b)),
        }
    }
}

/// Encode a float, keeping integral values as JSON integers.
pub(crate) fn json_number(value: f64) -> Option<serde_json::Value> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Some(serde_json::Value::from(value as i64));
    }
    serde_json::Number::from_f64(value).map(serde_json::Value::Number)
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Str(s) => f.write_str(s),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataValue::Str(s) => serializer.serialize_str(s),
            MetadataValue::Int(i) => serializer.serialize_i64(*i),
            MetadataValue::Float(f) => serializer.serialize_f64(*f),
            MetadataValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Int(value.into())
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        MetadataValue::Int(value.into())
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Insertion-ordered metadata attached to one unit of work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMetadata {
    entries: Vec<(String, MetadataValue)>,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, replacing an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as the log tag `[k1=v1;k2=v2] `, or an empty string.
    pub fn log_prefix(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("[{}] ", pairs.join(";"))
    }
}

impl<K, V> FromIterator<(K, V)> for RequestMetadata
where
    K: Into<String>,
    V: Into<MetadataValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = RequestMetadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

impl Serialize for RequestMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut metadata = RequestMetadata::new().with("user", "alice").with("tenant", 7);
        metadata.insert("user", "bob");

        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["user", "tenant"]);
        assert_eq!(metadata.get("user"), Some(&MetadataValue::from("bob")));
    }

    #[test]
    fn test_log_prefix() {
        assert_eq!(RequestMetadata::new().log_prefix(), "");

        let metadata = RequestMetadata::new()
            .with("requestId", "abc")
            .with("retry", false)
            .with("attempt", 2);
        assert_eq!(metadata.log_prefix(), "[requestId=abc;retry=false;attempt=2] ");
    }

    #[test]
    fn test_json_number_keeps_integers() {
        assert_eq!(json_number(1.0), Some(serde_json::json!(1)));
        assert_eq!(json_number(2.5), Some(serde_json::json!(2.5)));
        assert_eq!(json_number(f64::NAN), None);
        assert_eq!(MetadataValue::Float(f64::INFINITY).to_json(), None);
    }

    #[test]
    fn test_serialize_preserves_order() {
        let metadata: RequestMetadata = vec![("b", 1), ("a", 2)].into_iter().collect();
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"b":1,"a":2}"#);
    }
}
