//! Passage metadata restricted to index-compatible scalars

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Longest stringified value kept for a complex metadata entry
pub const MAX_COMPLEX_VALUE_CHARS: usize = 500;

/// Metadata mapping attached to every passage
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// Convert an arbitrary JSON value, stringifying anything non-scalar
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Bool(b) => MetadataValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => MetadataValue::Integer(i),
                None => MetadataValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => MetadataValue::Text(s.clone()),
            Value::Null => MetadataValue::Text(String::new()),
            complex => MetadataValue::Text(
                complex
                    .to_string()
                    .chars()
                    .take(MAX_COMPLEX_VALUE_CHARS)
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        MetadataValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
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

/// Lower-case a key, drop slashes and turn spaces into underscores
pub fn normalize_key(key: &str) -> String {
    key.trim().replace('/', "").replace(' ', "_").to_lowercase()
}

/// Normalize every key of an existing mapping
pub fn normalize_metadata(metadata: Metadata) -> Metadata {
    metadata
        .into_iter()
        .map(|(key, value)| (normalize_key(&key), value))
        .collect()
}

/// Build metadata from a free-form JSON object
pub fn metadata_from_json(map: &serde_json::Map<String, serde_json::Value>) -> Metadata {
    map.iter()
        .map(|(key, value)| (normalize_key(key), MetadataValue::from_json(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("/Creation Date"), "creation_date");
        assert_eq!(normalize_key("  Author "), "author");
        assert_eq!(normalize_key("pdf/Producer"), "pdfproducer");
    }

    #[test]
    fn test_complex_values_are_stringified_and_truncated() {
        let long_list: Vec<String> = (0..200).map(|i| format!("item-{}", i)).collect();
        let value = MetadataValue::from_json(&json!(long_list));
        let text = value.as_str().unwrap();
        assert_eq!(text.chars().count(), MAX_COMPLEX_VALUE_CHARS);
        assert!(text.starts_with("[\"item-0\""));
    }

    #[test]
    fn test_scalars_are_preserved() {
        let map = json!({"Pages": 12, "Ratio": 0.5, "Draft": true, "Title": "NDT", "Missing": null});
        let metadata = metadata_from_json(map.as_object().unwrap());
        assert_eq!(metadata["pages"], MetadataValue::Integer(12));
        assert_eq!(metadata["ratio"], MetadataValue::Float(0.5));
        assert_eq!(metadata["draft"], MetadataValue::Bool(true));
        assert_eq!(metadata["title"], MetadataValue::Text("NDT".into()));
        assert_eq!(metadata["missing"], MetadataValue::Text(String::new()));
    }

    #[test]
    fn test_untagged_serialization() {
        let mut metadata = Metadata::new();
        metadata.insert("chunk_id".into(), 3usize.into());
        metadata.insert("filename".into(), "notes.pdf".into());
        let encoded = serde_json::to_string(&metadata).unwrap();
        assert_eq!(encoded, r#"{"chunk_id":3,"filename":"notes.pdf"}"#);
    }
}
