/// The flat property bag sent to a table store.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single scalar property value.
///
/// Serialized untagged, so an entity file reads like plain JSON:
/// `{"status": "completed", "score": 73, "metrics_isChunked": true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Stored size of the value in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        match self {
            PropertyValue::Bool(_) => 1,
            PropertyValue::Int(_) | PropertyValue::Double(_) => 8,
            PropertyValue::Str(s) => s.len(),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

/// One entity: two keys and a sorted map of named properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntity {
    pub partition_key: String,
    pub row_key: String,
    properties: BTreeMap<String, PropertyValue>,
}

impl StorageEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Sets a property, returning the previous value if there was one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Properties in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.properties.iter()
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    /// Number of properties as a table store counts them: the two keys plus
    /// every named property.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len() + 2
    }

    /// Approximate stored size: keys, property names and values.
    #[must_use]
    pub fn approx_size(&self) -> usize {
        self.partition_key.len()
            + self.row_key.len()
            + self
                .properties
                .iter()
                .map(|(name, value)| name.len() + value.size_bytes())
                .sum::<usize>()
    }
}
