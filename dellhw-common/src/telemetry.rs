use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labels identifying a metric instance (component name, slot id, controller id).
pub type Tags = BTreeMap<String, String>;

/// A single metric emitted by a row parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Store key: `name` or `name[instance]`. Stable for a hardware instance.
    pub key: String,

    /// Dotted domain-qualified metric name (e.g., "chassis.fan.status").
    pub name: String,

    /// Instance labels (e.g., `name=FAN_1_RPM`, `id=0_1`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,

    /// The measured value.
    pub value: MetricValue,

    /// Help text for the metric.
    pub description: String,
}

impl MetricRecord {
    /// Create a record without tags; the key is the metric name.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<MetricValue>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            tags: Tags::new(),
            value: value.into(),
            description: description.into(),
        }
    }

    /// Add a tag to this record and re-derive its key.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self.key = record_key(&self.name, &self.tags);
        self
    }

    /// Add multiple tags to this record and re-derive its key.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags.extend(tags);
        self.key = record_key(&self.name, &self.tags);
        self
    }
}

/// Derive the store key for a metric name and tag set.
///
/// Tag values are joined in tag-key order: `chassis.fan.status[FAN_1_RPM]`,
/// `storage.pdisk.status[0,0_0_1]`.
pub fn record_key(name: &str, tags: &Tags) -> String {
    if tags.is_empty() {
        return name.to_string();
    }
    let instance: Vec<&str> = tags.values().map(String::as_str).collect();
    format!("{}[{}]", name, instance.join(","))
}

/// Metric value: numeric readings and severities, or text metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value, `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            MetricValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(v) => write!(f, "{}", v),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Number(v)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Number(v as f64)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}
