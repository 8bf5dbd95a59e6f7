//! Update and discovery payloads built from a store snapshot.

use std::collections::BTreeSet;

use dellhw_collector::SinkError;
use dellhw_common::{MetricRecord, MetricValue, Tags};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Item key -> value mapping handed to the transport.
pub type Payload = Map<String, Value>;

/// Low-level discovery document.
#[derive(Serialize)]
struct Discovery<'a> {
    data: BTreeSet<&'a Tags>,
}

/// Item key of a record: `<namespace>.<record key>`.
pub fn item_key(namespace: &str, record: &MetricRecord) -> String {
    format!("{}.{}", namespace, record.key)
}

/// Item key carrying the discovery document.
pub fn discovery_key(namespace: &str) -> String {
    format!("{}.discovery", namespace)
}

/// One item per record with its current value.
///
/// Whole numbers are sent as integers (`2400`, not `2400.0`). Non-finite
/// numbers cannot be encoded and fail the whole payload.
pub fn build_update(namespace: &str, snapshot: &[MetricRecord]) -> Result<Payload, SinkError> {
    let mut payload = Payload::new();
    for record in snapshot {
        payload.insert(item_key(namespace, record), json_value(record)?);
    }
    Ok(payload)
}

/// A single discovery item listing every distinct, non-empty tag set.
pub fn build_discovery(namespace: &str, snapshot: &[MetricRecord]) -> Result<Payload, SinkError> {
    let discovery = Discovery {
        data: snapshot
            .iter()
            .map(|r| &r.tags)
            .filter(|tags| !tags.is_empty())
            .collect(),
    };
    let document = serde_json::to_string(&discovery)?;

    let mut payload = Payload::new();
    payload.insert(discovery_key(namespace), Value::String(document));
    Ok(payload)
}

fn json_value(record: &MetricRecord) -> Result<Value, SinkError> {
    match &record.value {
        MetricValue::Text(text) => Ok(Value::String(text.clone())),
        MetricValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Ok(Value::from(*n as i64))
        }
        MetricValue::Number(n) => Number::from_f64(*n).map(Value::Number).ok_or_else(|| {
            SinkError::Serialization(format!("{} has non-finite value {}", record.key, n))
        }),
    }
}
