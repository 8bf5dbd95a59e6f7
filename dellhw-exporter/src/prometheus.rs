//! Prometheus pull adapter.
//!
//! Every metric name gets one gauge family, registered on first write.
//! Record tags become labels; text values are exposed info-style with value
//! `1` and the text in a `value` label.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use dellhw_collector::{Sink, SinkError};
use dellhw_common::{MetricRecord, MetricValue};
use parking_lot::RwLock;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tracing::{debug, trace};

type Labels = Vec<(String, String)>;
type GaugeFamily = Family<Labels, Gauge<f64, AtomicU64>>;

struct Inner {
    registry: Registry,
    families: HashMap<String, GaugeFamily>,
    /// Last info label set per record key, removed when the text changes.
    info_labels: HashMap<String, Labels>,
    publishes: u64,
}

/// Gauge registry fed by store snapshots and rendered on scrape.
pub struct GaugeRegistry {
    inner: RwLock<Inner>,
}

/// Create a shareable registry handle.
pub type SharedRegistry = Arc<GaugeRegistry>;

impl GaugeRegistry {
    /// Create a registry whose metric names start with `namespace_`.
    pub fn new(namespace: &str) -> Self {
        let registry = if namespace.is_empty() {
            Registry::default()
        } else {
            Registry::with_prefix(namespace)
        };

        Self {
            inner: RwLock::new(Inner {
                registry,
                families: HashMap::new(),
                info_labels: HashMap::new(),
                publishes: 0,
            }),
        }
    }

    /// Set the gauge for one record, registering its family if needed.
    pub fn record(&self, record: &MetricRecord) {
        let mut inner = self.inner.write();
        let Inner {
            registry,
            families,
            info_labels,
            ..
        } = &mut *inner;

        let family = families
            .entry(record.name.clone())
            .or_insert_with(|| {
                let family = GaugeFamily::default();
                let name = metric_name(&record.name);
                debug!(metric = %name, "Registering gauge family");
                // The encoder terminates help text with its own period
                let help = record.description.trim_end_matches('.').to_string();
                registry.register(name, help, family.clone());
                family
            })
            .clone();

        let mut labels: Labels = record
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        match &record.value {
            MetricValue::Number(value) => {
                family.get_or_create(&labels).set(*value);
            }
            MetricValue::Text(text) => {
                labels.push(("value".to_string(), escape_label_value(text)));
                if let Some(previous) = info_labels.insert(record.key.clone(), labels.clone()) {
                    if previous != labels {
                        family.remove(&previous);
                    }
                }
                family.get_or_create(&labels).set(1.0);
            }
        }
        trace!(key = %record.key, "Gauge updated");
    }

    /// Number of registered gauge families.
    pub fn family_count(&self) -> usize {
        self.inner.read().families.len()
    }

    /// True once at least one snapshot has been published.
    pub fn is_ready(&self) -> bool {
        self.inner.read().publishes > 0
    }

    /// Render all gauges in OpenMetrics text format.
    pub fn render(&self) -> Result<String, SinkError> {
        let inner = self.inner.read();
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &inner.registry)
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        Ok(buffer)
    }
}

impl Sink for GaugeRegistry {
    fn publish(
        &self,
        snapshot: &[MetricRecord],
    ) -> impl Future<Output = Result<(), SinkError>> + Send {
        for record in snapshot {
            self.record(record);
        }
        self.inner.write().publishes += 1;
        debug!(records = snapshot.len(), "Gauges updated from snapshot");
        std::future::ready(Ok(()))
    }
}

/// Convert a dotted metric name into a Prometheus name component.
pub fn metric_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Escape backslashes, quotes and line feeds; the encoder writes label values verbatim.
fn escape_label_value(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
