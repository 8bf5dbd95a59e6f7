//! Concurrent key -> record cache shared by the scheduler and the sinks.

use std::collections::HashMap;
use std::sync::Arc;

use dellhw_common::MetricRecord;
use parking_lot::RwLock;

/// Latest value of every metric seen since start-up.
///
/// Records are only ever overwritten: a key that is not re-emitted by a
/// cycle keeps its previous value until the process restarts.
#[derive(Debug, Default)]
pub struct MetricStore {
    records: RwLock<HashMap<String, MetricRecord>>,
}

/// Shareable store handle.
pub type SharedStore = Arc<MetricStore>;

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record under its key.
    pub fn put(&self, record: MetricRecord) {
        self.records.write().insert(record.key.clone(), record);
    }

    /// Insert a batch under a single write lock.
    pub fn put_all(&self, records: impl IntoIterator<Item = MetricRecord>) {
        let mut map = self.records.write();
        for record in records {
            map.insert(record.key.clone(), record);
        }
    }

    /// Copy of all records, sorted by key.
    pub fn snapshot(&self) -> Vec<MetricRecord> {
        let mut records: Vec<MetricRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    pub fn get(&self, key: &str) -> Option<MetricRecord> {
        self.records.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
