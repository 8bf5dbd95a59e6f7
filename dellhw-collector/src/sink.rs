//! Destination of store snapshots.

use std::future::Future;

use dellhw_common::MetricRecord;

use crate::error::SinkError;

/// A backend that receives the full store snapshot after every cycle.
pub trait Sink: Send + Sync {
    fn publish(
        &self,
        snapshot: &[MetricRecord],
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}
