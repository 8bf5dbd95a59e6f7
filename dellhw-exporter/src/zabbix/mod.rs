//! Zabbix push adapter.
//!
//! Snapshots are sent either as item values (update mode) or as one
//! low-level discovery document (discovery mode), never both in one run.

pub mod payload;
pub mod sender;

use std::future::Future;

use dellhw_collector::{Sink, SinkError};
use dellhw_common::MetricRecord;
use tracing::{info, warn};

pub use payload::{Payload, build_discovery, build_update, discovery_key, item_key};
pub use sender::{SendSummary, Transport, ZabbixSender};

/// What a push carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZabbixMode {
    /// Current values of known items.
    Update,
    /// Instance tag sets for low-level discovery.
    Discovery,
}

/// [`Sink`] pushing snapshots through a [`Transport`].
pub struct ZabbixSink<T> {
    transport: T,
    mode: ZabbixMode,
    namespace: String,
    host: String,
}

impl<T: Transport> ZabbixSink<T> {
    pub fn new(
        transport: T,
        mode: ZabbixMode,
        namespace: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            mode,
            namespace: namespace.into(),
            host: host.into(),
        }
    }

    pub fn mode(&self) -> ZabbixMode {
        self.mode
    }

    /// Build the payload for the configured mode.
    pub fn build(&self, snapshot: &[MetricRecord]) -> Result<Payload, SinkError> {
        match self.mode {
            ZabbixMode::Update => build_update(&self.namespace, snapshot),
            ZabbixMode::Discovery => build_discovery(&self.namespace, snapshot),
        }
    }
}

impl<T: Transport> Sink for ZabbixSink<T> {
    fn publish(
        &self,
        snapshot: &[MetricRecord],
    ) -> impl Future<Output = Result<(), SinkError>> + Send {
        let payload = self.build(snapshot);

        async move {
            let payload = payload?;
            let summary = self.transport.send(&self.host, &payload).await?;

            info!(
                host = %self.host,
                mode = ?self.mode,
                processed = summary.processed,
                failed = summary.failed,
                total = summary.total,
                "Zabbix answered"
            );
            if summary.failed > 0 && summary.processed == 0 {
                return Err(SinkError::Transport(format!(
                    "server processed none of {} items",
                    summary.failed
                )));
            }
            if summary.failed > 0 {
                warn!(failed = summary.failed, "Zabbix ignored some items");
            }
            Ok(())
        }
    }
}
