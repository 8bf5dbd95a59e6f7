//! Wiring of configuration into schedulers and sinks, and the single-shot
//! push run with its exit status contract.

use std::sync::Arc;
use std::time::Duration;

use dellhw_collector::{CollectorRegistry, MetricStore, OmReport, ReportSource, Scheduler};
use tracing::{error, info};

use crate::config::{CollectConfig, ZabbixConfig};
use crate::zabbix::{Transport, ZabbixMode, ZabbixSender, ZabbixSink};

/// Payload sent and accepted.
pub const EXIT_OK: u8 = 0;
/// Configuration or startup failure.
pub const EXIT_CONFIG: u8 = 1;
/// A collector could not produce its report.
pub const EXIT_COLLECTOR: u8 = 3;

/// Scheduler running the real `omreport` tool.
pub fn omreport_scheduler(config: &CollectConfig) -> Scheduler<OmReport> {
    let source = OmReport::new(&config.omreport_path).with_timeout(config.timeout());
    Scheduler::new(
        CollectorRegistry::builtin(),
        source,
        Arc::new(MetricStore::new()),
        config.enabled(),
    )
}

/// Zabbix sink for the configured server, host and mode.
pub fn zabbix_sink(zabbix: &ZabbixConfig, namespace: &str) -> ZabbixSink<ZabbixSender> {
    let mode = if zabbix.discovery {
        ZabbixMode::Discovery
    } else {
        ZabbixMode::Update
    };
    let sender = ZabbixSender::new(zabbix.address(), Duration::from_secs(zabbix.timeout_secs));
    ZabbixSink::new(sender, mode, namespace, zabbix.get_hostname())
}

/// Collect once and push the snapshot, returning the process exit status.
///
/// Any collector failure aborts the run before anything is sent. Sink
/// failures map through [`dellhw_collector::SinkError::exit_code`]: `2` for
/// serialization, `4` for transport.
pub async fn push_once<S, T>(scheduler: &Scheduler<S>, sink: &ZabbixSink<T>) -> u8
where
    S: ReportSource,
    T: Transport,
{
    let cycle = scheduler.run_cycle().await;
    if !cycle.is_success() {
        for failure in &cycle.failures {
            error!(
                collector = %failure.collector,
                args = ?failure.args,
                error = %failure.error,
                "Collector failed"
            );
        }
        return EXIT_COLLECTOR;
    }

    info!(
        records = cycle.total_records(),
        mode = ?sink.mode(),
        "Collection finished, pushing to Zabbix"
    );

    match scheduler.publish(sink).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!(error = %e, "Zabbix push failed");
            e.exit_code()
        }
    }
}
