//! Collection cycle: run enabled collectors, parse, store, publish.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::{CollectorError, SinkError};
use crate::normalize::split_row;
use crate::omreport::ReportSource;
use crate::parser::{NestedQuery, ParseContext, parse_row};
use crate::registry::CollectorRegistry;
use crate::sink::Sink;
use crate::store::SharedStore;

/// A report that could not be produced during a cycle.
#[derive(Debug)]
pub struct CollectorFailure {
    /// Enabled collector the failed report belongs to.
    pub collector: String,
    pub args: Vec<String>,
    pub error: CollectorError,
}

/// Outcome of one [`Scheduler::run_cycle`].
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Records stored per collector, in run order.
    pub collected: Vec<(String, usize)>,
    pub failures: Vec<CollectorFailure>,
}

impl CycleReport {
    pub fn total_records(&self) -> usize {
        self.collected.iter().map(|(_, n)| n).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the enabled collectors against a report source and fills the store.
pub struct Scheduler<S> {
    registry: CollectorRegistry,
    source: S,
    store: SharedStore,
    enabled: Vec<String>,
}

impl<S: ReportSource> Scheduler<S> {
    pub fn new(
        registry: CollectorRegistry,
        source: S,
        store: SharedStore,
        enabled: Vec<String>,
    ) -> Self {
        Self {
            registry,
            source,
            store,
            enabled,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn enabled(&self) -> &[String] {
        &self.enabled
    }

    /// Run every enabled collector once, sequentially.
    ///
    /// Unknown collector names are skipped. A failed report is recorded and the
    /// cycle goes on; records parsed before the failure are still stored.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for name in &self.enabled {
            let Some(domain) = self.registry.get(name) else {
                debug!(collector = %name, "Unknown collector, skipping");
                continue;
            };

            let mut pending = VecDeque::from([NestedQuery {
                domain,
                args: domain.args(),
                context: ParseContext::default(),
            }]);
            let mut records = Vec::new();

            while let Some(query) = pending.pop_front() {
                let lines = match self.source.report(&query.args).await {
                    Ok(lines) => lines,
                    Err(e) => {
                        warn!(collector = %name, args = ?query.args, error = %e, "Report failed");
                        report.failures.push(CollectorFailure {
                            collector: name.clone(),
                            args: query.args,
                            error: e,
                        });
                        continue;
                    }
                };

                for line in lines.iter().filter(|l| !l.trim().is_empty()) {
                    let parsed = parse_row(query.domain, &query.context, &split_row(line));
                    records.extend(parsed.records);
                    pending.extend(parsed.nested);
                }
            }

            debug!(collector = %name, records = records.len(), "Collector finished");
            report.collected.push((name.clone(), records.len()));
            self.store.put_all(records);
        }

        report
    }

    /// Hand the current store snapshot to `sink`.
    pub async fn publish<K: Sink>(&self, sink: &K) -> Result<(), SinkError> {
        let snapshot = self.store.snapshot();
        sink.publish(&snapshot).await
    }

    /// Collect and publish every `interval` until `shutdown` turns true.
    ///
    /// Collector and sink failures are logged; the loop keeps going.
    pub async fn run<K: Sink>(
        &self,
        sink: &K,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            collectors = ?self.enabled,
            interval_secs = interval.as_secs(),
            "Collection loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let cycle = self.run_cycle().await;
                    for failure in &cycle.failures {
                        error!(collector = %failure.collector, error = %failure.error, "Collector failed");
                    }
                    if let Err(e) = self.publish(sink).await {
                        error!(error = %e, "Publishing snapshot failed");
                    }
                    debug!(records = cycle.total_records(), stored = self.store.len(), "Cycle complete");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Collection loop stopped");
    }
}
