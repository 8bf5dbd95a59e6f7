//! Dell OpenManage hardware exporter.
//!
//! Polls `omreport`, keeps the latest value of every hardware metric and
//! forwards them to one of two backends:
//!
//! - Prometheus: a long-running HTTP endpoint serving OpenMetrics text.
//! - Zabbix: a single-shot push of item values or discovery data, reporting
//!   the outcome through the process exit status.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────────┐
//! │    omreport     │────>│    Scheduler    │────>│ GaugeRegistry (HTTP) │
//! │  (-fmt ssv)     │     │  (MetricStore)  │     │ ZabbixSink (TCP)     │
//! └─────────────────┘     └─────────────────┘     └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! dellhw-exporter --config dellhw.json5
//! dellhw-exporter --exporter zabbix --discovery --zabbix-server zbx.example.com
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod app;
pub mod config;
pub mod http;
pub mod prometheus;
pub mod zabbix;

pub use config::{ExporterConfig, ExporterKind};
pub use http::HttpServer;
pub use prometheus::{GaugeRegistry, SharedRegistry};
pub use zabbix::{ZabbixMode, ZabbixSender, ZabbixSink};
