//! Collection side of the Dell hardware exporter.
//!
//! Runs `omreport`, parses its `;`-separated reports into
//! [`dellhw_common::MetricRecord`]s and keeps the latest value of each in a
//! [`MetricStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ ReportSource │──>│  Row parser  │──>│ MetricStore  │──>│   Sink   │
//! │  (omreport)  │   │ (domain tbl) │   │  (RwLock)    │   │          │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────┘
//! ```

pub mod domain;
pub mod error;
pub mod mock;
pub mod normalize;
pub mod omreport;
pub mod parser;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod store;

pub use error::{CollectorError, SinkError};
pub use mock::MockReport;
pub use omreport::{DEFAULT_OMREPORT_PATH, OmReport, ReportSource};
pub use registry::{CollectorRegistry, parse_enabled};
pub use scheduler::{CollectorFailure, CycleReport, Scheduler};
pub use sink::Sink;
pub use store::{MetricStore, SharedStore};
