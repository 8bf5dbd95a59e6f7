//! In-memory [`ReportSource`] returning canned output keyed by argument vector.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;

use crate::error::{CollectorError, Result};
use crate::omreport::ReportSource;

/// Canned report output for tests and dry runs.
///
/// Arguments without registered output fail with [`CollectorError::NoReport`],
/// which behaves like a missing tool from the scheduler's point of view.
#[derive(Debug, Default)]
pub struct MockReport {
    reports: HashMap<Vec<String>, Vec<String>>,
    failures: HashMap<Vec<String>, String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the output lines for `args`.
    pub fn with_report(mut self, args: &[&str], lines: &[&str]) -> Self {
        self.reports.insert(
            to_owned(args),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// Make `args` fail as if the tool exited with an error.
    pub fn with_failure(mut self, args: &[&str], stderr: &str) -> Self {
        self.failures.insert(to_owned(args), stderr.to_string());
        self
    }

    /// Argument vectors requested so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

impl ReportSource for MockReport {
    fn report(&self, args: &[String]) -> impl Future<Output = Result<Vec<String>>> + Send {
        self.calls.lock().push(args.to_vec());

        let result = if let Some(stderr) = self.failures.get(args) {
            Err(CollectorError::NonZeroExit {
                command: args.join(" "),
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            })
        } else {
            self.reports
                .get(args)
                .cloned()
                .ok_or_else(|| CollectorError::NoReport(args.to_vec()))
        };

        std::future::ready(result)
    }
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}
