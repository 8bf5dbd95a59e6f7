//! Invocation of the `omreport` diagnostic tool.
//!
//! [`ReportSource`] is the only place a report is produced; parsers never see
//! a process. Tests substitute [`crate::mock::MockReport`].

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{CollectorError, Result};

/// Default location of the OpenManage report tool.
pub const DEFAULT_OMREPORT_PATH: &str = "/opt/dell/srvadmin/bin/omreport";

/// Arguments appended to every invocation to force `;`-separated output.
pub const FORMAT_ARGS: &[&str] = &["-fmt", "ssv"];

/// Something that turns an argument vector into lines of report output.
pub trait ReportSource: Send + Sync {
    fn report(&self, args: &[String]) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Runs the real `omreport` executable.
#[derive(Debug, Clone)]
pub struct OmReport {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl OmReport {
    /// Create a source for the executable at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: None,
        }
    }

    /// Kill invocations that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut parts = vec![self.path.display().to_string()];
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }
}

impl Default for OmReport {
    fn default() -> Self {
        Self::new(DEFAULT_OMREPORT_PATH)
    }
}

impl ReportSource for OmReport {
    fn report(&self, args: &[String]) -> impl Future<Output = Result<Vec<String>>> + Send {
        let command_line = self.command_line(args);
        let path = self.path.display().to_string();
        let timeout = self.timeout;

        let mut command = Command::new(&self.path);
        command
            .args(args)
            .args(FORMAT_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        async move {
            debug!(command = %command_line, "Running report");

            let output = match timeout {
                Some(limit) => tokio::time::timeout(limit, command.output())
                    .await
                    .map_err(|_| CollectorError::Timeout {
                        command: command_line.clone(),
                        secs: limit.as_secs(),
                    })?,
                None => command.output().await,
            };

            let output = output.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CollectorError::NotFound { path: path.clone() },
                _ => CollectorError::Spawn {
                    path: path.clone(),
                    source: e,
                },
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CollectorError::NonZeroExit {
                    command: command_line,
                    status: output.status.to_string(),
                    stderr: stderr.lines().next().unwrap_or_default().trim().to_string(),
                });
            }

            let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_string)
                .collect();
            trace!(command = %command_line, lines = lines.len(), "Report finished");

            Ok(lines)
        }
    }
}
