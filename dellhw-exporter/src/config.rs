//! Configuration for the exporter.

use std::path::Path;
use std::time::Duration;

use dellhw_collector::{DEFAULT_OMREPORT_PATH, parse_enabled};
use dellhw_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Backend the collected metrics are forwarded to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExporterKind {
    /// Long-running HTTP endpoint scraped by Prometheus.
    #[default]
    Prometheus,
    /// Single-shot push to a Zabbix trapper.
    Zabbix,
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Active backend.
    #[serde(default)]
    pub exporter: ExporterKind,

    /// Collection settings.
    #[serde(default)]
    pub collect: CollectConfig,

    /// Prometheus endpoint settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Zabbix sender settings.
    #[serde(default)]
    pub zabbix: ZabbixConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to collect and how often.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Comma-separated collector names (default: "chassis,memory,processors").
    #[serde(default = "default_collectors")]
    pub collectors: String,

    /// Path to the omreport executable.
    #[serde(default = "default_omreport_path")]
    pub omreport_path: String,

    /// Kill an omreport invocation after this many seconds (0 = no limit).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds between collection cycles in server mode.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Prefix of every exported metric name and item key (default: "dellhw").
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_collectors() -> String {
    "chassis,memory,processors".to_string()
}

fn default_omreport_path() -> String {
    DEFAULT_OMREPORT_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    60
}

fn default_namespace() -> String {
    "dellhw".to_string()
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            collectors: default_collectors(),
            omreport_path: default_omreport_path(),
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
            namespace: default_namespace(),
        }
    }
}

impl CollectConfig {
    /// Enabled collector names, in configured order.
    pub fn enabled(&self) -> Vec<String> {
        parse_enabled(&self.collectors)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:4242").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_listen() -> String {
    "0.0.0.0:4242".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

/// Zabbix sender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZabbixConfig {
    /// Zabbix server or proxy address.
    #[serde(default = "default_zabbix_server")]
    pub server: String,

    /// Trapper port.
    #[serde(default = "default_zabbix_port")]
    pub port: u16,

    /// Host name the items belong to.
    /// Use "auto" to detect automatically (default).
    #[serde(default = "default_zabbix_host")]
    pub host: String,

    /// Send low-level discovery data instead of values.
    #[serde(default)]
    pub discovery: bool,

    /// Send item values. Unset means "unless discovery is on".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,

    /// Connect/read timeout in seconds.
    #[serde(default = "default_zabbix_timeout")]
    pub timeout_secs: u64,
}

fn default_zabbix_server() -> String {
    "127.0.0.1".to_string()
}

fn default_zabbix_port() -> u16 {
    10051
}

fn default_zabbix_host() -> String {
    "auto".to_string()
}

fn default_zabbix_timeout() -> u64 {
    10
}

impl Default for ZabbixConfig {
    fn default() -> Self {
        Self {
            server: default_zabbix_server(),
            port: default_zabbix_port(),
            host: default_zabbix_host(),
            discovery: false,
            update: None,
            timeout_secs: default_zabbix_timeout(),
        }
    }
}

impl ZabbixConfig {
    /// `server:port` of the trapper.
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    /// Get the hostname to use, resolving "auto" if needed.
    pub fn get_hostname(&self) -> String {
        if self.host == "auto" {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string())
        } else {
            self.host.clone()
        }
    }

    /// Whether item values are pushed.
    pub fn sends_update(&self) -> bool {
        self.update.unwrap_or(!self.discovery)
    }

    /// Select discovery mode, turning update mode off.
    pub fn use_discovery(&mut self) {
        self.discovery = true;
        self.update = Some(false);
    }

    /// Select update mode, turning discovery mode off.
    pub fn use_update(&mut self) {
        self.discovery = false;
        self.update = Some(true);
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    ///
    /// Not validated: callers apply overrides first, then call [`Self::validate`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(json5::from_str(&content)?)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collect.enabled().is_empty() {
            return Err(ConfigError::Validation(
                "At least one collector must be enabled".to_string(),
            ));
        }

        if self.collect.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "interval_secs must be > 0".to_string(),
            ));
        }

        if self.collect.namespace.is_empty()
            || !self
                .collect
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "Invalid namespace: {:?}",
                self.collect.namespace
            )));
        }

        // Validate listen address format
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        // Validate path starts with /
        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.zabbix.discovery == self.zabbix.sends_update() {
            return Err(ConfigError::Validation(
                "Exactly one of zabbix discovery or update must be set".to_string(),
            ));
        }

        if self.zabbix.server.is_empty() || self.zabbix.port == 0 {
            return Err(ConfigError::Validation(format!(
                "Invalid zabbix server address: {}",
                self.zabbix.address()
            )));
        }

        if self.zabbix.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "zabbix timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
