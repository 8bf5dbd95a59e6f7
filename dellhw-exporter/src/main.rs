//! Dell OpenManage hardware exporter.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use dellhw_exporter::app::{EXIT_CONFIG, omreport_scheduler, push_once, zabbix_sink};
use dellhw_exporter::{ExporterConfig, ExporterKind, GaugeRegistry, HttpServer};

/// Dell OpenManage hardware exporter for Prometheus and Zabbix.
#[derive(Parser, Debug)]
#[command(name = "dellhw-exporter")]
#[command(about = "Export Dell OpenManage hardware health to Prometheus or Zabbix")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// Backend to forward metrics to (overrides config).
    #[arg(long, value_enum)]
    exporter: Option<ExporterKind>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Metrics path (overrides config).
    #[arg(long)]
    path: Option<String>,

    /// Comma-separated list of collectors to run (overrides config).
    #[arg(long)]
    collect: Option<String>,

    /// Path to the omreport executable (overrides config).
    #[arg(long)]
    omreport: Option<String>,

    /// Zabbix server address (overrides config).
    #[arg(long)]
    zabbix_server: Option<String>,

    /// Zabbix trapper port (overrides config).
    #[arg(long)]
    zabbix_port: Option<u16>,

    /// Host name the pushed items belong to, or "auto" (overrides config).
    #[arg(long)]
    zabbix_host: Option<String>,

    /// Push low-level discovery data.
    #[arg(long, conflicts_with = "update")]
    discovery: bool,

    /// Push item values.
    #[arg(long)]
    update: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut ExporterConfig) {
        if let Some(exporter) = self.exporter {
            config.exporter = exporter;
        }
        if let Some(listen) = self.listen {
            config.prometheus.listen = listen;
        }
        if let Some(path) = self.path {
            config.prometheus.path = path;
        }
        if let Some(collect) = self.collect {
            config.collect.collectors = collect;
        }
        if let Some(omreport) = self.omreport {
            config.collect.omreport_path = omreport;
        }
        if let Some(server) = self.zabbix_server {
            config.zabbix.server = server;
        }
        if let Some(port) = self.zabbix_port {
            config.zabbix.port = port;
        }
        if let Some(host) = self.zabbix_host {
            config.zabbix.host = host;
        }
        if self.discovery {
            config.zabbix.use_discovery();
        }
        if self.update {
            config.zabbix.use_update();
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = dellhw_common::init_tracing(&config.logging) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_CONFIG);
    }

    match config.exporter {
        ExporterKind::Prometheus => match serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Exporter failed: {:#}", e);
                ExitCode::from(EXIT_CONFIG)
            }
        },
        ExporterKind::Zabbix => {
            let code = push(config).await;
            // The agent's external check reads the status from stdout
            println!("{}", code);
            ExitCode::from(code)
        }
    }
}

fn load_config(args: Args) -> anyhow::Result<ExporterConfig> {
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Single-shot Zabbix push.
async fn push(config: ExporterConfig) -> u8 {
    info!(
        server = %config.zabbix.address(),
        collectors = %config.collect.collectors,
        "Starting Zabbix push"
    );

    let scheduler = omreport_scheduler(&config.collect);
    let sink = zabbix_sink(&config.zabbix, &config.collect.namespace);
    push_once(&scheduler, &sink).await
}

/// Long-running Prometheus endpoint.
async fn serve(config: ExporterConfig) -> anyhow::Result<()> {
    info!("Starting Dell hardware exporter");

    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let registry = Arc::new(GaugeRegistry::new(&config.collect.namespace));

    // Binding failure is fatal before any collection starts
    let server = HttpServer::new(registry.clone(), listen_addr, config.prometheus.path.clone())
        .bind()
        .await?;

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = omreport_scheduler(&config.collect);
    let interval = config.collect.interval();
    let collect_shutdown = shutdown_rx.clone();
    let collect_task = tokio::spawn(async move {
        scheduler
            .run(registry.as_ref(), interval, collect_shutdown)
            .await;
    });

    let http_shutdown = shutdown_rx.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = server.serve(http_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_signal().await;

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for tasks to complete
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = collect_task.await;
        let _ = http_task.await;
    })
    .await;

    info!("Exporter stopped");
    Ok(())
}

async fn wait_for_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = sigterm() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
