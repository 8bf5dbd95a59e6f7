//! Integration tests for the exporter.
//!
//! These tests run full collection cycles against canned `omreport` output
//! and check what each backend receives.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use dellhw_collector::{CollectorRegistry, MetricStore, MockReport, Scheduler, parse_enabled};
use dellhw_exporter::app::{EXIT_COLLECTOR, EXIT_OK, push_once};
use dellhw_exporter::http::create_router;
use dellhw_exporter::zabbix::sender::frame;
use dellhw_exporter::{ExporterConfig, ExporterKind, GaugeRegistry, ZabbixMode, ZabbixSender, ZabbixSink};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

fn mock_report() -> MockReport {
    MockReport::new()
        .with_report(
            &["chassis", "fans"],
            &[
                "Index;Status;Probe Name;Reading;Minimum Warning Threshold;Maximum Warning Threshold;Minimum Failure Threshold;Maximum Failure Threshold",
                "0;Ok;System Board Fan1 RPM;6480 RPM;[N/A];[N/A];600 RPM;[N/A]",
            ],
        )
        .with_report(
            &["storage", "vdisk"],
            &["ID;Status;Name", "0;Ok;Virtual Disk 0", "1;Degraded;Virtual Disk 1"],
        )
}

fn scheduler(source: MockReport, collectors: &str) -> Scheduler<MockReport> {
    Scheduler::new(
        CollectorRegistry::builtin(),
        source,
        Arc::new(MetricStore::new()),
        parse_enabled(collectors),
    )
}

/// Accept one sender connection, reply with success and return the request body.
async fn zabbix_server() -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut header = [0u8; 13];
        socket.read_exact(&mut header).await.unwrap();
        let len = u64::from_le_bytes(header[5..].try_into().unwrap()) as usize;
        let mut body = vec![0u8; len];
        socket.read_exact(&mut body).await.unwrap();

        let request: Value = serde_json::from_slice(&body).unwrap();
        let count = request["data"].as_array().unwrap().len();
        let reply = format!(
            r#"{{"response":"success","info":"processed: {count}; failed: 0; total: {count}; seconds spent: 0.000042"}}"#
        );
        socket.write_all(&frame(reply.as_bytes())).await.unwrap();
        request
    });

    (address, handle)
}

#[tokio::test]
async fn test_scrape_after_cycle() {
    let scheduler = scheduler(mock_report(), "fans,storage_vdisk");
    let registry = Arc::new(GaugeRegistry::new("dellhw"));

    let cycle = scheduler.run_cycle().await;
    assert!(cycle.is_success());
    scheduler.publish(registry.as_ref()).await.unwrap();

    let router = create_router(registry, "/metrics");
    let response = router
        .clone()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();

    assert!(body.contains("# TYPE dellhw_chassis_fan_reading gauge"));
    assert!(body.contains("dellhw_chassis_fan_reading{name=\"System_Board_Fan1_RPM\"} 6480"));
    assert!(body.contains("dellhw_storage_vdisk_status{id=\"1\"} 1"));
    assert_eq!(body.matches("# TYPE dellhw_storage_vdisk_status").count(), 1);
}

#[tokio::test]
async fn test_repeated_cycles_do_not_duplicate_series() {
    let scheduler = scheduler(mock_report(), "storage_vdisk");
    let registry = GaugeRegistry::new("dellhw");

    for _ in 0..3 {
        scheduler.run_cycle().await;
        scheduler.publish(&registry).await.unwrap();
    }

    let body = registry.render().unwrap();
    assert_eq!(body.matches("dellhw_storage_vdisk_status{").count(), 2);
}

#[tokio::test]
async fn test_push_update() {
    let (address, server) = zabbix_server().await;
    let scheduler = scheduler(mock_report(), "fans,storage_vdisk");
    let sink = ZabbixSink::new(
        ZabbixSender::new(address, Duration::from_secs(5)),
        ZabbixMode::Update,
        "dellhw",
        "db01",
    );

    assert_eq!(push_once(&scheduler, &sink).await, EXIT_OK);

    let request = server.await.unwrap();
    let data = request["data"].as_array().unwrap();
    assert_eq!(data.len(), 4);
    assert!(data.iter().all(|item| item["host"] == "db01"));

    let value_of = |key: &str| {
        data.iter()
            .find(|item| item["key"] == key)
            .map(|item| item["value"].as_str().unwrap().to_string())
    };
    assert_eq!(
        value_of("dellhw.chassis.fan.reading[System_Board_Fan1_RPM]").as_deref(),
        Some("6480")
    );
    assert_eq!(value_of("dellhw.storage.vdisk.status[1]").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_push_discovery() {
    let (address, server) = zabbix_server().await;
    let scheduler = scheduler(mock_report(), "storage_vdisk");
    let sink = ZabbixSink::new(
        ZabbixSender::new(address, Duration::from_secs(5)),
        ZabbixMode::Discovery,
        "dellhw",
        "db01",
    );

    assert_eq!(push_once(&scheduler, &sink).await, EXIT_OK);

    let request = server.await.unwrap();
    let data = request["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["key"], "dellhw.discovery");

    let document: Value = serde_json::from_str(data[0]["value"].as_str().unwrap()).unwrap();
    assert_eq!(document, serde_json::json!({ "data": [{ "id": "0" }, { "id": "1" }] }));
}

#[tokio::test]
async fn test_push_collector_failure() {
    let source = mock_report().with_failure(&["chassis", "temps"], "Error! No temperature probes found");
    let scheduler = scheduler(source, "fans,temps");
    // Nothing listens here; the run must stop before connecting
    let sink = ZabbixSink::new(
        ZabbixSender::new("127.0.0.1:1", Duration::from_secs(1)),
        ZabbixMode::Update,
        "dellhw",
        "db01",
    );

    assert_eq!(push_once(&scheduler, &sink).await, EXIT_COLLECTOR);
}

#[tokio::test]
async fn test_push_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let scheduler = scheduler(mock_report(), "fans");
    let sink = ZabbixSink::new(
        ZabbixSender::new(address, Duration::from_secs(5)),
        ZabbixMode::Update,
        "dellhw",
        "db01",
    );

    assert_eq!(push_once(&scheduler, &sink).await, 4);
}

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{
            // Push mode for the agent's external check
            exporter: "zabbix",
            collect: {{ collectors: "chassis,storage_vdisk" }},
            zabbix: {{ server: "zbx.example.com", host: "db01", discovery: true }},
        }}"#
    )
    .unwrap();

    let config = ExporterConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.exporter, ExporterKind::Zabbix);
    assert_eq!(config.collect.enabled(), vec!["chassis", "storage_vdisk"]);
    assert_eq!(config.zabbix.address(), "zbx.example.com:10051");
    assert!(config.zabbix.discovery);
    config.validate().unwrap();
}

#[test]
fn test_overrides_apply_before_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ zabbix: {{ discovery: true, update: true }} }}"#).unwrap();

    let mut config = ExporterConfig::load_from_file(file.path()).unwrap();
    assert!(config.validate().is_err());

    // What `--update` does on the command line
    config.zabbix.use_update();
    config.validate().unwrap();
    assert!(!config.zabbix.discovery);
}

#[test]
fn test_load_missing_config_file() {
    let err = ExporterConfig::load_from_file("/nonexistent/dellhw.json5").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
