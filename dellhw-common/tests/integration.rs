//! Integration tests for the shared data model.

use dellhw_common::{LogFormat, LoggingConfig, MetricRecord, MetricValue, Tags, record_key};

#[test]
fn test_key_is_stable_across_tag_insertion_order() {
    let a = MetricRecord::new("storage.pdisk.status", 0, "Overall status of physical disks.")
        .with_tag("controller", "1")
        .with_tag("id", "0_0_3");
    let b = MetricRecord::new("storage.pdisk.status", 0, "Overall status of physical disks.")
        .with_tag("id", "0_0_3")
        .with_tag("controller", "1");

    assert_eq!(a.key, b.key);
    assert_eq!(a.key, "storage.pdisk.status[1,0_0_3]");
}

#[test]
fn test_with_tags_matches_record_key() {
    let mut tags = Tags::new();
    tags.insert("name".to_string(), "PS1_Current_1".to_string());

    let record = MetricRecord::new("chassis.power.amps", 0.6, "Current draw.").with_tags(tags.clone());
    assert_eq!(record.key, record_key("chassis.power.amps", &tags));
    assert_eq!(record.value.as_f64(), Some(0.6));
}

#[test]
fn test_record_json_skips_empty_tags() {
    let record = MetricRecord::new("chassis.memory.type", "DDR4", "Type of memory installed.");
    let json = serde_json::to_value(&record).unwrap();

    assert!(json.get("tags").is_none());
    assert_eq!(json["value"], "DDR4");

    let back: MetricRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back.value, MetricValue::Text("DDR4".to_string()));
}

#[test]
fn test_logging_defaults() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, "info");
    assert_eq!(config.format, LogFormat::Text);
}
