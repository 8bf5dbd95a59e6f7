//! Row parsers driven by the [`crate::domain`] table.
//!
//! Parsing is pure: a row in, records out. Reports that depend on a parent
//! row (physical disks of a controller) are returned as [`NestedQuery`]
//! values for the scheduler to run.

use dellhw_common::{MetricRecord, Tags};
use tracing::{debug, trace, warn};

use crate::domain::{
    BOARD_POWER_PROBES, CURRENT_READING, DomainSpec, InstanceRule, Layout, MetricSpec,
    POWER_FAIL_LEVEL, POWER_READING, POWER_WARN_LEVEL, TableLayout,
};
use crate::normalize::{clean, extract_number_with_suffix, instance_id, sanitize_identifier, severity};

/// Tags inherited from a parent row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    pub tags: Tags,
}

impl ParseContext {
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A follow-up report requested by a parsed row.
#[derive(Debug, Clone)]
pub struct NestedQuery {
    pub domain: &'static DomainSpec,
    pub args: Vec<String>,
    pub context: ParseContext,
}

/// Output of parsing one row.
#[derive(Debug, Default)]
pub struct ParsedRow {
    pub records: Vec<MetricRecord>,
    pub nested: Vec<NestedQuery>,
}

impl ParsedRow {
    /// True when the row was not a data row.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.nested.is_empty()
    }
}

/// Parse one row of a domain's report.
///
/// Rows that are headers, summaries or of the wrong shape yield an empty
/// [`ParsedRow`].
pub fn parse_row(domain: &DomainSpec, ctx: &ParseContext, row: &[String]) -> ParsedRow {
    match &domain.layout {
        Layout::Table(layout) => parse_table_row(domain.collector, layout, ctx, row),
        Layout::PowerMonitoring => ParsedRow {
            records: parse_power_row(row),
            nested: Vec::new(),
        },
    }
}

fn parse_table_row(
    collector: &str,
    layout: &TableLayout,
    ctx: &ParseContext,
    row: &[String],
) -> ParsedRow {
    let mut out = ParsedRow::default();

    if !layout.shape.accepts(row.len()) {
        trace!(collector, fields = row.len(), "Row shape mismatch, skipping");
        return out;
    }
    let first = row[0].as_str();
    if layout.header == Some(first) {
        return out;
    }
    if layout.numeric_leading && first.parse::<i64>().is_err() {
        trace!(collector, first, "Non-numeric leading field, skipping");
        return out;
    }

    let raw_instance = row[layout.instance.field()].as_str();
    let instance = match layout.instance {
        InstanceRule::StorageId { .. } if raw_instance.is_empty() => {
            trace!(collector, "Empty storage id, skipping");
            return out;
        }
        InstanceRule::StorageId { .. } => instance_id(raw_instance),
        InstanceRule::Sanitized { .. } => match sanitize_identifier(raw_instance) {
            Ok(name) => name,
            Err(e) => {
                warn!(collector, error = %e, "Dropping row without usable identifier");
                return out;
            }
        },
    };

    let mut tags = ctx.tags.clone();
    tags.insert(layout.instance.tag().to_string(), instance.clone());

    out.records.push(record(
        &layout.status,
        severity(&row[layout.status_field]),
        &tags,
    ));

    for reading in layout.readings {
        let Some(field) = row.get(reading.field) else {
            continue;
        };
        if field.is_empty() {
            continue;
        }
        match extract_number_with_suffix(field, reading.suffix) {
            Ok(value) => out.records.push(record(&reading.metric, value, &tags)),
            Err(e) => debug!(
                collector,
                metric = reading.metric.name,
                instance = %instance,
                error = %e,
                "Reading not parsable, omitting"
            ),
        }
    }

    for info in layout.info {
        if row.len() < info.min_fields {
            continue;
        }
        let parts: Vec<&str> = info
            .fields
            .iter()
            .filter_map(|&i| row.get(i).map(String::as_str))
            .collect();
        let text = clean(&parts);
        if !text.is_empty() {
            out.records.push(record(&info.metric, text, &tags));
        }
    }

    if let Some(nested) = &layout.nested {
        let mut args = nested.domain.args();
        args.push(format!("{}={}", nested.arg, first));
        out.nested.push(NestedQuery {
            domain: nested.domain,
            args,
            context: ParseContext::default().with_tag(nested.tag, instance),
        });
    }

    out
}

/// Parse a `chassis pwrmonitoring` row.
///
/// Two row kinds carry data: `PS1 Current 1;0.6 A` (amperage per supply) and
/// the six-field board power row whose reading, warning and failure columns
/// each become an untagged metric.
fn parse_power_row(row: &[String]) -> Vec<MetricRecord> {
    let mut records = Vec::new();

    if row.len() == 2 && row[0].contains("Current") {
        let prefix: String = row[0]
            .split("Current")
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let id = match sanitize_identifier(&prefix) {
            Ok(id) => id,
            Err(e) => {
                warn!(name = %row[0], error = %e, "Dropping amperage row without usable identifier");
                return records;
            }
        };
        match extract_number_with_suffix(&row[1], "A") {
            Ok(value) => records.push(
                MetricRecord::new(CURRENT_READING.name, value, CURRENT_READING.description)
                    .with_tag("id", id),
            ),
            Err(e) => debug!(id = %id, error = %e, "Amperage not parsable, omitting"),
        }
    } else if row.len() == 6 && BOARD_POWER_PROBES.contains(&row[2].as_str()) {
        let thresholds = [
            (3, POWER_READING),
            (4, POWER_WARN_LEVEL),
            (5, POWER_FAIL_LEVEL),
        ];
        for (field, metric) in thresholds {
            match extract_number_with_suffix(&row[field], "W") {
                Ok(value) => {
                    records.push(MetricRecord::new(metric.name, value, metric.description))
                }
                Err(e) => debug!(metric = metric.name, error = %e, "Power level not parsable, omitting"),
            }
        }
    }

    records
}

fn record(
    metric: &MetricSpec,
    value: impl Into<dellhw_common::MetricValue>,
    tags: &Tags,
) -> MetricRecord {
    MetricRecord::new(metric.name, value, metric.description).with_tags(tags.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::*;
    use dellhw_common::MetricValue;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn parse(domain: &DomainSpec, fields: &[&str]) -> ParsedRow {
        parse_row(domain, &ParseContext::default(), &row(fields))
    }

    fn find<'a>(records: &'a [MetricRecord], name: &str) -> &'a MetricRecord {
        records
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("no record named {}", name))
    }

    #[test]
    fn test_fan_row() {
        let out = parse(&FANS, &["1", "Ok", "FAN 1 RPM", "2400 RPM", "", "", "", ""]);

        assert_eq!(out.records.len(), 2);
        let status = find(&out.records, "chassis.fan.status");
        assert_eq!(status.value, MetricValue::Number(0.0));
        assert_eq!(status.tags.get("name").map(String::as_str), Some("FAN_1_RPM"));
        assert_eq!(status.key, "chassis.fan.status[FAN_1_RPM]");

        let reading = find(&out.records, "chassis.fan.reading");
        assert_eq!(reading.value, MetricValue::Number(2400.0));
        assert_eq!(reading.tags, status.tags);
    }

    #[test]
    fn test_fan_unreadable_speed_keeps_status() {
        let out = parse(&FANS, &["0", "Critical", "FAN 2 RPM", "[N/A]", "", "", "", ""]);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].name, "chassis.fan.status");
        assert_eq!(out.records[0].value, MetricValue::Number(1.0));
    }

    #[test]
    fn test_unit_tables_skip_non_data_rows() {
        for domain in [&FANS, &TEMPS, &VOLTS, &PROCESSORS] {
            // Header row
            assert!(parse(domain, &["Index", "Status", "Probe Name", "Reading", "", "", "", ""]).is_empty());
            // Wrong field count
            assert!(parse(domain, &["1", "Ok", "FAN 1"]).is_empty());
            assert!(parse(domain, &[]).is_empty());
        }
        assert!(parse(&MEMORY, &["Index", "Status", "Connector Name", "Type", "Size"]).is_empty());
    }

    #[test]
    fn test_temp_and_volt_readings() {
        let temps = parse(&TEMPS, &["0", "Ok", "System Board Inlet Temp", "21.0 C", "", "", "", ""]);
        assert_eq!(
            find(&temps.records, "chassis.temp.reading").value,
            MetricValue::Number(21.0)
        );
        assert_eq!(temps.records[0].tags["name"], "System_Board_Inlet_Temp");

        let volts = parse(&VOLTS, &["1", "Non-Critical", "PS1 Voltage 1", "232.000 V", "", "", "", ""]);
        assert_eq!(find(&volts.records, "chassis.volt.status").value, MetricValue::Number(0.0));
        assert_eq!(
            find(&volts.records, "chassis.volt.reading").value,
            MetricValue::Number(232.0)
        );
    }

    #[test]
    fn test_memory_and_processor_info() {
        let memory = parse(&MEMORY, &["1", "Ok", "DIMM.Socket.A1", "DDR4  Synchronous", "16384 MB"]);
        assert_eq!(memory.records.len(), 2);
        assert_eq!(
            find(&memory.records, "chassis.memory.type").value,
            MetricValue::Text("DDR4 Synchronous 16384 MB".to_string())
        );

        let cpu = parse(
            &PROCESSORS,
            &["0", "Ok", "CPU1", "Intel(R) Xeon(R)", "E5-2620 v4", "Present", "", ""],
        );
        assert_eq!(
            find(&cpu.records, "chassis.processor.model").value,
            MetricValue::Text("Intel(R) Xeon(R) E5-2620 v4".to_string())
        );
    }

    #[test]
    fn test_summary_tables() {
        let out = parse(&CHASSIS, &["Ok", "Power Supplies"]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].tags["component"], "Power_Supplies");
        assert_eq!(out.records[0].value, MetricValue::Number(0.0));

        let out = parse(&SYSTEM, &["Critical", "Main System Chassis"]);
        assert_eq!(out.records[0].value, MetricValue::Number(1.0));

        assert!(parse(&CHASSIS, &["SEVERITY", "COMPONENT"]).is_empty());
        assert!(parse(&SYSTEM, &["Ok", "Fans", "extra"]).is_empty());
    }

    #[test]
    fn test_summary_row_without_identifier_is_dropped() {
        assert!(parse(&CHASSIS, &["Ok", "()"]).is_empty());
    }

    #[test]
    fn test_storage_tables() {
        for domain in [&STORAGE_BATTERY, &STORAGE_ENCLOSURE, &STORAGE_VDISK] {
            let out = parse(domain, &["0:1", "Ok", "blah"]);
            assert_eq!(out.records.len(), 1, "{}", domain.collector);
            assert_eq!(out.records[0].tags["id"], "0_1");
            assert_eq!(out.records[0].value, MetricValue::Number(0.0));

            assert!(parse(domain, &["ID", "Status", "Name"]).is_empty());
            assert!(parse(domain, &["0:1", "Ok"]).is_empty());
        }
    }

    #[test]
    fn test_power_supply_wattage() {
        let out = parse(&POWER_SUPPLIES, &["0:1", "Ok", "blah", "bloh", "42 W", "4242 W"]);

        assert_eq!(out.records.len(), 3);
        assert_eq!(find(&out.records, "ps.status").key, "ps.status[0_1]");
        assert_eq!(find(&out.records, "ps.input_watts").value, MetricValue::Number(42.0));
        assert_eq!(
            find(&out.records, "ps.output_watts").value,
            MetricValue::Number(4242.0)
        );

        assert!(parse(&POWER_SUPPLIES, &["Index", "Status", "Location"]).is_empty());
        // Short rows still report status
        assert_eq!(parse(&POWER_SUPPLIES, &["1", "Ok", "PS2"]).records.len(), 1);
    }

    #[test]
    fn test_controller_row_requests_disks() {
        let out = parse(
            &STORAGE_CONTROLLER,
            &["0:1", "Ok", "PERC H700", "0", "Ready", "21.3.1-0032", "Not Applicable", "06.904.06.00-rh1"],
        );

        let status = find(&out.records, "storage.controller.status");
        assert_eq!(status.tags["id"], "0_1");
        assert_eq!(status.value, MetricValue::Number(0.0));
        assert_eq!(
            find(&out.records, "storage.controller.firmware").value,
            MetricValue::Text("21.3.1-0032".to_string())
        );

        assert_eq!(out.nested.len(), 1);
        let nested = &out.nested[0];
        assert_eq!(nested.domain.collector, "storage_pdisk");
        assert_eq!(nested.args, vec!["storage", "pdisk", "controller=0:1"]);
        assert_eq!(nested.context.tags["controller"], "0_1");
    }

    #[test]
    fn test_controller_short_row_has_no_info() {
        let out = parse(&STORAGE_CONTROLLER, &["1", "Ok", "PERC H330"]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.nested.len(), 1);
        assert!(parse(&STORAGE_CONTROLLER, &["ID", "Status", "Name"]).is_empty());
    }

    #[test]
    fn test_pdisk_row_carries_controller() {
        let ctx = ParseContext::default().with_tag("controller", "0");
        let out = parse_row(&STORAGE_PDISK, &ctx, &row(&["0:1:4", "Non-Critical", "Physical Disk 0:1:4"]));

        assert_eq!(out.records.len(), 1);
        let disk = &out.records[0];
        assert_eq!(disk.tags["id"], "0_1_4");
        assert_eq!(disk.tags["controller"], "0");
        assert_eq!(disk.key, "storage.pdisk.status[0,0_1_4]");
        assert!(out.nested.is_empty());
    }

    #[test]
    fn test_current_rows() {
        let out = parse(&POWER_MONITORING, &["PS1 Current 1", "0.6 A"]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].name, "chassis.current.reading");
        assert_eq!(out.records[0].tags["id"], "PS1");
        assert_eq!(out.records[0].value, MetricValue::Number(0.6));

        assert!(parse(&POWER_MONITORING, &["PS1 Current 1", "[N/A]"]).is_empty());
        assert!(parse(&POWER_MONITORING, &["Current", "0.6 A"]).is_empty());
    }

    #[test]
    fn test_current_row_id_is_sanitized() {
        let out = parse(&POWER_MONITORING, &["PS[1],2 Current 1", "0.6 A"]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].tags["id"], "PS_1_2");
        assert_eq!(out.records[0].key, "chassis.current.reading[PS_1_2]");

        assert!(parse(&POWER_MONITORING, &["(*) Current 1", "0.6 A"]).is_empty());
    }

    #[test]
    fn test_board_power_thresholds() {
        let out = parse(
            &POWER_MONITORING,
            &["1", "Ok", "System Board Pwr Consumption", "98 W", "896 W", "980 W"],
        );

        assert_eq!(out.records.len(), 3);
        for record in &out.records {
            assert!(record.tags.is_empty());
            assert_eq!(record.key, record.name);
        }
        assert_eq!(find(&out.records, "chassis.power.reading").value, MetricValue::Number(98.0));
        assert_eq!(
            find(&out.records, "chassis.power.warn_level").value,
            MetricValue::Number(896.0)
        );
        assert_eq!(
            find(&out.records, "chassis.power.fail_level").value,
            MetricValue::Number(980.0)
        );
    }

    #[test]
    fn test_power_monitoring_ignores_other_rows() {
        assert!(parse(&POWER_MONITORING, &["Index", "Status", "Probe Name", "Reading", "Warning Threshold", "Failure Threshold"]).is_empty());
        assert!(parse(&POWER_MONITORING, &["Energy Consumption", "1014.9 KWh"]).is_empty());
    }
}
