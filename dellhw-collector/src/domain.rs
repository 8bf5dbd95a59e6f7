//! Per-domain parser table.
//!
//! Every hardware domain `omreport` reports on is described by one
//! [`DomainSpec`]: the arguments that produce its report, the shape of a data
//! row, how the instance tag is derived, and which fields carry the status,
//! unit readings and metadata. [`crate::parser::parse_row`] interprets the table.

/// A metric emitted by a domain: name and help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// Field-count rule a data row must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    Exact(usize),
    AtLeast(usize),
}

impl RowShape {
    /// Check whether a row with `len` fields has this shape.
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            RowShape::Exact(n) => len == n,
            RowShape::AtLeast(n) => len >= n,
        }
    }
}

/// How the instance tag of a row is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceRule {
    /// Storage id: `:` replaced by `_` (e.g. `0:0:1` -> `0_0_1`).
    StorageId { tag: &'static str, field: usize },
    /// Component name passed through identifier sanitization.
    Sanitized { tag: &'static str, field: usize },
}

impl InstanceRule {
    pub fn tag(&self) -> &'static str {
        match *self {
            InstanceRule::StorageId { tag, .. } | InstanceRule::Sanitized { tag, .. } => tag,
        }
    }

    pub fn field(&self) -> usize {
        match *self {
            InstanceRule::StorageId { field, .. } | InstanceRule::Sanitized { field, .. } => field,
        }
    }
}

/// A numeric reading carried with a unit suffix (e.g. `2400 RPM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub field: usize,
    pub suffix: &'static str,
    pub metric: MetricSpec,
}

/// Text metadata built from one or more cleaned fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoField {
    pub fields: &'static [usize],
    /// Minimum row length before the fields are looked at.
    pub min_fields: usize,
    pub metric: MetricSpec,
}

/// Follow-up report run once per accepted row (controller -> physical disks).
#[derive(Debug, Clone, Copy)]
pub struct NestedSpec {
    pub domain: &'static DomainSpec,
    /// Argument key, sent as `<arg>=<raw id>`.
    pub arg: &'static str,
    /// Tag carrying the owning instance id on the nested records.
    pub tag: &'static str,
}

/// Column layout of a regular status table.
#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    pub shape: RowShape,
    /// Value of the first field that marks a header row.
    pub header: Option<&'static str>,
    /// Require the first field to be an integer (one row per physical unit).
    pub numeric_leading: bool,
    pub instance: InstanceRule,
    pub status_field: usize,
    pub status: MetricSpec,
    pub readings: &'static [Reading],
    pub info: &'static [InfoField],
    pub nested: Option<NestedSpec>,
}

/// Row layout of a domain.
#[derive(Debug, Clone, Copy)]
pub enum Layout {
    Table(TableLayout),
    /// `chassis pwrmonitoring`: per-supply amperage rows and board power thresholds.
    PowerMonitoring,
}

/// One hardware domain: collector name, report arguments and row layout.
#[derive(Debug, Clone, Copy)]
pub struct DomainSpec {
    pub collector: &'static str,
    pub args: &'static [&'static str],
    pub layout: Layout,
}

impl DomainSpec {
    /// Report arguments as owned strings.
    pub fn args(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string()).collect()
    }
}

const fn metric(name: &'static str, description: &'static str) -> MetricSpec {
    MetricSpec { name, description }
}

pub const CHASSIS_STATUS: MetricSpec =
    metric("chassis.status", "Overall status of chassis components.");
pub const SYSTEM_STATUS: MetricSpec =
    metric("system.status", "Overall status of system components.");
pub const FAN_STATUS: MetricSpec =
    metric("chassis.fan.status", "Overall status of system fans.");
pub const FAN_READING: MetricSpec = metric("chassis.fan.reading", "System fan speed.");
pub const MEMORY_STATUS: MetricSpec =
    metric("chassis.memory.status", "System RAM DIMM status.");
pub const MEMORY_TYPE: MetricSpec =
    metric("chassis.memory.type", "System RAM DIMM type and size.");
pub const PROCESSOR_STATUS: MetricSpec =
    metric("chassis.processor.status", "Overall status of CPUs.");
pub const PROCESSOR_MODEL: MetricSpec =
    metric("chassis.processor.model", "CPU brand and version.");
pub const TEMP_STATUS: MetricSpec = metric(
    "chassis.temp.status",
    "Overall status of system temperature readings.",
);
pub const TEMP_READING: MetricSpec =
    metric("chassis.temp.reading", "System temperature readings.");
pub const VOLT_STATUS: MetricSpec = metric(
    "chassis.volt.status",
    "Overall status of power supply volt readings.",
);
pub const VOLT_READING: MetricSpec =
    metric("chassis.volt.reading", "Volts used per power supply.");
pub const PS_STATUS: MetricSpec = metric("ps.status", "Overall status of power supplies.");
pub const PS_INPUT_WATTS: MetricSpec =
    metric("ps.input_watts", "Rated input wattage of power supplies.");
pub const PS_OUTPUT_WATTS: MetricSpec =
    metric("ps.output_watts", "Rated output wattage of power supplies.");
pub const CURRENT_READING: MetricSpec =
    metric("chassis.current.reading", "Amps used per power supply.");
pub const POWER_READING: MetricSpec =
    metric("chassis.power.reading", "System board power usage.");
pub const POWER_WARN_LEVEL: MetricSpec = metric(
    "chassis.power.warn_level",
    "The warning level set on the device for system board power usage.",
);
pub const POWER_FAIL_LEVEL: MetricSpec = metric(
    "chassis.power.fail_level",
    "The failure level set on the device for system board power usage.",
);
pub const BATTERY_STATUS: MetricSpec = metric(
    "storage.battery.status",
    "Status of storage controller backup batteries.",
);
pub const CONTROLLER_STATUS: MetricSpec = metric(
    "storage.controller.status",
    "Overall status of storage controllers.",
);
pub const CONTROLLER_NAME: MetricSpec =
    metric("storage.controller.name", "Storage controller model name.");
pub const CONTROLLER_FIRMWARE: MetricSpec = metric(
    "storage.controller.firmware",
    "Storage controller firmware version.",
);
pub const CONTROLLER_DRIVER: MetricSpec =
    metric("storage.controller.driver", "Storage controller driver version.");
pub const ENCLOSURE_STATUS: MetricSpec = metric(
    "storage.enclosure.status",
    "Overall status of storage enclosures.",
);
pub const VDISK_STATUS: MetricSpec =
    metric("storage.vdisk.status", "Overall status of virtual disks.");
pub const PDISK_STATUS: MetricSpec =
    metric("storage.pdisk.status", "Overall status of physical disks.");
pub const PDISK_MEDIA: MetricSpec =
    metric("storage.pdisk.media", "Physical disk media type.");
pub const PDISK_CAPACITY: MetricSpec =
    metric("storage.pdisk.capacity", "Physical disk capacity.");
pub const PDISK_SERIAL: MetricSpec =
    metric("storage.pdisk.serial", "Physical disk serial number.");

/// First-field values of the board power threshold rows.
pub const BOARD_POWER_PROBES: &[&str] = &["System Board Pwr Consumption", "System Board System Level"];

/// Layout shared by the per-unit chassis tables (fans, temps, volts, processors).
const fn unit_table(
    status: MetricSpec,
    readings: &'static [Reading],
    info: &'static [InfoField],
) -> TableLayout {
    TableLayout {
        shape: RowShape::Exact(8),
        header: None,
        numeric_leading: true,
        instance: InstanceRule::Sanitized { tag: "name", field: 2 },
        status_field: 1,
        status,
        readings,
        info,
        nested: None,
    }
}

/// Layout shared by the storage tables keyed by an `ID` column.
const fn storage_table(status: MetricSpec) -> TableLayout {
    TableLayout {
        shape: RowShape::AtLeast(3),
        header: Some("ID"),
        numeric_leading: false,
        instance: InstanceRule::StorageId { tag: "id", field: 0 },
        status_field: 1,
        status,
        readings: &[],
        info: &[],
        nested: None,
    }
}

/// Layout of the `SEVERITY;COMPONENT` summary tables.
const fn summary_table(status: MetricSpec) -> TableLayout {
    TableLayout {
        shape: RowShape::Exact(2),
        header: Some("SEVERITY"),
        numeric_leading: false,
        instance: InstanceRule::Sanitized { tag: "component", field: 1 },
        status_field: 0,
        status,
        readings: &[],
        info: &[],
        nested: None,
    }
}

pub static CHASSIS: DomainSpec = DomainSpec {
    collector: "chassis",
    args: &["chassis"],
    layout: Layout::Table(summary_table(CHASSIS_STATUS)),
};

pub static SYSTEM: DomainSpec = DomainSpec {
    collector: "system",
    args: &["system"],
    layout: Layout::Table(summary_table(SYSTEM_STATUS)),
};

pub static FANS: DomainSpec = DomainSpec {
    collector: "fans",
    args: &["chassis", "fans"],
    layout: Layout::Table(unit_table(
        FAN_STATUS,
        &[Reading {
            field: 3,
            suffix: "RPM",
            metric: FAN_READING,
        }],
        &[],
    )),
};

pub static MEMORY: DomainSpec = DomainSpec {
    collector: "memory",
    args: &["chassis", "memory"],
    layout: Layout::Table(TableLayout {
        shape: RowShape::Exact(5),
        ..unit_table(
            MEMORY_STATUS,
            &[],
            &[InfoField {
                fields: &[3, 4],
                min_fields: 5,
                metric: MEMORY_TYPE,
            }],
        )
    }),
};

pub static PROCESSORS: DomainSpec = DomainSpec {
    collector: "processors",
    args: &["chassis", "processors"],
    layout: Layout::Table(unit_table(
        PROCESSOR_STATUS,
        &[],
        &[InfoField {
            fields: &[3, 4],
            min_fields: 5,
            metric: PROCESSOR_MODEL,
        }],
    )),
};

pub static TEMPS: DomainSpec = DomainSpec {
    collector: "temps",
    args: &["chassis", "temps"],
    layout: Layout::Table(unit_table(
        TEMP_STATUS,
        &[Reading {
            field: 3,
            suffix: "C",
            metric: TEMP_READING,
        }],
        &[],
    )),
};

pub static VOLTS: DomainSpec = DomainSpec {
    collector: "volts",
    args: &["chassis", "volts"],
    layout: Layout::Table(unit_table(
        VOLT_STATUS,
        &[Reading {
            field: 3,
            suffix: "V",
            metric: VOLT_READING,
        }],
        &[],
    )),
};

pub static POWER_SUPPLIES: DomainSpec = DomainSpec {
    collector: "ps",
    args: &["chassis", "pwrsupplies"],
    layout: Layout::Table(TableLayout {
        header: Some("Index"),
        readings: &[
            Reading {
                field: 4,
                suffix: "W",
                metric: PS_INPUT_WATTS,
            },
            Reading {
                field: 5,
                suffix: "W",
                metric: PS_OUTPUT_WATTS,
            },
        ],
        ..storage_table(PS_STATUS)
    }),
};

pub static POWER_MONITORING: DomainSpec = DomainSpec {
    collector: "ps_amps_sysboard_pwr",
    args: &["chassis", "pwrmonitoring"],
    layout: Layout::PowerMonitoring,
};

pub static STORAGE_BATTERY: DomainSpec = DomainSpec {
    collector: "storage_battery",
    args: &["storage", "battery"],
    layout: Layout::Table(storage_table(BATTERY_STATUS)),
};

pub static STORAGE_ENCLOSURE: DomainSpec = DomainSpec {
    collector: "storage_enclosure",
    args: &["storage", "enclosure"],
    layout: Layout::Table(storage_table(ENCLOSURE_STATUS)),
};

pub static STORAGE_VDISK: DomainSpec = DomainSpec {
    collector: "storage_vdisk",
    args: &["storage", "vdisk"],
    layout: Layout::Table(storage_table(VDISK_STATUS)),
};

/// Physical disks; only reachable through a controller row.
pub static STORAGE_PDISK: DomainSpec = DomainSpec {
    collector: "storage_pdisk",
    args: &["storage", "pdisk"],
    layout: Layout::Table(TableLayout {
        info: &[
            InfoField {
                fields: &[6],
                min_fields: 32,
                metric: PDISK_MEDIA,
            },
            InfoField {
                fields: &[19],
                min_fields: 32,
                metric: PDISK_CAPACITY,
            },
            InfoField {
                fields: &[25],
                min_fields: 32,
                metric: PDISK_SERIAL,
            },
        ],
        ..storage_table(PDISK_STATUS)
    }),
};

pub static STORAGE_CONTROLLER: DomainSpec = DomainSpec {
    collector: "storage_controller",
    args: &["storage", "controller"],
    layout: Layout::Table(TableLayout {
        info: &[
            InfoField {
                fields: &[2],
                min_fields: 8,
                metric: CONTROLLER_NAME,
            },
            InfoField {
                fields: &[5],
                min_fields: 8,
                metric: CONTROLLER_FIRMWARE,
            },
            InfoField {
                fields: &[7],
                min_fields: 8,
                metric: CONTROLLER_DRIVER,
            },
        ],
        nested: Some(NestedSpec {
            domain: &STORAGE_PDISK,
            arg: "controller",
            tag: "controller",
        }),
        ..storage_table(CONTROLLER_STATUS)
    }),
};

/// Every collector that can be enabled by name.
pub static DOMAINS: &[&DomainSpec] = &[
    &CHASSIS,
    &SYSTEM,
    &FANS,
    &MEMORY,
    &PROCESSORS,
    &TEMPS,
    &VOLTS,
    &POWER_SUPPLIES,
    &POWER_MONITORING,
    &STORAGE_BATTERY,
    &STORAGE_CONTROLLER,
    &STORAGE_ENCLOSURE,
    &STORAGE_VDISK,
];
