//! Decoding of the diagnostic script output.
//!
//! The script prints three tab-delimited lines in a fixed order: system,
//! device (PON module) and memory. Fields are positional, so every position
//! the exporter reads is named here and nowhere else. Changing the script's
//! field order means changing this module.

use crate::error::ParseError;

pub const EXPECTED_LINES: usize = 3;
pub const SYSTEM_MIN_FIELDS: usize = 7;
pub const DEVICE_MIN_FIELDS: usize = 15;
pub const MEMORY_MIN_FIELDS: usize = 6;

const FIELD_SEP: char = '\t';
const LOAD_SEP: char = ' ';

/// Line 0: host identity plus the load-average triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemRecord<'a> {
    fields: Vec<&'a str>,
}

impl<'a> SystemRecord<'a> {
    const LOAD_AVERAGE: usize = 7;

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn hostname(&self) -> &'a str {
        self.fields[0]
    }

    /// Label values in `system_status` order: hostname, machine,
    /// architecture, kernel release, OpenWrt release, local time, uptime.
    pub fn identity(&self) -> [&'a str; 7] {
        [
            self.fields[0],
            self.fields[1],
            self.fields[2],
            self.fields[3],
            self.fields[4],
            self.fields[5],
            self.fields[6],
        ]
    }

    /// Raw load-average tokens (1m, 5m, 15m). `None` when the field is
    /// missing or splits into fewer than three tokens; extra tokens are
    /// ignored.
    pub fn load_averages(&self) -> Option<[&'a str; 3]> {
        let raw = self.fields.get(Self::LOAD_AVERAGE)?;
        let mut it = raw.split(LOAD_SEP);
        Some([it.next()?, it.next()?, it.next()?])
    }
}

/// Line 1: PON module telemetry and identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord<'a> {
    fields: Vec<&'a str>,
}

impl<'a> DeviceRecord<'a> {
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn ploam_status(&self) -> &'a str {
        self.fields[0]
    }

    pub fn cpu0_temp(&self) -> &'a str {
        self.fields[1]
    }

    pub fn cpu1_temp(&self) -> &'a str {
        self.fields[2]
    }

    pub fn optic_temp(&self) -> &'a str {
        self.fields[3]
    }

    pub fn voltage(&self) -> &'a str {
        self.fields[4]
    }

    pub fn tx_bias(&self) -> &'a str {
        self.fields[5]
    }

    pub fn tx_power(&self) -> &'a str {
        self.fields[6]
    }

    pub fn rx_power(&self) -> &'a str {
        self.fields[7]
    }

    pub fn eth_speed(&self) -> &'a str {
        self.fields[8]
    }

    /// Label values in `pon_stick_info` order: vendor name, part number,
    /// revision, PON mode, module type, active bank.
    pub fn module_identity(&self) -> [&'a str; 6] {
        [
            self.fields[9],
            self.fields[10],
            self.fields[11],
            self.fields[12],
            self.fields[13],
            self.fields[14],
        ]
    }
}

/// Line 2: memory counters in bytes, then used percent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRecord<'a> {
    fields: Vec<&'a str>,
}

impl<'a> MemoryRecord<'a> {
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn total(&self) -> &'a str {
        self.fields[0]
    }

    pub fn free(&self) -> &'a str {
        self.fields[1]
    }

    pub fn buffers(&self) -> &'a str {
        self.fields[2]
    }

    pub fn cached(&self) -> &'a str {
        self.fields[3]
    }

    pub fn used(&self) -> &'a str {
        self.fields[4]
    }

    pub fn used_percent(&self) -> &'a str {
        self.fields[5]
    }
}

/// One scrape worth of decoded records, borrowing from the raw output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecords<'a> {
    pub system: SystemRecord<'a>,
    pub device: DeviceRecord<'a>,
    pub memory: MemoryRecord<'a>,
}

/// Split script output into records and check their arity.
/// Field contents are not validated here.
pub fn parse_output(output: &str) -> Result<SampleRecords<'_>, ParseError> {
    let lines: Vec<&str> = output.trim_matches('\n').split('\n').collect();
    if lines.len() < EXPECTED_LINES {
        return Err(ParseError::MissingLines {
            expected: EXPECTED_LINES,
            got: lines.len(),
        });
    }

    let system = split_record(lines[0], "system", SYSTEM_MIN_FIELDS)?;
    let device = split_record(lines[1], "pon", DEVICE_MIN_FIELDS)?;
    let memory = split_record(lines[2], "memory", MEMORY_MIN_FIELDS)?;

    Ok(SampleRecords {
        system: SystemRecord { fields: system },
        device: DeviceRecord { fields: device },
        memory: MemoryRecord { fields: memory },
    })
}

fn split_record<'a>(
    line: &'a str,
    record: &'static str,
    min_fields: usize,
) -> Result<Vec<&'a str>, ParseError> {
    let fields: Vec<&str> = line
        .trim_end_matches([' ', '\r'])
        .split(FIELD_SEP)
        .collect();
    if fields.len() < min_fields {
        return Err(ParseError::ShortRecord {
            record,
            expected: min_fields,
            got: fields.len(),
        });
    }
    Ok(fields)
}
