//! Projection of decoded records onto the exporter's gauges.
//!
//! Numeric parse failures are field-local: the gauge keeps its reset value,
//! a warning is logged and the remaining fields are still written.

use prometheus::Gauge;
use tracing::warn;

use crate::metrics::{ExporterMetrics, GaugePair};
use crate::parser::{DeviceRecord, MemoryRecord, SampleRecords, SystemRecord};
use crate::units::{to_dbm, to_fahrenheit};

/// Writes all three records. Returns how many fields could not be used.
pub fn project(records: &SampleRecords<'_>, metrics: &ExporterMetrics) -> usize {
    project_system(&records.system, metrics)
        + project_device(&records.device, metrics)
        + project_memory(&records.memory, metrics)
}

pub fn project_system(rec: &SystemRecord<'_>, m: &ExporterMetrics) -> usize {
    m.system_status.with_label_values(&rec.identity()).set(1.0);

    let Some([one, five, fifteen]) = rec.load_averages() else {
        warn!(host = rec.hostname(), "malformed load average field, skipping load gauges");
        return 1;
    };
    failures([
        set_value("load_average_1m", one, &m.system_load_1m),
        set_value("load_average_5m", five, &m.system_load_5m),
        set_value("load_average_15m", fifteen, &m.system_load_15m),
    ])
}

pub fn project_device(rec: &DeviceRecord<'_>, m: &ExporterMetrics) -> usize {
    let failed = failures([
        set_value("ploam_status", rec.ploam_status(), &m.pon_ploam_status),
        set_pair("cpu0_temp", rec.cpu0_temp(), &m.pon_cpu0_temp, to_fahrenheit),
        set_pair("cpu1_temp", rec.cpu1_temp(), &m.pon_cpu1_temp, to_fahrenheit),
        set_pair("optic_temp", rec.optic_temp(), &m.pon_optic_temp, to_fahrenheit),
        set_value("voltage", rec.voltage(), &m.pon_voltage),
        set_value("tx_bias", rec.tx_bias(), &m.pon_tx_bias),
        set_pair("tx_power", rec.tx_power(), &m.pon_tx_power, to_dbm),
        set_pair("rx_power", rec.rx_power(), &m.pon_rx_power, to_dbm),
        set_value("eth_speed", rec.eth_speed(), &m.pon_eth_speed),
    ]);
    m.pon_stick_info
        .with_label_values(&rec.module_identity())
        .set(1.0);
    failed
}

pub fn project_memory(rec: &MemoryRecord<'_>, m: &ExporterMetrics) -> usize {
    failures([
        set_value("memory_total", rec.total(), &m.memory_total),
        set_value("memory_free", rec.free(), &m.memory_free),
        set_value("memory_buffers", rec.buffers(), &m.memory_buffers),
        set_value("memory_cached", rec.cached(), &m.memory_cached),
        set_value("memory_used", rec.used(), &m.memory_used_bytes),
        set_value("memory_used_percent", rec.used_percent(), &m.memory_used_percent),
    ])
}

fn parse_field(field: &'static str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(field, value = raw, "failed to parse {field}: {e}");
            None
        }
    }
}

fn set_value(field: &'static str, raw: &str, gauge: &Gauge) -> bool {
    match parse_field(field, raw) {
        Some(v) => {
            gauge.set(v);
            true
        }
        None => false,
    }
}

// Both halves come from one parse; neither is touched if it fails.
fn set_pair(field: &'static str, raw: &str, pair: &GaugePair, convert: fn(f64) -> f64) -> bool {
    match parse_field(field, raw) {
        Some(v) => {
            pair.raw.set(v);
            pair.derived.set(convert(v));
            true
        }
        None => false,
    }
}

fn failures<const N: usize>(results: [bool; N]) -> usize {
    results.iter().filter(|ok| !**ok).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_output;

    const SAMPLE: &str = "hostA\tmach1\tarch1\tkrel1\torel1\t12:00:00\t5d\t0.1 0.2 0.3\n\
        0\t45.0\t46.0\t30.0\t3.3\t10\t1.0\t0.5\t1000\tVendorX\tPN1\tRevA\tGPON\tStick\tBankA\n\
        100000\t50000\t2000\t3000\t50000\t50";

    #[test]
    fn projects_every_field() {
        let m = ExporterMetrics::new().unwrap();
        let rec = parse_output(SAMPLE).unwrap();
        assert_eq!(project(&rec, &m), 0);

        assert_eq!(m.system_load_1m.get(), 0.1);
        assert_eq!(m.system_load_5m.get(), 0.2);
        assert_eq!(m.system_load_15m.get(), 0.3);
        assert_eq!(
            m.system_status
                .with_label_values(&["hostA", "mach1", "arch1", "krel1", "orel1", "12:00:00", "5d"])
                .get(),
            1.0
        );

        assert_eq!(m.pon_ploam_status.get(), 0.0);
        assert_eq!(m.pon_cpu0_temp.raw.get(), 45.0);
        assert_eq!(m.pon_cpu0_temp.derived.get(), 113.0);
        assert_eq!(m.pon_cpu1_temp.raw.get(), 46.0);
        assert_eq!(m.pon_optic_temp.derived.get(), 86.0);
        assert_eq!(m.pon_voltage.get(), 3.3);
        assert_eq!(m.pon_tx_bias.get(), 10.0);
        assert_eq!(m.pon_tx_power.raw.get(), 1.0);
        assert_eq!(m.pon_tx_power.derived.get(), 0.0);
        assert_eq!(m.pon_rx_power.raw.get(), 0.5);
        assert_eq!(m.pon_rx_power.derived.get(), 10.0 * 0.5f64.log10());
        assert_eq!(m.pon_eth_speed.get(), 1000.0);
        assert_eq!(
            m.pon_stick_info
                .with_label_values(&["VendorX", "PN1", "RevA", "GPON", "Stick", "BankA"])
                .get(),
            1.0
        );

        assert_eq!(m.memory_total.get(), 100000.0);
        assert_eq!(m.memory_free.get(), 50000.0);
        assert_eq!(m.memory_buffers.get(), 2000.0);
        assert_eq!(m.memory_cached.get(), 3000.0);
        assert_eq!(m.memory_used_bytes.get(), 50000.0);
        assert_eq!(m.memory_used_percent.get(), 50.0);
    }

    #[test]
    fn bad_field_only_skips_itself() {
        let m = ExporterMetrics::new().unwrap();
        let out = SAMPLE.replacen("\n0\t45.0", "\nN/A\t45.0", 1);
        let rec = parse_output(&out).unwrap();
        m.pon_ploam_status.set(7.0);
        m.reset();

        assert_eq!(project(&rec, &m), 1);
        assert_eq!(m.pon_ploam_status.get(), 0.0);
        assert_eq!(m.pon_cpu0_temp.raw.get(), 45.0);
        assert_eq!(m.pon_eth_speed.get(), 1000.0);
        assert_eq!(m.memory_used_percent.get(), 50.0);
    }

    #[test]
    fn bad_pair_leaves_both_halves() {
        let m = ExporterMetrics::new().unwrap();
        let out = SAMPLE.replacen("\t1.0\t0.5\t", "\tN/A\t0.5\t", 1);
        let rec = parse_output(&out).unwrap();

        assert_eq!(project_device(&rec.device, &m), 1);
        assert_eq!(m.pon_tx_power.raw.get(), 0.0);
        assert_eq!(m.pon_tx_power.derived.get(), 0.0);
        assert_eq!(m.pon_rx_power.raw.get(), 0.5);
    }

    #[test]
    fn zero_power_propagates_negative_infinity() {
        let m = ExporterMetrics::new().unwrap();
        let out = SAMPLE.replacen("\t1.0\t0.5\t", "\t0\t0.5\t", 1);
        let rec = parse_output(&out).unwrap();

        project_device(&rec.device, &m);
        assert_eq!(m.pon_tx_power.raw.get(), 0.0);
        assert_eq!(m.pon_tx_power.derived.get(), f64::NEG_INFINITY);
    }

    #[test]
    fn malformed_load_average_keeps_identity() {
        let m = ExporterMetrics::new().unwrap();
        let out = SAMPLE.replacen("0.1 0.2 0.3", "0.1", 1);
        let rec = parse_output(&out).unwrap();

        assert_eq!(project_system(&rec.system, &m), 1);
        assert_eq!(m.system_load_1m.get(), 0.0);
        assert_eq!(
            m.system_status
                .with_label_values(&["hostA", "mach1", "arch1", "krel1", "orel1", "12:00:00", "5d"])
                .get(),
            1.0
        );
    }
}
