//! Prometheus instruments exposed by the exporter.
//!
//! The set is fixed: everything is created and registered once at startup
//! and only mutated afterwards. Names and labels are the exporter's public
//! contract with dashboards, so keep them stable.

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

const SYSTEM_STATUS_LABELS: [&str; 7] = [
    "hostname",
    "machine",
    "architecture",
    "kernel_release",
    "openwrt_release",
    "local_time",
    "uptime_str",
];

const STICK_INFO_LABELS: [&str; 6] = [
    "vendor_name",
    "vendor_pn",
    "vendor_rev",
    "pon_mode",
    "module_type",
    "active_bank",
];

// Label value spelling predates this exporter; dashboards match on it.
const FAHRENHEIT_UNIT: &str = "farhenheit";

/// A raw reading and the value derived from it (°C/°F, mW/dBm).
/// Both halves are always written together.
#[derive(Clone)]
pub struct GaugePair {
    pub raw: Gauge,
    pub derived: Gauge,
}

impl GaugePair {
    fn reset(&self) {
        self.raw.set(0.0);
        self.derived.set(0.0);
    }
}

#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Registry,

    // system
    pub system_status: GaugeVec,
    pub system_load_1m: Gauge,
    pub system_load_5m: Gauge,
    pub system_load_15m: Gauge,

    // PON stick
    pub pon_ploam_status: Gauge,
    pub pon_cpu0_temp: GaugePair,
    pub pon_cpu1_temp: GaugePair,
    pub pon_optic_temp: GaugePair,
    pub pon_voltage: Gauge,
    pub pon_tx_bias: Gauge,
    pub pon_tx_power: GaugePair,
    pub pon_rx_power: GaugePair,
    pub pon_eth_speed: Gauge,
    pub pon_stick_info: GaugeVec,

    // memory
    pub memory_total: Gauge,
    pub memory_free: Gauge,
    pub memory_buffers: Gauge,
    pub memory_cached: Gauge,
    pub memory_used_bytes: Gauge,
    pub memory_used_percent: Gauge,
}

impl ExporterMetrics {
    /// Creates every instrument and registers it with a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let system_status = GaugeVec::new(
            Opts::new("system_status", "System status"),
            &SYSTEM_STATUS_LABELS,
        )?;
        registry.register(Box::new(system_status.clone()))?;

        let pon_stick_info = GaugeVec::new(
            Opts::new("pon_stick_info", "PON stick information"),
            &STICK_INFO_LABELS,
        )?;
        registry.register(Box::new(pon_stick_info.clone()))?;

        let load = |duration: &str| {
            labeled(&registry, "system_load_average", "System load average", "duration", duration)
        };
        let unit = |name: &str, help: &str, u: &str| labeled(&registry, name, help, "unit", u);
        let temp = |name: &str, help: &str| -> prometheus::Result<GaugePair> {
            Ok(GaugePair {
                raw: unit(name, help, "celsius")?,
                derived: unit(name, help, FAHRENHEIT_UNIT)?,
            })
        };
        let power = |name: &str, help: &str| -> prometheus::Result<GaugePair> {
            Ok(GaugePair {
                raw: unit(name, help, "mW")?,
                derived: unit(name, help, "dBm")?,
            })
        };

        let pon_ploam_status = Gauge::new("pon_ploam_status", "PLOAM status (Code)")?;
        registry.register(Box::new(pon_ploam_status.clone()))?;

        Ok(Self {
            system_load_1m: load("1m")?,
            system_load_5m: load("5m")?,
            system_load_15m: load("15m")?,
            pon_cpu0_temp: temp("pon_cpu0_temp", "CPU0 temperature")?,
            pon_cpu1_temp: temp("pon_cpu1_temp", "CPU1 temperature")?,
            pon_optic_temp: temp("pon_optic_temp", "Optic temperature")?,
            pon_voltage: unit("pon_voltage", "Voltage", "volts")?,
            pon_tx_bias: unit("pon_tx_bias", "TX Bias", "mA")?,
            pon_tx_power: power("pon_tx_power", "TX Power")?,
            pon_rx_power: power("pon_rx_power", "RX Power")?,
            pon_eth_speed: unit("pon_eth_speed", "Ethernet speed", "Mbps")?,
            memory_total: unit("memory_total", "Total memory", "bytes")?,
            memory_free: unit("memory_free", "Free memory", "bytes")?,
            memory_buffers: unit("memory_buffers", "Memory buffers", "bytes")?,
            memory_cached: unit("memory_cached", "Memory cached", "bytes")?,
            memory_used_bytes: unit("memory_used", "Used memory", "bytes")?,
            memory_used_percent: unit("memory_used", "Used memory", "percent")?,
            pon_ploam_status,
            system_status,
            pon_stick_info,
            registry,
        })
    }

    /// Zero every scalar gauge and drop every label set, so a failed sample
    /// never leaves identity series from an earlier device state behind.
    pub fn reset(&self) {
        self.system_status.reset();
        self.system_load_1m.set(0.0);
        self.system_load_5m.set(0.0);
        self.system_load_15m.set(0.0);

        self.pon_stick_info.reset();
        self.pon_ploam_status.set(0.0);
        self.pon_cpu0_temp.reset();
        self.pon_cpu1_temp.reset();
        self.pon_optic_temp.reset();
        self.pon_voltage.set(0.0);
        self.pon_tx_bias.set(0.0);
        self.pon_tx_power.reset();
        self.pon_rx_power.reset();
        self.pon_eth_speed.set(0.0);

        self.memory_total.set(0.0);
        self.memory_free.set(0.0);
        self.memory_buffers.set(0.0);
        self.memory_cached.set(0.0);
        self.memory_used_bytes.set(0.0);
        self.memory_used_percent.set(0.0);
    }

    /// Render the registry in the text exposition format.
    /// Returns the content type alongside the body.
    pub fn encode(&self) -> prometheus::Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok((encoder.format_type().to_string(), buf))
    }
}

fn labeled(
    registry: &Registry,
    name: &str,
    help: &str,
    label: &str,
    value: &str,
) -> prometheus::Result<Gauge> {
    let gauge = Gauge::with_opts(Opts::new(name, help).const_label(label, value))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}
