//! Prometheus exporter for 8311 PON sticks.
//!
//! Each `/metrics` request samples the stick over SSH by running a Lua
//! diagnostic script, decodes its three tab-delimited lines and republishes
//! the values as gauges.

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod parser;
pub mod projector;
pub mod remote;
pub mod scrape;
pub mod state;
pub mod units;
