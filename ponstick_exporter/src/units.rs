//! Unit conversions for derived gauges.

/// Celsius to Fahrenheit.
pub fn to_fahrenheit(celsius: f64) -> f64 {
    (celsius * 9.0 / 5.0) + 32.0
}

/// Linear milliwatts to dBm. Zero maps to `-inf` and negatives to `NaN`,
/// straight from `log10`.
pub fn to_dbm(milliwatts: f64) -> f64 {
    10.0 * milliwatts.log10()
}
