//! Energy accrual: integrating rated draw over On-time into kWh.

use crate::devices::Device;

use super::clock::MS_PER_HOUR;

/// Energy in kWh drawn by a `watt`-rated device over `elapsed_ms`.
///
/// Non-positive intervals yield zero, so settlement can never decrement
/// a device's cumulative energy.
///
/// # Examples
///
/// ```
/// use smarthome_sim::sim::energy::kwh_for;
///
/// assert!((kwh_for(1200.0, 3_600_000) - 1.2).abs() < 1e-12);
/// assert_eq!(kwh_for(1200.0, -5), 0.0);
/// ```
pub fn kwh_for(watt: f64, elapsed_ms: i64) -> f64 {
    if elapsed_ms <= 0 {
        return 0.0;
    }
    watt / 1000.0 * (elapsed_ms as f64 / MS_PER_HOUR as f64)
}

/// Accrues energy for every On device up to `now_ms` and returns the total
/// kWh added across the collection.
pub fn accrue_all(devices: &mut [Device], now_ms: i64) -> f64 {
    devices.iter_mut().map(|d| d.accrue(now_ms)).sum()
}
