//! The tick: one evaluation step of the home simulation.

use log::debug;

use super::alerts;
use super::clock::Moment;
use super::energy;
use super::schedule;
use super::types::{HomeState, SimConfig};

/// Summary of what one tick changed, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Total kWh accrued across all devices.
    pub accrued_kwh: f64,
    /// Alerts raised.
    pub alerts_raised: usize,
    /// Routines fired.
    pub routines_fired: usize,
}

/// Advances `state` to `now` and returns the new aggregate.
///
/// The input is never modified. Within the tick, energy accrual for all
/// devices runs first, then alert detection, then routine matching; the
/// combined result is returned as a single new aggregate.
pub fn tick(state: &HomeState, now: &Moment, config: &SimConfig) -> HomeState {
    tick_with_report(state, now, config).0
}

/// Like [`tick`], also reporting what changed.
pub fn tick_with_report(
    state: &HomeState,
    now: &Moment,
    config: &SimConfig,
) -> (HomeState, TickReport) {
    let mut next = state.clone();

    // 1. Energy
    let accrued_kwh = energy::accrue_all(&mut next.devices, now.epoch_ms);

    // 2. Alerts
    let raised = alerts::detect(&mut next.devices, now.epoch_ms, config.alert_threshold_ms);
    let alerts_raised = raised.len();
    next.alerts.extend(raised);

    // 3. Routines
    let routines_fired = schedule::run_due(&mut next, now).len();

    if alerts_raised > 0 || routines_fired > 0 {
        debug!(
            "tick at {}: {alerts_raised} alert(s), {routines_fired} routine(s)",
            now.epoch_ms
        );
    }

    (
        next,
        TickReport {
            accrued_kwh,
            alerts_raised,
            routines_fired,
        },
    )
}
