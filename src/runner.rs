//! Single-threaded driver: sleeps for the tick interval and applies a tick.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::io::persist::Persistence;
use crate::sim::clock::{Clock, Ticker};
use crate::sim::engine::TickReport;
use crate::store::Store;

/// Drives a [`Store`] from a [`Clock`] at the configured tick interval.
pub struct Runner<C: Clock, P: Persistence> {
    clock: C,
    store: Store<P>,
}

impl<C: Clock, P: Persistence> Runner<C, P> {
    pub fn new(clock: C, store: Store<P>) -> Self {
        Self { clock, store }
    }

    pub fn store(&self) -> &Store<P> {
        &self.store
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Applies one tick at the clock's current time without sleeping.
    pub fn step(&mut self) -> TickReport {
        let now = self.clock.now();
        self.store.apply_tick(&now)
    }

    /// Ticks until `ticker` runs out, sleeping one interval before each tick.
    ///
    /// With [`Ticker::unbounded`] this never returns.
    pub fn run(&mut self, ticker: &mut Ticker) -> TickReport {
        let interval = Duration::from_millis(self.store.config().tick_interval_ms);
        info!("ticking every {} ms", interval.as_millis());

        let mut total = TickReport::default();
        ticker.run(|n| {
            thread::sleep(interval);
            let report = self.step();
            if report.alerts_raised > 0 || report.routines_fired > 0 {
                debug!("tick {n}: {report:?}");
            }
            total.accrued_kwh += report.accrued_kwh;
            total.alerts_raised += report.alerts_raised;
            total.routines_fired += report.routines_fired;
        });
        info!("stopped after {} tick(s)", ticker.issued());
        total
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    use super::*;
    use crate::devices::Power;
    use crate::io::persist::InMemory;
    use crate::sim::clock::{ManualClock, SystemClock};
    use crate::sim::types::SimConfig;
    use crate::store::{NewDevice, NewRoutine};

    #[test]
    fn run_issues_bounded_ticks() {
        let store = Store::open(InMemory::new(), SimConfig::new(1, 24, 40));
        let mut runner = Runner::new(SystemClock, store);
        let mut ticker = Ticker::bounded(3);
        runner.run(&mut ticker);
        assert_eq!(ticker.issued(), 3);
        assert!(runner.store().state().last_routine_minute.is_some());
    }

    #[test]
    fn step_uses_clock_time() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 6, 59, 30).unwrap();
        let mut store = Store::open(InMemory::new(), SimConfig::default());
        let room = store.add_room("Hall").expect("room");
        let id = store
            .add_device(&NewDevice {
                room_id: room,
                device_type: "lamp".to_string(),
                ..NewDevice::default()
            })
            .expect("device");
        store
            .add_routine(&NewRoutine {
                name: "Wake".to_string(),
                time: "07:00".to_string(),
                target: "all".to_string(),
                to: "On".to_string(),
                ..NewRoutine::default()
            })
            .expect("routine");

        let mut runner = Runner::new(ManualClock::new(start), store);
        assert_eq!(runner.step().routines_fired, 0);
        runner.clock_mut().advance(ChronoDuration::seconds(30));
        assert_eq!(runner.step().routines_fired, 1);
        runner.clock_mut().advance(ChronoDuration::seconds(1));
        assert_eq!(runner.step().routines_fired, 0);

        let device = runner.store().state().device(&id).map(|d| d.power());
        assert_eq!(device, Some(Power::On));
    }
}
