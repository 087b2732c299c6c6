//! Wall-clock instants, clock sources, and the tick counter that bounds a run.

use chrono::{DateTime, Duration, Local, TimeZone, Timelike, Utc};

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: i64 = 60_000;
/// Milliseconds in one hour.
pub const MS_PER_HOUR: i64 = 3_600_000;

/// A single instant as seen by the engine.
///
/// Carries both the absolute epoch time (for energy and alert arithmetic)
/// and the local wall-clock hour/minute (for routine matching), so the
/// engine itself never consults a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    /// Milliseconds since the Unix epoch.
    pub epoch_ms: i64,
    /// Wall-clock hour (0-23).
    pub hour: u32,
    /// Wall-clock minute (0-59).
    pub minute: u32,
}

impl Moment {
    /// Builds a moment from any timezone-aware datetime; hour and minute are
    /// taken in that datetime's own timezone.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            epoch_ms: dt.timestamp_millis(),
            hour: dt.hour(),
            minute: dt.minute(),
        }
    }

    /// Index of the calendar minute containing this moment
    /// (`floor(epoch_ms / 60000)`).
    pub fn minute_index(&self) -> i64 {
        self.epoch_ms.div_euclid(MS_PER_MINUTE)
    }
}

/// Source of the current moment.
pub trait Clock {
    fn now(&self) -> Moment;
}

/// Reads the host's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Moment {
        Moment::from_datetime(&Local::now())
    }
}

/// A clock that only moves when told to. Wall-clock fields are UTC.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: DateTime<Utc>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { current: start }
    }

    /// Moves the clock forward (or backward, for negative durations).
    pub fn advance(&mut self, by: Duration) {
        self.current += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Moment {
        Moment::from_datetime(&self.current)
    }
}

/// Counts ticks, optionally up to a fixed total.
///
/// # Examples
///
/// ```
/// use smarthome_sim::sim::clock::Ticker;
///
/// let mut ticker = Ticker::bounded(3);
/// let mut ticks = Vec::new();
///
/// ticker.run(|n| ticks.push(n));
/// assert_eq!(ticks, vec![0, 1, 2]);
/// ```
pub struct Ticker {
    /// Number of ticks issued so far.
    current: u64,
    /// Total ticks to issue, or `None` to run forever.
    total: Option<u64>,
}

impl Ticker {
    /// Creates a ticker that stops after `total` ticks.
    pub fn bounded(total: u64) -> Self {
        Self {
            current: 0,
            total: Some(total),
        }
    }

    /// Creates a ticker that never runs out.
    pub fn unbounded() -> Self {
        Self {
            current: 0,
            total: None,
        }
    }

    /// Issues the next tick number.
    ///
    /// # Returns
    ///
    /// * `Some(n)` - The tick number (starting from 0)
    /// * `None` - If the ticker has issued all of its ticks
    pub fn tick(&mut self) -> Option<u64> {
        match self.total {
            Some(total) if self.current >= total => None,
            _ => {
                let n = self.current;
                self.current += 1;
                Some(n)
            }
        }
    }

    /// Calls `f` with each remaining tick number.
    pub fn run(&mut self, mut f: impl FnMut(u64)) {
        while let Some(n) = self.tick() {
            f(n);
        }
    }

    /// Number of ticks issued so far.
    pub fn issued(&self) -> u64 {
        self.current
    }
}
