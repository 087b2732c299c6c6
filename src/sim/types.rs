//! Core simulation types: runtime configuration, rooms, routines, and the
//! state aggregate the tick and the store operate on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::devices::{Device, DeviceType, Power};
use crate::error::ValidationError;
use crate::id::{DeviceId, RoomId, RoutineId};
use crate::io::lenient::{or_default, skip_invalid};

use super::clock::MS_PER_HOUR;
use super::event::{Alert, LogEntry};

/// Runtime parameters of the engine and its driver.
///
/// # Examples
///
/// ```
/// use smarthome_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(1000, 24, 40);
/// assert_eq!(cfg.alert_threshold_ms, 86_400_000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Interval between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// A device On for longer than this raises one alert per episode.
    pub alert_threshold_ms: i64,
    /// Number of most recent log entries shown to readers.
    pub log_display_limit: usize,
}

impl SimConfig {
    /// Creates a new runtime configuration.
    ///
    /// # Panics
    ///
    /// Panics if `tick_interval_ms` or `alert_threshold_hours` is zero.
    pub fn new(tick_interval_ms: u64, alert_threshold_hours: u32, log_display_limit: usize) -> Self {
        assert!(tick_interval_ms > 0, "tick_interval_ms must be > 0");
        assert!(alert_threshold_hours > 0, "alert_threshold_hours must be > 0");
        Self {
            tick_interval_ms,
            alert_threshold_ms: i64::from(alert_threshold_hours) * MS_PER_HOUR,
            log_display_limit,
        }
    }

    /// Alert threshold in whole hours, for messages.
    pub fn alert_threshold_hours(&self) -> i64 {
        self.alert_threshold_ms / MS_PER_HOUR
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(1000, 24, 40)
    }
}

/// A named room. Devices reference rooms by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
}

/// Wall-clock time of day at which a routine fires, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutineTime {
    pub hour: u8,
    pub minute: u8,
}

impl RoutineTime {
    /// Whether this time equals the given wall-clock hour and minute.
    pub fn matches(&self, hour: u32, minute: u32) -> bool {
        u32::from(self.hour) == hour && u32::from(self.minute) == minute
    }
}

impl FromStr for RoutineTime {
    type Err = ValidationError;

    /// Accepts exactly two digits, a colon, and two digits, with the hour
    /// below 24 and the minute below 60.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidRoutineTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let two_digits = |p: &str| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(h) || !two_digits(m) {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        if hour > 23 || minute > 59 {
            return Err(invalid());
        }
        Ok(Self { hour, minute })
    }
}

impl TryFrom<String> for RoutineTime {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RoutineTime> for String {
    fn from(t: RoutineTime) -> Self {
        t.to_string()
    }
}

impl fmt::Display for RoutineTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Selector class of a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    All,
    Room,
    Type,
}

impl TargetKind {
    /// Lenient parse: anything other than `room` or `type` means `all`.
    pub fn from_label(s: &str) -> Self {
        match s {
            "room" => Self::Room,
            "type" => Self::Type,
            _ => Self::All,
        }
    }
}

/// A daily time-triggered bulk power change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: RoutineId,
    pub name: String,
    pub time: RoutineTime,
    pub target: TargetKind,
    /// Room id or device type name; `None` when the target kind is `all` or
    /// the reference could not be resolved when the routine was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<String>,
    pub to: Power,
}

impl Routine {
    /// Builds a routine, resolving `target_value` against existing rooms and
    /// device types. Unresolvable references are dropped, which leaves the
    /// routine applying to every device.
    ///
    /// # Errors
    ///
    /// `EmptyName` for a blank name, `InvalidRoutineTime` for a malformed time.
    pub fn new(
        rooms: &[Room],
        name: &str,
        time: &str,
        target: TargetKind,
        target_value: Option<&str>,
        to: Power,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName("routine"));
        }
        let time: RoutineTime = time.parse()?;

        let target_value = match target {
            TargetKind::All => None,
            TargetKind::Room => target_value
                .filter(|v| rooms.iter().any(|r| r.id.as_str() == *v))
                .map(str::to_string),
            TargetKind::Type => target_value
                .and_then(|v| v.parse::<DeviceType>().ok())
                .map(|t| t.as_str().to_string()),
        };

        Ok(Self {
            id: RoutineId::generate(),
            name: name.to_string(),
            time,
            target,
            target_value,
            to,
        })
    }

    /// Whether `device` is in this routine's target set.
    pub fn selects(&self, device: &Device) -> bool {
        match (self.target, self.target_value.as_deref()) {
            (TargetKind::Room, Some(room)) => device.room_id.as_str() == room,
            (TargetKind::Type, Some(kind)) => device.device_type().as_str() == kind,
            _ => true,
        }
    }
}

/// The whole mutable simulation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HomeState {
    #[serde(deserialize_with = "skip_invalid")]
    pub rooms: Vec<Room>,
    #[serde(deserialize_with = "skip_invalid")]
    pub devices: Vec<Device>,
    #[serde(deserialize_with = "skip_invalid")]
    pub routines: Vec<Routine>,
    #[serde(deserialize_with = "skip_invalid")]
    pub logs: Vec<LogEntry>,
    #[serde(deserialize_with = "skip_invalid")]
    pub alerts: Vec<Alert>,
    /// Last calendar minute (`floor(epoch_ms / 60000)`) a tick evaluated.
    #[serde(deserialize_with = "or_default")]
    pub last_routine_minute: Option<i64>,
}

impl HomeState {
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    pub fn device_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| &d.id == id)
    }

    /// Up to `limit` most recent log entries, newest first.
    pub fn recent_logs(&self, limit: usize) -> impl Iterator<Item = &LogEntry> {
        self.logs.iter().rev().take(limit)
    }
}
