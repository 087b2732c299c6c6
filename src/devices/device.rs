use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::id::{DeviceId, RoomId};
use crate::sim::energy::kwh_for;
use crate::sim::types::Room;

use super::features::{FeatureKey, Features, RawFeatures};
use super::types::{DeviceType, Power};

/// A simulated appliance.
///
/// The accounting fields are private so that the On/Off invariants hold for
/// every reachable state:
/// - `last_energy_timestamp` and `on_since` are set iff the device is On
/// - `energy_kwh` never decreases and never grows while Off
/// - `alerted` is `false` whenever the device is Off
///
/// Serialized through [`DeviceRecord`], which re-validates everything on the
/// way in so persisted data cannot break those invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DeviceRecord", into = "DeviceRecord")]
pub struct Device {
    pub id: DeviceId,
    pub room_id: RoomId,
    pub name: String,
    power: Power,
    features: Features,
    watt: f64,
    energy_kwh: f64,
    last_energy_timestamp: Option<i64>,
    on_since: Option<i64>,
    alerted: bool,
}

/// What a call to [`Device::set_power`] actually did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerTransition {
    /// Off → On; a new episode started.
    TurnedOn,
    /// On → Off; the final interval was settled into energy.
    TurnedOff { settled_kwh: f64 },
    /// Target equalled the current state.
    Unchanged,
}

impl Device {
    /// Creates a new device in an existing room.
    ///
    /// # Arguments
    ///
    /// * `rooms` - Rooms currently defined; `room_id` must be one of them
    /// * `room_id` - Room the device belongs to
    /// * `device_type` - `"lamp"`, `"fan"` or `"thermostat"`
    /// * `name` - Display name; blank falls back to the type label
    /// * `raw` - Unvalidated feature values, clamped onto the type defaults
    /// * `watt` - Rated draw; non-positive or non-finite falls back to the type default
    ///
    /// # Errors
    ///
    /// `RoomNotFound` if the room does not exist, `UnknownDeviceType` if the
    /// type is not recognized.
    pub fn create(
        rooms: &[Room],
        room_id: &RoomId,
        device_type: &str,
        name: &str,
        raw: &RawFeatures,
        watt: Option<f64>,
    ) -> Result<Self, ValidationError> {
        if !rooms.iter().any(|r| &r.id == room_id) {
            return Err(ValidationError::RoomNotFound(room_id.to_string()));
        }
        let device_type: DeviceType = device_type.parse()?;

        Ok(Self {
            id: DeviceId::generate(),
            room_id: room_id.clone(),
            name: display_name(name, device_type),
            power: Power::Off,
            features: Features::from_raw(device_type, raw),
            watt: resolve_watt(watt, device_type),
            energy_kwh: 0.0,
            last_energy_timestamp: None,
            on_since: None,
            alerted: false,
        })
    }

    pub fn device_type(&self) -> DeviceType {
        self.features.device_type()
    }

    pub fn power(&self) -> Power {
        self.power
    }

    pub fn is_on(&self) -> bool {
        self.power.is_on()
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Rated draw in watts.
    pub fn watt(&self) -> f64 {
        self.watt
    }

    /// Cumulative energy consumed in kWh.
    pub fn energy_kwh(&self) -> f64 {
        self.energy_kwh
    }

    /// Epoch ms at which energy was last settled; `None` while Off.
    pub fn last_energy_timestamp(&self) -> Option<i64> {
        self.last_energy_timestamp
    }

    /// Epoch ms at which the current On-episode started; `None` while Off.
    pub fn on_since(&self) -> Option<i64> {
        self.on_since
    }

    /// Whether the current On-episode already raised a long-running alert.
    pub fn alerted(&self) -> bool {
        self.alerted
    }

    /// Updates one feature. Keys that do not belong to this device's type
    /// are ignored; returns whether the key applied.
    pub fn set_feature(&mut self, key: &str, value: &str) -> bool {
        FeatureKey::parse(key).is_some_and(|k| self.features.apply(k, value))
    }

    /// Moves the device to `target` at `now_ms`.
    ///
    /// Off → On starts an episode. On → Off settles the interval since the
    /// last settlement and clears the episode. A same-state target leaves
    /// all accounting untouched.
    pub fn set_power(&mut self, target: Power, now_ms: i64) -> PowerTransition {
        match (self.power, target) {
            (Power::Off, Power::On) => {
                self.power = Power::On;
                self.on_since = Some(now_ms);
                self.last_energy_timestamp = Some(now_ms);
                PowerTransition::TurnedOn
            }
            (Power::On, Power::Off) => {
                let since = self.last_energy_timestamp.unwrap_or(now_ms);
                let settled_kwh = kwh_for(self.watt, now_ms - since);
                self.energy_kwh += settled_kwh;
                self.power = Power::Off;
                self.on_since = None;
                self.last_energy_timestamp = None;
                self.alerted = false;
                PowerTransition::TurnedOff { settled_kwh }
            }
            _ => {
                self.power = target;
                PowerTransition::Unchanged
            }
        }
    }

    /// Accrues energy for the interval since the last settlement. Returns the
    /// kWh added, which is zero while Off or when no time has passed.
    pub(crate) fn accrue(&mut self, now_ms: i64) -> f64 {
        if !self.is_on() {
            return 0.0;
        }
        let Some(last) = self.last_energy_timestamp else {
            return 0.0;
        };
        let elapsed_ms = now_ms - last;
        if elapsed_ms <= 0 {
            return 0.0;
        }
        let kwh = kwh_for(self.watt, elapsed_ms);
        self.energy_kwh += kwh;
        self.last_energy_timestamp = Some(now_ms);
        kwh
    }

    pub(crate) fn mark_alerted(&mut self) {
        self.alerted = true;
    }
}

fn display_name(name: &str, device_type: DeviceType) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        device_type.label().to_string()
    } else {
        trimmed.to_string()
    }
}

fn resolve_watt(watt: Option<f64>, device_type: DeviceType) -> f64 {
    match watt {
        Some(w) if w.is_finite() && w > 0.0 => w,
        _ => device_type.default_watt(),
    }
}

/// Loosely-typed persisted shape of a [`Device`].
///
/// Every field is a raw JSON value so that a single malformed field degrades
/// to its default instead of failing the whole snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceRecord {
    id: Value,
    room_id: Value,
    #[serde(rename = "type")]
    device_type: Value,
    name: Value,
    power: Value,
    features: Value,
    watt: Value,
    #[serde(rename = "energyKWh")]
    energy_kwh: Value,
    last_energy_timestamp: Value,
    on_since: Value,
    alerted: Value,
}

fn as_timestamp(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn as_nonempty_str(v: &Value) -> Option<&str> {
    v.as_str().map(str::trim).filter(|s| !s.is_empty())
}

impl From<DeviceRecord> for Device {
    fn from(r: DeviceRecord) -> Self {
        let device_type = r
            .device_type
            .as_str()
            .and_then(|s| s.parse::<DeviceType>().ok())
            .unwrap_or(DeviceType::Lamp);

        let features = match &r.features {
            Value::Object(map) => Features::from_raw(device_type, &RawFeatures::from_json(map)),
            _ => Features::defaults(device_type),
        };

        let mut power = match r.power.as_str() {
            Some("On") => Power::On,
            _ => Power::Off,
        };

        let energy_kwh = r
            .energy_kwh
            .as_f64()
            .filter(|e| e.is_finite() && *e >= 0.0)
            .unwrap_or(0.0);

        let (mut last_energy_timestamp, mut on_since) = (
            as_timestamp(&r.last_energy_timestamp),
            as_timestamp(&r.on_since),
        );
        if power.is_on() {
            match (last_energy_timestamp, on_since) {
                (Some(_), Some(_)) => {}
                (Some(last), None) => on_since = Some(last),
                (None, Some(since)) => last_energy_timestamp = Some(since),
                // No anchor to settle from; the episode cannot be resumed.
                (None, None) => power = Power::Off,
            }
        }
        let alerted = power.is_on() && r.alerted.as_bool().unwrap_or(false);
        if !power.is_on() {
            last_energy_timestamp = None;
            on_since = None;
        }

        Self {
            id: as_nonempty_str(&r.id)
                .map(DeviceId::from)
                .unwrap_or_else(DeviceId::generate),
            room_id: RoomId::from(r.room_id.as_str().unwrap_or_default()),
            name: display_name(r.name.as_str().unwrap_or_default(), device_type),
            power,
            features,
            watt: resolve_watt(r.watt.as_f64(), device_type),
            energy_kwh,
            last_energy_timestamp,
            on_since,
            alerted,
        }
    }
}

impl From<Device> for DeviceRecord {
    fn from(d: Device) -> Self {
        let features = serde_json::to_value(&d.features)
            .unwrap_or_else(|_| Value::Object(Map::new()));
        Self {
            id: Value::from(d.id.0),
            room_id: Value::from(d.room_id.0),
            device_type: Value::from(d.features.device_type().as_str()),
            name: Value::from(d.name),
            power: Value::from(d.power.label()),
            features,
            watt: Value::from(d.watt),
            energy_kwh: Value::from(d.energy_kwh),
            last_energy_timestamp: d.last_energy_timestamp.map_or(Value::Null, Value::from),
            on_since: d.on_since.map_or(Value::Null, Value::from),
            alerted: Value::from(d.alerted),
        }
    }
}
