//! Per-type feature payloads and the clamping rules that keep them in range.

use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{DeviceType, FanSpeed};

/// Lamp brightness when none is supplied.
pub const DEFAULT_BRIGHTNESS: u8 = 50;
/// Upper bound of lamp brightness.
pub const MAX_BRIGHTNESS: u8 = 100;
/// Thermostat setpoint when none is supplied (°C).
pub const DEFAULT_TEMPERATURE_C: f64 = 24.0;
/// Lowest thermostat setpoint (°C).
pub const MIN_TEMPERATURE_C: f64 = 16.0;
/// Highest thermostat setpoint (°C).
pub const MAX_TEMPERATURE_C: f64 = 32.0;

/// Type-specific settings of a device.
///
/// The variant always matches the device's type, so a lamp can never carry
/// a fan speed. Values are clamped on every write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Features {
    Lamp { brightness: u8 },
    Fan { speed: FanSpeed },
    Thermostat { temperature: f64 },
}

/// Names of the individual feature fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKey {
    Brightness,
    Speed,
    Temperature,
}

impl FeatureKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "brightness" => Some(Self::Brightness),
            "speed" => Some(Self::Speed),
            "temperature" => Some(Self::Temperature),
            _ => None,
        }
    }
}

/// Unvalidated feature values as they arrive from forms or storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeatures {
    pub brightness: Option<String>,
    pub speed: Option<String>,
    pub temperature: Option<String>,
}

impl RawFeatures {
    /// Extracts raw values from a loosely-typed JSON object. Numbers and
    /// strings are kept, anything else is treated as absent.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let text = |key: &str| match map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self {
            brightness: text("brightness"),
            speed: text("speed"),
            temperature: text("temperature"),
        }
    }
}

impl Features {
    /// Built-in defaults for a device type.
    pub fn defaults(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::Lamp => Self::Lamp {
                brightness: DEFAULT_BRIGHTNESS,
            },
            DeviceType::Fan => Self::Fan {
                speed: FanSpeed::default(),
            },
            DeviceType::Thermostat => Self::Thermostat {
                temperature: DEFAULT_TEMPERATURE_C,
            },
        }
    }

    /// Defaults for `device_type` overlaid with whichever raw values apply.
    pub fn from_raw(device_type: DeviceType, raw: &RawFeatures) -> Self {
        let mut features = Self::defaults(device_type);
        let entries = [
            (FeatureKey::Brightness, &raw.brightness),
            (FeatureKey::Speed, &raw.speed),
            (FeatureKey::Temperature, &raw.temperature),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                features.apply(key, value);
            }
        }
        features
    }

    pub fn device_type(&self) -> DeviceType {
        match self {
            Self::Lamp { .. } => DeviceType::Lamp,
            Self::Fan { .. } => DeviceType::Fan,
            Self::Thermostat { .. } => DeviceType::Thermostat,
        }
    }

    /// Writes `raw` into the field named by `key` if that field belongs to
    /// this variant. Returns `false` (and changes nothing) otherwise.
    ///
    /// Blank or non-numeric input for a numeric field resets it to the
    /// type default.
    pub fn apply(&mut self, key: FeatureKey, raw: &str) -> bool {
        match (self, key) {
            (Self::Lamp { brightness }, FeatureKey::Brightness) => {
                *brightness = clamp_brightness(raw);
                true
            }
            (Self::Fan { speed }, FeatureKey::Speed) => {
                *speed = FanSpeed::from_label(raw);
                true
            }
            (Self::Thermostat { temperature }, FeatureKey::Temperature) => {
                *temperature = clamp_temperature(raw);
                true
            }
            _ => false,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn clamp_brightness(raw: &str) -> u8 {
    match parse_number(raw) {
        Some(n) => n.round().clamp(0.0, f64::from(MAX_BRIGHTNESS)) as u8,
        None => DEFAULT_BRIGHTNESS,
    }
}

fn clamp_temperature(raw: &str) -> f64 {
    parse_number(raw)
        .map(|n| n.clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C))
        .unwrap_or(DEFAULT_TEMPERATURE_C)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_brightness(v: &str) -> RawFeatures {
        RawFeatures {
            brightness: Some(v.to_string()),
            ..RawFeatures::default()
        }
    }

    #[test]
    fn brightness_is_clamped_and_rounded() {
        let f = Features::from_raw(DeviceType::Lamp, &raw_brightness("150"));
        assert_eq!(f, Features::Lamp { brightness: 100 });
        let f = Features::from_raw(DeviceType::Lamp, &raw_brightness("-3"));
        assert_eq!(f, Features::Lamp { brightness: 0 });
        let f = Features::from_raw(DeviceType::Lamp, &raw_brightness("42.6"));
        assert_eq!(f, Features::Lamp { brightness: 43 });
    }

    #[test]
    fn blank_or_garbage_falls_back_to_default() {
        let f = Features::from_raw(DeviceType::Lamp, &raw_brightness(""));
        assert_eq!(f, Features::Lamp { brightness: 50 });
        let f = Features::from_raw(DeviceType::Lamp, &raw_brightness("bright"));
        assert_eq!(f, Features::Lamp { brightness: 50 });
    }

    #[test]
    fn temperature_is_clamped() {
        let mut f = Features::defaults(DeviceType::Thermostat);
        assert!(f.apply(FeatureKey::Temperature, "10"));
        assert_eq!(f, Features::Thermostat { temperature: 16.0 });
        assert!(f.apply(FeatureKey::Temperature, "40"));
        assert_eq!(f, Features::Thermostat { temperature: 32.0 });
        assert!(f.apply(FeatureKey::Temperature, "21.5"));
        assert_eq!(f, Features::Thermostat { temperature: 21.5 });
    }

    #[test]
    fn unknown_speed_becomes_medium() {
        let mut f = Features::Fan {
            speed: FanSpeed::High,
        };
        assert!(f.apply(FeatureKey::Speed, "Turbo"));
        assert_eq!(
            f,
            Features::Fan {
                speed: FanSpeed::Medium
            }
        );
    }

    #[test]
    fn mismatched_key_is_a_no_op() {
        let mut f = Features::Lamp { brightness: 70 };
        assert!(!f.apply(FeatureKey::Speed, "High"));
        assert!(!f.apply(FeatureKey::Temperature, "20"));
        assert_eq!(f, Features::Lamp { brightness: 70 });
    }

    #[test]
    fn raw_from_json_accepts_numbers_and_strings() {
        let value = serde_json::json!({ "brightness": 80, "speed": "Low", "temperature": true });
        let raw = value
            .as_object()
            .map(RawFeatures::from_json)
            .unwrap_or_default();
        assert_eq!(raw.brightness.as_deref(), Some("80"));
        assert_eq!(raw.speed.as_deref(), Some("Low"));
        assert_eq!(raw.temperature, None);
    }

    #[test]
    fn serializes_as_plain_object() {
        let json = serde_json::to_value(Features::Lamp { brightness: 50 }).ok();
        assert_eq!(json, Some(serde_json::json!({ "brightness": 50 })));
    }
}
