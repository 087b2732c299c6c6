//! Common enums shared by the device model, routines, and persistence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Power state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Power {
    On,
    #[default]
    Off,
}

impl Power {
    /// Lenient parse used for form and routine input: anything other than
    /// exactly `"On"` means `Off`.
    pub fn from_label(s: &str) -> Self {
        if s == "On" { Self::On } else { Self::Off }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Off => "Off",
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// The kind of appliance. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Lamp,
    Fan,
    Thermostat,
}

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [Self::Lamp, Self::Fan, Self::Thermostat];

    /// Rated draw in watts used when none is supplied.
    pub fn default_watt(self) -> f64 {
        match self {
            Self::Lamp => 10.0,
            Self::Fan => 60.0,
            Self::Thermostat => 1200.0,
        }
    }

    /// Human-readable label, also the fallback device name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Lamp => "Lamp",
            Self::Fan => "Fan",
            Self::Thermostat => "Thermostat",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lamp => "lamp",
            Self::Fan => "fan",
            Self::Thermostat => "thermostat",
        }
    }
}

impl FromStr for DeviceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lamp" => Ok(Self::Lamp),
            "fan" => Ok(Self::Fan),
            "thermostat" => Ok(Self::Thermostat),
            other => Err(ValidationError::UnknownDeviceType(other.to_string())),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Fan speed setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FanSpeed {
    Low,
    #[default]
    Medium,
    High,
}

impl FanSpeed {
    /// Parses an exact speed label, falling back to `Medium` for anything else.
    pub fn from_label(s: &str) -> Self {
        match s {
            "Low" => Self::Low,
            "High" => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}
