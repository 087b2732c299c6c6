//! Error types surfaced to callers of the store and the persistence layer.

use std::fmt;
use std::io;

/// A user-driven operation was rejected. The aggregate is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The referenced room does not exist.
    RoomNotFound(String),
    /// The device type is not one of lamp, fan, thermostat.
    UnknownDeviceType(String),
    /// The referenced device does not exist.
    DeviceNotFound(String),
    /// The referenced routine does not exist.
    RoutineNotFound(String),
    /// The routine time is not a valid `HH:MM` string.
    InvalidRoutineTime(String),
    /// A required name was empty after trimming.
    EmptyName(&'static str),
    /// Registration with an email that is already taken.
    DuplicateEmail(String),
    /// Login with an unknown email or wrong password.
    InvalidCredentials,
}

impl ValidationError {
    /// Returns `true` for the variants that describe a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RoomNotFound(_) | Self::DeviceNotFound(_) | Self::RoutineNotFound(_)
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomNotFound(id) => write!(f, "room \"{id}\" not found"),
            Self::UnknownDeviceType(t) => {
                write!(f, "unknown device type \"{t}\", expected lamp, fan or thermostat")
            }
            Self::DeviceNotFound(id) => write!(f, "device \"{id}\" not found"),
            Self::RoutineNotFound(id) => write!(f, "routine \"{id}\" not found"),
            Self::InvalidRoutineTime(t) => write!(f, "routine time \"{t}\" is not HH:MM"),
            Self::EmptyName(what) => write!(f, "{what} name must not be empty"),
            Self::DuplicateEmail(email) => write!(f, "email \"{email}\" already exists"),
            Self::InvalidCredentials => f.write_str("invalid credentials"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure to read or write the persisted snapshot.
#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "storage I/O error: {e}"),
            Self::Json(e) => write!(f, "storage format error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants() {
        assert!(ValidationError::RoomNotFound("r1".into()).is_not_found());
        assert!(ValidationError::DeviceNotFound("d1".into()).is_not_found());
        assert!(!ValidationError::InvalidCredentials.is_not_found());
    }

    #[test]
    fn display_names_the_offending_value() {
        let e = ValidationError::InvalidRoutineTime("7:5".into());
        assert_eq!(e.to_string(), "routine time \"7:5\" is not HH:MM");
    }
}
