//! Append-only records produced by user actions and the tick: activity log
//! entries and long-running-device alerts.

use serde::{Deserialize, Serialize};

use crate::id::AlertId;

/// Source of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Device,
    Routine,
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Epoch milliseconds.
    pub ts: i64,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
}

impl LogEntry {
    pub fn device(ts: i64, message: impl Into<String>) -> Self {
        Self {
            ts,
            kind: LogKind::Device,
            message: message.into(),
        }
    }

    pub fn routine(ts: i64, message: impl Into<String>) -> Self {
        Self {
            ts,
            kind: LogKind::Routine,
            message: message.into(),
        }
    }
}

/// A device has been On for longer than the alert threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    /// Epoch milliseconds.
    pub ts: i64,
    pub message: String,
}

impl Alert {
    pub fn new(ts: i64, message: impl Into<String>) -> Self {
        Self {
            id: AlertId::generate(),
            ts,
            message: message.into(),
        }
    }
}
