//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use smarthome_sim::id::{DeviceId, RoomId};
use smarthome_sim::io::persist::InMemory;
use smarthome_sim::sim::clock::{Clock, ManualClock, Moment};
use smarthome_sim::sim::types::SimConfig;
use smarthome_sim::store::{NewDevice, NewRoutine, Store};

/// Fixed UTC wall-clock time on 2026-01-15.
pub fn utc(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, hour, minute, second)
        .single()
        .unwrap_or_default()
}

/// Manual clock starting at the given time of day.
pub fn clock_at(hour: u32, minute: u32, second: u32) -> ManualClock {
    ManualClock::new(utc(hour, minute, second))
}

/// Moment at the given time of day.
pub fn moment(hour: u32, minute: u32, second: u32) -> Moment {
    clock_at(hour, minute, second).now()
}

/// Empty in-memory store with default settings.
pub fn empty_store() -> Store<InMemory> {
    Store::open(InMemory::new(), SimConfig::default())
}

/// Store with one room called "Bedroom" holding a 10 W lamp.
///
/// Returns `(store, room_id, lamp_id)`.
pub fn bedroom_with_lamp() -> (Store<InMemory>, RoomId, DeviceId) {
    let mut store = empty_store();
    let room = store.add_room("Bedroom").unwrap_or_default();
    let lamp = store
        .add_device(&device(&room, "lamp", "Bedside"))
        .unwrap_or_default();
    (store, room, lamp)
}

pub fn device(room: &RoomId, kind: &str, name: &str) -> NewDevice {
    NewDevice {
        room_id: room.clone(),
        device_type: kind.to_string(),
        name: name.to_string(),
        ..NewDevice::default()
    }
}

pub fn routine(name: &str, time: &str, target: &str, value: Option<&str>, to: &str) -> NewRoutine {
    NewRoutine {
        name: name.to_string(),
        time: time.to_string(),
        target: target.to_string(),
        target_value: value.map(str::to_string),
        to: to.to_string(),
    }
}

/// Unique path in the system temp directory.
pub fn temp_state_path(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "smarthome-{tag}-{}.json",
        smarthome_sim::id::generate()
    ))
}
