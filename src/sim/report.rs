//! Energy usage summary derived from the current state.

use std::fmt;

use serde::Serialize;

use crate::devices::{DeviceType, Power};
use crate::id::{DeviceId, RoomId};

use super::types::HomeState;

/// Energy consumed by one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEnergy {
    pub device_id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Room name, or `None` if the room no longer exists.
    pub room: Option<String>,
    pub power: Power,
    pub watt: f64,
    pub energy_kwh: f64,
}

/// Energy consumed by the devices of one room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomEnergy {
    pub room_id: RoomId,
    pub name: String,
    pub energy_kwh: f64,
}

/// Aggregate energy figures for the whole home.
///
/// Computed from a state snapshot so the figures always agree with the
/// device records they summarize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyReport {
    /// Sum of all device energy (kWh).
    pub total_kwh: f64,
    /// Number of devices currently On.
    pub devices_on: usize,
    /// Current combined draw of all On devices (W).
    pub current_draw_watt: f64,
    pub devices: Vec<DeviceEnergy>,
    pub rooms: Vec<RoomEnergy>,
}

impl EnergyReport {
    /// Builds the report from a state snapshot.
    pub fn from_state(state: &HomeState) -> Self {
        let devices: Vec<DeviceEnergy> = state
            .devices
            .iter()
            .map(|d| DeviceEnergy {
                device_id: d.id.clone(),
                name: d.name.clone(),
                device_type: d.device_type(),
                room: state.room(&d.room_id).map(|r| r.name.clone()),
                power: d.power(),
                watt: d.watt(),
                energy_kwh: d.energy_kwh(),
            })
            .collect();

        let rooms = state
            .rooms
            .iter()
            .map(|r| RoomEnergy {
                room_id: r.id.clone(),
                name: r.name.clone(),
                energy_kwh: state
                    .devices
                    .iter()
                    .filter(|d| d.room_id == r.id)
                    .map(|d| d.energy_kwh())
                    .sum(),
            })
            .collect();

        let on = state.devices.iter().filter(|d| d.is_on());

        Self {
            total_kwh: devices.iter().map(|d| d.energy_kwh).sum(),
            devices_on: on.clone().count(),
            current_draw_watt: on.map(|d| d.watt()).sum(),
            devices,
            rooms,
        }
    }
}

impl fmt::Display for EnergyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy Report ---")?;
        writeln!(f, "Total:          {:.3} kWh", self.total_kwh)?;
        writeln!(
            f,
            "Devices on:     {} ({:.0} W)",
            self.devices_on, self.current_draw_watt
        )?;
        for d in &self.devices {
            writeln!(
                f,
                "  {:<20} {:<10} {:<4} {:>10.3} kWh",
                d.name,
                d.device_type,
                d.power,
                d.energy_kwh
            )?;
        }
        write!(f, "Rooms:          {}", self.rooms.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Device, RawFeatures};
    use crate::sim::clock::MS_PER_HOUR;
    use crate::sim::types::Room;

    fn state() -> HomeState {
        let mut s = HomeState::default();
        s.rooms = vec![
            Room {
                id: RoomId::from("a"),
                name: "A".to_string(),
            },
            Room {
                id: RoomId::from("b"),
                name: "B".to_string(),
            },
        ];
        for (room, kind) in [("a", "lamp"), ("a", "thermostat"), ("b", "fan")] {
            let d = Device::create(&s.rooms, &RoomId::from(room), kind, "", &RawFeatures::default(), None)
                .expect("device");
            s.devices.push(d);
        }
        s
    }

    #[test]
    fn totals_and_per_room() {
        let mut s = state();
        s.devices[1].set_power(Power::On, 0);
        s.devices[1].set_power(Power::Off, MS_PER_HOUR);
        s.devices[2].set_power(Power::On, 0);

        let report = EnergyReport::from_state(&s);
        assert!((report.total_kwh - 1.2).abs() < 1e-12);
        assert_eq!(report.devices_on, 1);
        assert_eq!(report.current_draw_watt, 60.0);
        assert!((report.rooms[0].energy_kwh - 1.2).abs() < 1e-12);
        assert_eq!(report.rooms[1].energy_kwh, 0.0);
    }

    #[test]
    fn orphaned_device_has_no_room() {
        let mut s = state();
        s.rooms.remove(1);
        let report = EnergyReport::from_state(&s);
        assert_eq!(report.devices[2].room, None);
        assert_eq!(report.rooms.len(), 1);
    }

    #[test]
    fn empty_state() {
        let report = EnergyReport::from_state(&HomeState::default());
        assert_eq!(report.total_kwh, 0.0);
        assert_eq!(report.devices_on, 0);
        assert!(!format!("{report}").is_empty());
    }
}
