//! Minute-resolution routine scheduling.

use log::debug;

use crate::devices::Device;
use crate::id::RoutineId;

use super::clock::Moment;
use super::event::LogEntry;
use super::types::{HomeState, Routine};

/// Whether routine matching should run for `now` given the last evaluated
/// minute.
pub fn minute_is_new(last_routine_minute: Option<i64>, now: &Moment) -> bool {
    last_routine_minute != Some(now.minute_index())
}

/// Applies `routine.to` to every device the routine selects, using the
/// regular power transition rules. Returns how many devices were selected.
pub fn apply_routine(devices: &mut [Device], routine: &Routine, now_ms: i64) -> usize {
    let mut touched = 0;
    for device in devices.iter_mut().filter(|d| routine.selects(d)) {
        device.set_power(routine.to, now_ms);
        touched += 1;
    }
    touched
}

/// Fires every routine whose time matches the current wall-clock minute,
/// at most once per calendar minute.
///
/// Routines run in configuration order, each logging one entry. The last
/// evaluated minute is advanced whether or not anything fired.
///
/// # Returns
///
/// Ids of the routines that fired.
pub fn run_due(state: &mut HomeState, now: &Moment) -> Vec<RoutineId> {
    let mut fired = Vec::new();

    if minute_is_new(state.last_routine_minute, now) && !state.routines.is_empty() {
        for routine in state
            .routines
            .iter()
            .filter(|r| r.time.matches(now.hour, now.minute))
        {
            let touched = apply_routine(&mut state.devices, routine, now.epoch_ms);
            debug!(
                "routine {} ({}) -> {} on {touched} device(s)",
                routine.id, routine.time, routine.to
            );
            state.logs.push(LogEntry::routine(
                now.epoch_ms,
                format!("Routine '{}' executed", routine.name),
            ));
            fired.push(routine.id.clone());
        }
    }

    state.last_routine_minute = Some(now.minute_index());
    fired
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::devices::{DeviceType, Power, RawFeatures};
    use crate::id::RoomId;
    use crate::sim::event::LogKind;
    use crate::sim::types::{Room, TargetKind};

    fn at(h: u32, m: u32, s: u32) -> Moment {
        let dt = Utc.with_ymd_and_hms(2026, 5, 1, h, m, s).unwrap();
        Moment::from_datetime(&dt)
    }

    fn home() -> HomeState {
        let mut state = HomeState::default();
        state.rooms = vec![
            Room {
                id: RoomId::from("bed"),
                name: "Bedroom".to_string(),
            },
            Room {
                id: RoomId::from("kit"),
                name: "Kitchen".to_string(),
            },
        ];
        for (room, kind) in [("bed", "lamp"), ("bed", "fan"), ("kit", "lamp")] {
            let d = Device::create(
                &state.rooms,
                &RoomId::from(room),
                kind,
                "",
                &RawFeatures::default(),
                None,
            )
            .expect("device");
            state.devices.push(d);
        }
        state
    }

    fn add(state: &mut HomeState, time: &str, target: TargetKind, value: Option<&str>, to: Power) {
        let r = Routine::new(&state.rooms, "Routine", time, target, value, to).expect("routine");
        state.routines.push(r);
    }

    #[test]
    fn fires_once_per_minute() {
        let mut state = home();
        add(&mut state, "07:00", TargetKind::Type, Some("lamp"), Power::On);

        assert_eq!(run_due(&mut state, &at(7, 0, 0)).len(), 1);
        assert_eq!(run_due(&mut state, &at(7, 0, 30)).len(), 0);
        assert_eq!(run_due(&mut state, &at(7, 0, 59)).len(), 0);
        assert_eq!(run_due(&mut state, &at(7, 1, 0)).len(), 0);

        let lamps_on = state
            .devices
            .iter()
            .filter(|d| d.device_type() == DeviceType::Lamp && d.is_on())
            .count();
        assert_eq!(lamps_on, 2);
        assert!(!state.devices[1].is_on());
        let routine_logs = state.logs.iter().filter(|l| l.kind == LogKind::Routine).count();
        assert_eq!(routine_logs, 1);
    }

    #[test]
    fn fires_again_next_day() {
        let mut state = home();
        add(&mut state, "07:00", TargetKind::All, None, Power::On);
        let day1 = Utc.with_ymd_and_hms(2026, 5, 1, 7, 0, 5).unwrap();
        let day2 = day1 + Duration::days(1);
        assert_eq!(run_due(&mut state, &Moment::from_datetime(&day1)).len(), 1);
        assert_eq!(run_due(&mut state, &Moment::from_datetime(&day2)).len(), 1);
    }

    #[test]
    fn minute_advances_even_without_routines() {
        let mut state = home();
        let now = at(9, 30, 0);
        assert!(run_due(&mut state, &now).is_empty());
        assert_eq!(state.last_routine_minute, Some(now.minute_index()));
    }

    #[test]
    fn room_target_selects_only_that_room() {
        let mut state = home();
        add(&mut state, "22:15", TargetKind::Room, Some("bed"), Power::On);
        run_due(&mut state, &at(22, 15, 0));
        let on: Vec<bool> = state.devices.iter().map(Device::is_on).collect();
        assert_eq!(on, vec![true, true, false]);
    }

    #[test]
    fn routines_apply_in_configuration_order() {
        let mut state = home();
        add(&mut state, "06:00", TargetKind::All, None, Power::On);
        add(&mut state, "06:00", TargetKind::Type, Some("fan"), Power::Off);
        let fired = run_due(&mut state, &at(6, 0, 0));
        assert_eq!(fired.len(), 2);
        let on: Vec<bool> = state.devices.iter().map(Device::is_on).collect();
        assert_eq!(on, vec![true, false, true]);
        assert_eq!(state.logs.len(), 2);
    }

    #[test]
    fn off_routine_settles_energy() {
        let mut state = home();
        let start = at(20, 0, 0);
        state.devices[0].set_power(Power::On, start.epoch_ms);
        add(&mut state, "22:00", TargetKind::All, None, Power::Off);
        run_due(&mut state, &at(22, 0, 0));
        assert!(!state.devices[0].is_on());
        assert!((state.devices[0].energy_kwh() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn non_matching_minute_does_nothing() {
        let mut state = home();
        add(&mut state, "07:00", TargetKind::All, None, Power::On);
        assert!(run_due(&mut state, &at(7, 1, 0)).is_empty());
        assert!(state.devices.iter().all(|d| !d.is_on()));
        assert!(state.logs.is_empty());
    }
}
