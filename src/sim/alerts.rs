//! Long-running device detection: one alert per On-episode that exceeds the
//! threshold.

use log::debug;

use crate::devices::Device;

use super::clock::MS_PER_HOUR;
use super::event::Alert;

/// Scans `devices` and returns an alert for each On device whose current
/// episode has lasted longer than `threshold_ms` and has not alerted yet.
/// Flagged devices are marked so the episode cannot alert again.
pub fn detect(devices: &mut [Device], now_ms: i64, threshold_ms: i64) -> Vec<Alert> {
    let threshold_hours = threshold_ms / MS_PER_HOUR;
    let mut alerts = Vec::new();

    for device in devices.iter_mut().filter(|d| d.is_on() && !d.alerted()) {
        let Some(since) = device.on_since() else {
            continue;
        };
        if now_ms - since > threshold_ms {
            debug!("device {} on for over {threshold_hours}h", device.id);
            alerts.push(Alert::new(
                now_ms,
                format!(
                    "{} is On for over {threshold_hours} hours. Consider turning it Off or resetting.",
                    device.name
                ),
            ));
            device.mark_alerted();
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Power, RawFeatures};
    use crate::id::RoomId;
    use crate::sim::types::Room;

    const DAY: i64 = 24 * MS_PER_HOUR;

    fn heater() -> Vec<Device> {
        let rooms = vec![Room {
            id: RoomId::from("r"),
            name: "Room".to_string(),
        }];
        vec![
            Device::create(&rooms, &RoomId::from("r"), "thermostat", "Heater", &RawFeatures::default(), None)
                .expect("device"),
        ]
    }

    #[test]
    fn no_alert_at_exactly_threshold() {
        let mut ds = heater();
        ds[0].set_power(Power::On, 0);
        assert!(detect(&mut ds, DAY, DAY).is_empty());
        assert!(!ds[0].alerted());
    }

    #[test]
    fn one_alert_per_episode() {
        let mut ds = heater();
        ds[0].set_power(Power::On, 0);

        let first = detect(&mut ds, DAY + 1, DAY);
        assert_eq!(first.len(), 1);
        assert_eq!(
            first[0].message,
            "Heater is On for over 24 hours. Consider turning it Off or resetting."
        );
        assert!(ds[0].alerted());

        assert!(detect(&mut ds, 3 * DAY, DAY).is_empty());
    }

    #[test]
    fn off_rearms_alerting() {
        let mut ds = heater();
        ds[0].set_power(Power::On, 0);
        assert_eq!(detect(&mut ds, DAY + 1, DAY).len(), 1);

        ds[0].set_power(Power::Off, DAY + 2);
        ds[0].set_power(Power::On, DAY + 3);
        assert!(detect(&mut ds, 2 * DAY, DAY).is_empty());
        assert_eq!(detect(&mut ds, 2 * DAY + 4, DAY).len(), 1);
    }

    #[test]
    fn off_devices_never_alert() {
        let mut ds = heater();
        assert!(detect(&mut ds, 10 * DAY, DAY).is_empty());
    }
}
