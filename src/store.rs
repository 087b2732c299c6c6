//! The state store: owns the aggregate and the account list, applies user
//! actions and ticks, and writes a snapshot after every observable change.

use log::{debug, info, warn};

use crate::accounts::{self, User};
use crate::devices::{Device, Power, PowerTransition, RawFeatures};
use crate::error::ValidationError;
use crate::id::{DeviceId, RoomId, RoutineId, UserId};
use crate::io::persist::{Persistence, Snapshot};
use crate::sim::clock::Moment;
use crate::sim::engine::{self, TickReport};
use crate::sim::event::LogEntry;
use crate::sim::types::{HomeState, Room, Routine, SimConfig, TargetKind};

/// Input for [`Store::add_device`].
#[derive(Debug, Clone, Default)]
pub struct NewDevice {
    pub room_id: RoomId,
    /// `"lamp"`, `"fan"` or `"thermostat"`.
    pub device_type: String,
    pub name: String,
    pub features: RawFeatures,
    pub watt: Option<f64>,
}

/// Input for [`Store::add_routine`]. Labels are parsed leniently.
#[derive(Debug, Clone, Default)]
pub struct NewRoutine {
    pub name: String,
    /// `HH:MM`.
    pub time: String,
    /// `"all"`, `"room"` or `"type"`; anything else means `all`.
    pub target: String,
    pub target_value: Option<String>,
    /// `"On"` or anything else for Off.
    pub to: String,
}

/// Single owner of the simulation state.
///
/// Every mutation computes a complete new [`HomeState`] and swaps it in, so
/// a rejected operation leaves the previous state untouched. Storage
/// failures are logged and never surface to callers.
pub struct Store<P: Persistence> {
    users: Vec<User>,
    current_user_id: Option<UserId>,
    state: HomeState,
    config: SimConfig,
    persistence: P,
}

impl<P: Persistence> Store<P> {
    /// Opens the store, restoring whatever `persistence` holds.
    ///
    /// Missing data starts an empty home. Unreadable or corrupt data is
    /// logged and also starts an empty home.
    pub fn open(persistence: P, config: SimConfig) -> Self {
        let snapshot = match persistence.load() {
            Ok(Some(s)) => {
                info!(
                    "restored {} room(s), {} device(s), {} routine(s)",
                    s.state.rooms.len(),
                    s.state.devices.len(),
                    s.state.routines.len()
                );
                s
            }
            Ok(None) => {
                info!("no saved state, starting empty");
                Snapshot::default()
            }
            Err(e) => {
                warn!("discarding unreadable saved state: {e}");
                Snapshot::default()
            }
        };

        Self {
            users: snapshot.users,
            current_user_id: snapshot.current_user_id,
            state: snapshot.state,
            config,
            persistence,
        }
    }

    pub fn state(&self) -> &HomeState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn current_user(&self) -> Option<&User> {
        let id = self.current_user_id.as_ref()?;
        self.users.iter().find(|u| &u.id == id)
    }

    /// Most recent log entries up to the configured display limit, newest first.
    pub fn recent_logs(&self) -> Vec<&LogEntry> {
        self.state.recent_logs(self.config.log_display_limit).collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.clone(),
            current_user_id: self.current_user_id.clone(),
            state: self.state.clone(),
        }
    }

    /// Runs one tick at `now` and commits the result.
    pub fn apply_tick(&mut self, now: &Moment) -> TickReport {
        let (next, report) = engine::tick_with_report(&self.state, now, &self.config);
        self.commit(next);
        report
    }

    /// Adds a room with a trimmed, non-empty name.
    ///
    /// # Errors
    ///
    /// `EmptyName` if the name is blank.
    pub fn add_room(&mut self, name: &str) -> Result<RoomId, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName("room"));
        }
        let room = Room {
            id: RoomId::generate(),
            name: name.to_string(),
        };
        let id = room.id.clone();
        let mut next = self.state.clone();
        next.rooms.push(room);
        self.commit(next);
        Ok(id)
    }

    /// Removes a room together with every device in it. Returns the number
    /// of devices removed.
    ///
    /// # Errors
    ///
    /// `RoomNotFound` if no room has this id.
    pub fn remove_room(&mut self, id: &RoomId) -> Result<usize, ValidationError> {
        if self.state.room(id).is_none() {
            return Err(ValidationError::RoomNotFound(id.to_string()));
        }
        let mut next = self.state.clone();
        next.rooms.retain(|r| &r.id != id);
        let before = next.devices.len();
        next.devices.retain(|d| &d.room_id != id);
        let removed = before - next.devices.len();
        debug!("room {id} removed with {removed} device(s)");
        self.commit(next);
        Ok(removed)
    }

    /// Adds a device to an existing room.
    ///
    /// # Errors
    ///
    /// `RoomNotFound` or `UnknownDeviceType`, see [`Device::create`].
    pub fn add_device(&mut self, new: &NewDevice) -> Result<DeviceId, ValidationError> {
        let device = Device::create(
            &self.state.rooms,
            &new.room_id,
            &new.device_type,
            &new.name,
            &new.features,
            new.watt,
        )?;
        let id = device.id.clone();
        let mut next = self.state.clone();
        next.devices.push(device);
        self.commit(next);
        Ok(id)
    }

    /// Sets a device's power at `now` and logs `"<name> -> <target>"`.
    ///
    /// The entry is written even when the device was already in `target`.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` if no device has this id.
    pub fn toggle_power(
        &mut self,
        id: &DeviceId,
        target: Power,
        now: &Moment,
    ) -> Result<PowerTransition, ValidationError> {
        let mut next = self.state.clone();
        let device = next
            .device_mut(id)
            .ok_or_else(|| ValidationError::DeviceNotFound(id.to_string()))?;
        let transition = device.set_power(target, now.epoch_ms);
        let entry = LogEntry::device(now.epoch_ms, format!("{} -> {target}", device.name));
        next.logs.push(entry);
        self.commit(next);
        Ok(transition)
    }

    /// Updates one feature of a device. Returns whether the key applied to
    /// the device's type.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` if no device has this id.
    pub fn set_feature(
        &mut self,
        id: &DeviceId,
        key: &str,
        value: &str,
    ) -> Result<bool, ValidationError> {
        let mut next = self.state.clone();
        let device = next
            .device_mut(id)
            .ok_or_else(|| ValidationError::DeviceNotFound(id.to_string()))?;
        let applied = device.set_feature(key, value);
        self.commit(next);
        Ok(applied)
    }

    /// Adds a routine.
    ///
    /// # Errors
    ///
    /// `EmptyName` or `InvalidRoutineTime`, see [`Routine::new`].
    pub fn add_routine(&mut self, new: &NewRoutine) -> Result<RoutineId, ValidationError> {
        let routine = Routine::new(
            &self.state.rooms,
            &new.name,
            &new.time,
            TargetKind::from_label(&new.target),
            new.target_value.as_deref(),
            Power::from_label(&new.to),
        )?;
        let id = routine.id.clone();
        let mut next = self.state.clone();
        next.routines.push(routine);
        self.commit(next);
        Ok(id)
    }

    /// # Errors
    ///
    /// `RoutineNotFound` if no routine has this id.
    pub fn remove_routine(&mut self, id: &RoutineId) -> Result<(), ValidationError> {
        if !self.state.routines.iter().any(|r| &r.id == id) {
            return Err(ValidationError::RoutineNotFound(id.to_string()));
        }
        let mut next = self.state.clone();
        next.routines.retain(|r| &r.id != id);
        self.commit(next);
        Ok(())
    }

    /// Registers a user and signs them in.
    ///
    /// # Errors
    ///
    /// `DuplicateEmail` if the email is taken.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, ValidationError> {
        let user = accounts::register(&self.users, name, email, password)?;
        let id = user.id.clone();
        self.users.push(user);
        self.current_user_id = Some(id.clone());
        self.persist();
        Ok(id)
    }

    /// # Errors
    ///
    /// `InvalidCredentials` unless email and password match a user exactly.
    pub fn login(&mut self, email: &str, password: &str) -> Result<UserId, ValidationError> {
        let id = accounts::authenticate(&self.users, email, password)?.id.clone();
        self.current_user_id = Some(id.clone());
        self.persist();
        Ok(id)
    }

    pub fn logout(&mut self) {
        if self.current_user_id.take().is_some() {
            self.persist();
        }
    }

    /// Wipes users, the current user, and the whole home, and clears storage.
    pub fn reset_all(&mut self) {
        self.users.clear();
        self.current_user_id = None;
        self.state = HomeState::default();
        if let Err(e) = self.persistence.clear() {
            warn!("failed to clear saved state: {e}");
        }
        info!("all data reset");
    }

    fn commit(&mut self, next: HomeState) {
        if next != self.state {
            self.state = next;
            self.persist();
        }
    }

    fn persist(&mut self) {
        let snapshot = self.snapshot();
        if let Err(e) = self.persistence.save(&snapshot) {
            warn!("failed to save state: {e}");
        }
    }
}
