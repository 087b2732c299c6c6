//! Snapshot persistence behind an injectable key-value style collaborator.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::accounts::User;
use crate::error::StorageError;
use crate::id::UserId;
use crate::io::lenient::{or_default, skip_invalid};
use crate::sim::types::HomeState;

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(deserialize_with = "skip_invalid")]
    pub users: Vec<User>,
    #[serde(deserialize_with = "or_default")]
    pub current_user_id: Option<UserId>,
    #[serde(deserialize_with = "or_default")]
    pub state: HomeState,
}

/// Storage medium for the snapshot.
pub trait Persistence {
    /// Reads the stored snapshot; `Ok(None)` if nothing has been stored.
    fn load(&self) -> Result<Option<Snapshot>, StorageError>;

    /// Replaces the stored snapshot.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError>;

    /// Removes the stored snapshot.
    fn clear(&mut self) -> Result<(), StorageError>;
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        (**self).load()
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        (**self).save(snapshot)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// Stores the snapshot as one JSON document on disk.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl Persistence for JsonFile {
    fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the serialized snapshot in memory. Data still round-trips through
/// JSON, so normalization behaves exactly as with [`JsonFile`].
#[derive(Debug, Clone, Default)]
pub struct InMemory {
    data: Option<String>,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with raw stored text, which need not be valid.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            data: Some(raw.into()),
        }
    }

    /// The stored text, if any.
    pub fn raw(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl Persistence for InMemory {
    fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        self.data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.data = Some(serde_json::to_string(snapshot)?);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.data = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RoomId;
    use crate::sim::types::Room;

    fn sample() -> Snapshot {
        let mut snap = Snapshot::default();
        snap.state.rooms.push(Room {
            id: RoomId::from("r1"),
            name: "Bedroom".to_string(),
        });
        snap.state.last_routine_minute = Some(42);
        snap
    }

    #[test]
    fn in_memory_round_trip() {
        let mut store = InMemory::new();
        assert!(matches!(store.load(), Ok(None)));
        store.save(&sample()).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded, Some(sample()));
        store.clear().expect("clear");
        assert!(matches!(store.load(), Ok(None)));
    }

    #[test]
    fn layout_uses_camel_case_keys() {
        let mut store = InMemory::new();
        store.save(&sample()).expect("save");
        let json: serde_json::Value =
            serde_json::from_str(store.raw().unwrap_or_default()).expect("json");
        assert!(json.get("currentUserId").is_some());
        assert_eq!(json["state"]["lastRoutineMinute"], 42);
        assert!(json["state"]["devices"].is_array());
    }

    #[test]
    fn corrupt_data_is_an_error() {
        let store = InMemory::with_raw("{not json");
        assert!(matches!(store.load(), Err(StorageError::Json(_))));
    }

    #[test]
    fn unreadable_items_are_dropped_individually() {
        let store = InMemory::with_raw(
            r#"{"users": "nobody", "currentUserId": 5,
                "state": {"rooms": [{"id": "r1", "name": "Hall"}, {"name": 3}]}}"#,
        );
        let snap = store.load().expect("load").expect("stored");
        assert!(snap.users.is_empty());
        assert_eq!(snap.current_user_id, None);
        assert_eq!(snap.state.rooms.len(), 1);
        assert_eq!(snap.state.rooms[0].name, "Hall");
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("smarthome-persist-{}.json", crate::id::generate()));
        let mut file = JsonFile::new(&path);
        assert!(matches!(file.load(), Ok(None)));
        file.save(&sample()).expect("save");
        assert_eq!(file.load().expect("load"), Some(sample()));
        file.clear().expect("clear");
        assert!(!path.exists());
        file.clear().expect("clearing twice is fine");
    }
}
