//! Snapshot history storage.
//!
//! Persists, per system ("G:S"), the two most recent scans as one JSON record:
//! - current schema: `[newest, previous?]`
//! - legacy schema: a bare snapshot object, read as a one-entry history
//!
//! Records live in a raw key-value backend (SQLite on disk, memory in tests).
//! Every save rewrites the record in the current schema.

pub mod diff;
pub mod memory;
pub mod sqlite;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::snapshot::Snapshot;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Record name prefix, shared with records exported from the userscripts.
pub const STORAGE_KEY_PREFIX: &str = "sfc_galaxy_scan_";

/// Number of snapshots retained per location.
pub const HISTORY_DEPTH: usize = 2;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("record encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine data directory")]
    NoDataDir,
    #[error("record is for {found}, not {expected}")]
    LocationMismatch { expected: String, found: String },
}

/// Raw string key-value persistence under the snapshot store.
pub trait Backend {
    fn get(&self, storage_key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, storage_key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, storage_key: &str) -> Result<(), StoreError>;
}

/// Most-recent-first retained snapshots for one location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotHistory {
    pub entries: Vec<Snapshot>,
}

impl SnapshotHistory {
    pub fn newest(&self) -> Option<&Snapshot> {
        self.entries.first()
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.entries.get(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every shape a stored record has had.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    History(Vec<Snapshot>),
    Legacy(Snapshot),
    Empty(()),
}

impl StoredRecord {
    fn into_history(self) -> SnapshotHistory {
        let entries = match self {
            StoredRecord::History(entries) => entries,
            StoredRecord::Legacy(snapshot) => vec![snapshot],
            StoredRecord::Empty(()) => Vec::new(),
        };

        SnapshotHistory {
            entries: entries
                .into_iter()
                .take(HISTORY_DEPTH)
                .map(Snapshot::rekeyed)
                .collect(),
        }
    }
}

fn parse_record(value: &str) -> Result<SnapshotHistory, serde_json::Error> {
    serde_json::from_str::<StoredRecord>(value).map(StoredRecord::into_history)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteNewest {
    Removed { remaining: usize },
    NothingToDelete,
}

pub fn storage_key(location_key: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}{location_key}")
}

pub struct SnapshotStore<B: Backend> {
    backend: B,
}

impl<B: Backend> SnapshotStore<B> {
    pub fn new(backend: B) -> Self {
        SnapshotStore { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the history for a location. Missing, unreadable or corrupt
    /// records all come back as an empty history.
    pub fn load(&self, location_key: &str) -> SnapshotHistory {
        let key = storage_key(location_key);

        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SnapshotHistory::default(),
            Err(e) => {
                warn!(location_key, error = %e, "failed to read scan history, treating as empty");
                return SnapshotHistory::default();
            }
        };

        match parse_record(&raw) {
            Ok(history) => {
                debug!(location_key, entries = history.len(), "scan history loaded");
                history
            }
            Err(e) => {
                warn!(location_key, error = %e, "stored scan history is corrupt, treating as empty");
                SnapshotHistory::default()
            }
        }
    }

    /// Push `snapshot` to the front of the history and keep the newest two.
    pub fn save(
        &mut self,
        location_key: &str,
        snapshot: Snapshot,
    ) -> Result<SnapshotHistory, StoreError> {
        let mut history = self.load(location_key);
        history.entries.insert(0, snapshot);
        history.entries.truncate(HISTORY_DEPTH);

        self.persist(location_key, &history)?;
        info!(location_key, entries = history.len(), "scan saved");
        Ok(history)
    }

    pub fn delete_all(&mut self, location_key: &str) -> Result<(), StoreError> {
        self.backend.remove(&storage_key(location_key))?;
        info!(location_key, "scan history deleted");
        Ok(())
    }

    pub fn delete_newest(&mut self, location_key: &str) -> Result<DeleteNewest, StoreError> {
        let mut history = self.load(location_key);
        if history.is_empty() {
            return Ok(DeleteNewest::NothingToDelete);
        }

        history.entries.remove(0);
        self.persist(location_key, &history)?;
        info!(location_key, remaining = history.len(), "newest scan deleted");

        Ok(DeleteNewest::Removed {
            remaining: history.len(),
        })
    }

    /// Store an exported record for `location_key`, normalized to the
    /// current schema and bounded like any saved history.
    pub fn import(
        &mut self,
        location_key: &str,
        value: &str,
    ) -> Result<SnapshotHistory, StoreError> {
        let history = parse_record(value)?;

        if let Some(foreign) = history
            .entries
            .iter()
            .find(|snapshot| snapshot.location_key.trim() != location_key)
        {
            return Err(StoreError::LocationMismatch {
                expected: location_key.to_string(),
                found: foreign.location_key.clone(),
            });
        }

        self.persist(location_key, &history)?;
        info!(location_key, entries = history.len(), "scan history imported");
        Ok(history)
    }

    fn persist(&mut self, location_key: &str, history: &SnapshotHistory) -> Result<(), StoreError> {
        let value = serde_json::to_string(&history.entries)?;
        self.backend.put(&storage_key(location_key), &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::build_key;
    use crate::snapshot::Entity;

    fn snap(taken_at: i64, attribute: i64) -> Snapshot {
        let mut snapshot = Snapshot::new("3:145", taken_at);
        let key = build_key("3:145:1", "Enemy Fleet").unwrap();
        snapshot
            .entities
            .insert(Entity::new(key, "Enemy Fleet", "3:145:1", attribute));
        snapshot
    }

    fn store() -> SnapshotStore<MemoryBackend> {
        SnapshotStore::new(MemoryBackend::default())
    }

    #[test]
    fn load_missing_is_empty() {
        assert!(store().load("3:145").is_empty());
    }

    #[test]
    fn save_is_most_recent_first_and_bounded() {
        let mut store = store();
        store.save("3:145", snap(1, 1)).unwrap();
        store.save("3:145", snap(2, 2)).unwrap();
        let history = store.save("3:145", snap(3, 3)).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.newest().unwrap().taken_at, 3);
        assert_eq!(history.previous().unwrap().taken_at, 2);
        assert_eq!(store.load("3:145"), history);
    }

    #[test]
    fn saved_record_is_array_schema() {
        let mut store = store();
        store.save("3:145", snap(1, 10)).unwrap();

        let raw = store.backend().get("sfc_galaxy_scan_3:145").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["timestamp"], 1);
    }

    #[test]
    fn legacy_record_loads_as_single_entry() {
        let mut backend = MemoryBackend::default();
        let legacy = serde_json::to_string(&snap(1000, 10)).unwrap();
        backend.put("sfc_galaxy_scan_3:145", &legacy).unwrap();

        let store = SnapshotStore::new(backend);
        let history = store.load("3:145");
        assert_eq!(history.entries, vec![snap(1000, 10)]);
    }

    #[test]
    fn corrupt_record_loads_as_empty() {
        let mut backend = MemoryBackend::default();
        backend.put("sfc_galaxy_scan_3:145", "{not json").unwrap();
        backend.put("sfc_galaxy_scan_3:146", "42").unwrap();

        let store = SnapshotStore::new(backend);
        assert!(store.load("3:145").is_empty());
        assert!(store.load("3:146").is_empty());
    }

    #[test]
    fn null_and_empty_array_load_as_empty() {
        let mut backend = MemoryBackend::default();
        backend.put("sfc_galaxy_scan_1:1", "null").unwrap();
        backend.put("sfc_galaxy_scan_1:2", "[]").unwrap();

        let store = SnapshotStore::new(backend);
        assert!(store.load("1:1").is_empty());
        assert!(store.load("1:2").is_empty());
    }

    #[test]
    fn delete_newest_walks_down_to_nothing() {
        let mut store = store();
        store.save("3:145", snap(1, 1)).unwrap();
        store.save("3:145", snap(2, 2)).unwrap();

        assert_eq!(
            store.delete_newest("3:145").unwrap(),
            DeleteNewest::Removed { remaining: 1 }
        );
        assert_eq!(store.load("3:145").newest().unwrap().taken_at, 1);

        assert_eq!(
            store.delete_newest("3:145").unwrap(),
            DeleteNewest::Removed { remaining: 0 }
        );
        assert!(store.load("3:145").is_empty());

        assert_eq!(
            store.delete_newest("3:145").unwrap(),
            DeleteNewest::NothingToDelete
        );
    }

    #[test]
    fn delete_all_is_idempotent() {
        let mut store = store();
        store.save("3:145", snap(1, 1)).unwrap();
        store.delete_all("3:145").unwrap();
        store.delete_all("3:145").unwrap();
        assert!(store.load("3:145").is_empty());
    }

    #[test]
    fn locations_are_isolated() {
        let mut store = store();
        store.save("3:145", snap(1, 1)).unwrap();
        assert!(store.load("3:146").is_empty());
    }

    #[test]
    fn oversized_record_is_bounded_on_load() {
        let mut backend = MemoryBackend::default();
        let record = serde_json::to_string(&[snap(3, 3), snap(2, 2), snap(1, 1)]).unwrap();
        backend.put("sfc_galaxy_scan_3:145", &record).unwrap();

        let history = SnapshotStore::new(backend).load("3:145");
        assert_eq!(history.len(), HISTORY_DEPTH);
        assert_eq!(history.newest().unwrap().taken_at, 3);
        assert_eq!(history.previous().unwrap().taken_at, 2);
    }

    #[test]
    fn import_bounds_and_rewrites_in_array_schema() {
        let mut store = store();
        let record = serde_json::to_string(&[snap(3, 3), snap(2, 2), snap(1, 1)]).unwrap();

        let imported = store.import("3:145", &record).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(store.load("3:145").len(), 2);

        let raw = store.backend().get("sfc_galaxy_scan_3:145").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn import_of_legacy_record_is_stored_as_array() {
        let mut store = store();
        let legacy = serde_json::to_string(&snap(1000, 10)).unwrap();

        store.import("3:145", &legacy).unwrap();

        let raw = store.backend().get("sfc_galaxy_scan_3:145").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
        assert_eq!(store.load("3:145").entries, vec![snap(1000, 10)]);
    }

    #[test]
    fn import_rejects_record_for_another_system() {
        let mut store = store();
        let record = serde_json::to_string(&[snap(1, 1)]).unwrap();

        let err = store.import("3:146", &record).unwrap_err();
        assert!(matches!(
            err,
            StoreError::LocationMismatch { ref expected, ref found } if expected == "3:146" && found == "3:145"
        ));
        assert!(store.load("3:146").is_empty());
    }

    #[test]
    fn import_rejects_garbage() {
        let mut store = store();
        assert!(store.import("3:145", "[{]").is_err());
        assert!(store.load("3:145").is_empty());
    }
}
