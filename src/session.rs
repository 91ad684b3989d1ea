//! Scan session.
//!
//! The workflow the user drives, one call per button:
//! - record: store the collected scan as the newest entry of its system
//! - compare: diff the two newest stored scans, gated by the minimum interval
//! - last: when was this system last scanned
//! - delete / delete-last: drop the whole history or only its newest entry
//!
//! Comparison never stores anything. Every scan is recorded first, and a
//! comparison always looks at the two most recent stored entries.
//!
//! Nothing here returns an error: every failure is an outcome variant.

use serde::Serialize;
use tracing::warn;

use crate::policy::{self, MinDelta, Verdict};
use crate::scan::{self, filter::ScanFilter, CollectError, RawSnapshot};
use crate::snapshot::Entity;
use crate::store::diff::{self, Change};
use crate::store::{Backend, DeleteNewest, SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveResult {
    pub location_key: String,
    pub saved_at: i64,
    pub previous_taken_at: Option<i64>,
    pub entity_count: usize,
    pub filtered_out: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Saved(SaveResult),
    CollectionFailure { reason: String },
    StorageFailure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompareResult {
    NoHistory {
        location_key: String,
        stored: usize,
    },
    TooSoon {
        location_key: String,
        delta_hours: f64,
        required_hours: f64,
    },
    OutOfOrder {
        location_key: String,
        delta_hours: f64,
    },
    Ok {
        location_key: String,
        #[serde(serialize_with = "crate::snapshot::serialize_keyed_list")]
        added: Vec<Entity>,
        changed: Vec<Change>,
        previous_taken_at: i64,
        current_taken_at: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LastScan {
    Found {
        location_key: String,
        taken_at: i64,
        entity_count: usize,
        stored: usize,
    },
    Empty {
        location_key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted { location_key: String },
    DeletedNewest { location_key: String, remaining: usize },
    NothingToDelete { location_key: String },
    StorageFailure { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Imported {
        location_key: String,
        stored: usize,
        newest_taken_at: Option<i64>,
    },
    Rejected { reason: String },
}

pub struct ScanSession<B: Backend> {
    store: SnapshotStore<B>,
    filter: ScanFilter,
}

impl<B: Backend> ScanSession<B> {
    pub fn new(store: SnapshotStore<B>, filter: ScanFilter) -> Self {
        ScanSession { store, filter }
    }

    pub fn store(&self) -> &SnapshotStore<B> {
        &self.store
    }

    /// Record a collected scan. `None` is the collector's "could not observe".
    pub fn record_scan(&mut self, raw: Option<RawSnapshot>) -> RecordOutcome {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.record_scan_at(raw, now_ms)
    }

    /// Same as [`record_scan`](Self::record_scan) with an explicit clock for
    /// payloads that carry no timestamp.
    pub fn record_scan_at(&mut self, raw: Option<RawSnapshot>, now_ms: i64) -> RecordOutcome {
        let collected = match raw
            .ok_or(CollectError::NotObserved)
            .and_then(|raw| scan::into_snapshot(raw, &self.filter, now_ms))
        {
            Ok(collected) => collected,
            Err(e) => {
                warn!(error = %e, "scan not recorded");
                return RecordOutcome::CollectionFailure {
                    reason: e.to_string(),
                };
            }
        };

        let snapshot = collected.snapshot;
        let location_key = snapshot.location_key.clone();
        let saved_at = snapshot.taken_at;
        let entity_count = snapshot.entities.len();

        match self.store.save(&location_key, snapshot) {
            Ok(history) => RecordOutcome::Saved(SaveResult {
                location_key,
                saved_at,
                previous_taken_at: history.previous().map(|s| s.taken_at),
                entity_count,
                filtered_out: collected.filtered_out,
            }),
            Err(e) => {
                warn!(location_key = %location_key, error = %e, "failed to save scan");
                RecordOutcome::StorageFailure {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Compare the two newest stored scans of `location_key`. Read-only.
    pub fn compare_scan(&self, location_key: &str, min_delta: MinDelta) -> CompareResult {
        let history = self.store.load(location_key);
        let location_key = location_key.to_string();

        let (Some(current), Some(previous)) = (history.newest(), history.previous()) else {
            return CompareResult::NoHistory {
                location_key,
                stored: history.len(),
            };
        };

        match policy::check(current, previous, min_delta) {
            Verdict::TooSoon {
                delta_hours,
                required_hours,
            } => CompareResult::TooSoon {
                location_key,
                delta_hours,
                required_hours,
            },
            Verdict::OutOfOrder { delta_hours } => {
                warn!(location_key = %location_key, delta_hours, "newest stored scan predates the previous one");
                CompareResult::OutOfOrder {
                    location_key,
                    delta_hours,
                }
            }
            Verdict::Comparable => {
                let result = diff::diff(current, previous);
                CompareResult::Ok {
                    location_key,
                    added: result.added,
                    changed: result.changed,
                    previous_taken_at: previous.taken_at,
                    current_taken_at: current.taken_at,
                }
            }
        }
    }

    pub fn last_scan(&self, location_key: &str) -> LastScan {
        let history = self.store.load(location_key);
        let location_key = location_key.to_string();

        match history.newest() {
            Some(newest) => LastScan::Found {
                location_key,
                taken_at: newest.taken_at,
                entity_count: newest.entities.len(),
                stored: history.len(),
            },
            None => LastScan::Empty { location_key },
        }
    }

    /// Replace the history of `location_key` with an exported record.
    pub fn import_record(&mut self, location_key: &str, record: &str) -> ImportOutcome {
        match self.store.import(location_key, record) {
            Ok(history) => ImportOutcome::Imported {
                location_key: location_key.to_string(),
                stored: history.len(),
                newest_taken_at: history.newest().map(|s| s.taken_at),
            },
            Err(e) => {
                warn!(location_key, error = %e, "record not imported");
                ImportOutcome::Rejected {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn delete_all(&mut self, location_key: &str) -> DeleteOutcome {
        match self.store.delete_all(location_key) {
            Ok(()) => DeleteOutcome::Deleted {
                location_key: location_key.to_string(),
            },
            Err(e) => DeleteOutcome::StorageFailure {
                reason: e.to_string(),
            },
        }
    }

    pub fn delete_newest(&mut self, location_key: &str) -> DeleteOutcome {
        let location_key_owned = location_key.to_string();
        match self.store.delete_newest(location_key) {
            Ok(DeleteNewest::Removed { remaining }) => DeleteOutcome::DeletedNewest {
                location_key: location_key_owned,
                remaining,
            },
            Ok(DeleteNewest::NothingToDelete) => DeleteOutcome::NothingToDelete {
                location_key: location_key_owned,
            },
            Err(e) => DeleteOutcome::StorageFailure {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::parse_raw;
    use crate::store::MemoryBackend;

    const HOUR: i64 = 3_600_000;

    fn session() -> ScanSession<MemoryBackend> {
        ScanSession::new(SnapshotStore::new(MemoryBackend::default()), ScanFilter::default())
    }

    fn raw(taken_at: i64, entities: &[(&str, &str, i64)]) -> Option<RawSnapshot> {
        let data: serde_json::Map<String, serde_json::Value> = entities
            .iter()
            .enumerate()
            .map(|(i, (name, location, attribute))| {
                (
                    format!("raw{i}"),
                    serde_json::json!({"name": name, "coords": location, "difficulty": attribute}),
                )
            })
            .collect();
        let payload = serde_json::json!({"coords": "3:145", "data": data, "timestamp": taken_at});
        parse_raw(&payload.to_string()).unwrap()
    }

    fn hours(h: f64) -> MinDelta {
        MinDelta::from_hours(h).unwrap()
    }

    #[test]
    fn record_reports_previous_timestamp() {
        let mut session = session();

        let first = session.record_scan(raw(1000, &[("A", "3:145:1", 10)]));
        let RecordOutcome::Saved(first) = first else {
            panic!("expected saved, got {first:?}");
        };
        assert_eq!(first.previous_taken_at, None);
        assert_eq!(first.entity_count, 1);

        let second = session.record_scan(raw(2000, &[]));
        let RecordOutcome::Saved(second) = second else {
            panic!("expected saved, got {second:?}");
        };
        assert_eq!(second.previous_taken_at, Some(1000));
        assert_eq!(second.saved_at, 2000);
    }

    #[test]
    fn null_payload_is_collection_failure() {
        let mut session = session();
        let outcome = session.record_scan(None);
        assert!(matches!(outcome, RecordOutcome::CollectionFailure { .. }));
        assert!(session.store().backend().is_empty());
    }

    #[test]
    fn malformed_entity_is_collection_failure() {
        let mut session = session();
        let outcome = session.record_scan(raw(1, &[("", "3:145:1", 0)]));
        assert!(matches!(outcome, RecordOutcome::CollectionFailure { .. }));
        assert!(matches!(session.last_scan("3:145"), LastScan::Empty { .. }));
    }

    #[test]
    fn compare_with_one_scan_is_no_history() {
        let mut session = session();
        session.record_scan(raw(1000, &[("A", "3:145:1", 10)]));
        assert_eq!(
            session.compare_scan("3:145", hours(6.0)),
            CompareResult::NoHistory {
                location_key: "3:145".to_string(),
                stored: 1
            }
        );
    }

    #[test]
    fn compare_does_not_touch_history() {
        let mut session = session();
        session.record_scan(raw(1000, &[("A", "3:145:1", 10)]));
        session.record_scan(raw(1000 + 7 * HOUR, &[("A", "3:145:1", 25)]));

        let before = session.store().load("3:145");
        session.compare_scan("3:145", hours(6.0));
        assert_eq!(session.store().load("3:145"), before);
    }

    #[test]
    fn out_of_order_history_reported() {
        let mut session = session();
        session.record_scan(raw(1000 + 7 * HOUR, &[("A", "3:145:1", 10)]));
        session.record_scan(raw(1000, &[("A", "3:145:1", 25)]));

        assert!(matches!(
            session.compare_scan("3:145", hours(6.0)),
            CompareResult::OutOfOrder { .. }
        ));
    }

    #[test]
    fn last_scan_reports_newest() {
        let mut session = session();
        session.record_scan(raw(1000, &[]));
        session.record_scan(raw(5000, &[("A", "3:145:1", 10)]));

        assert_eq!(
            session.last_scan("3:145"),
            LastScan::Found {
                location_key: "3:145".to_string(),
                taken_at: 5000,
                entity_count: 1,
                stored: 2
            }
        );
    }

    #[test]
    fn delete_outcomes() {
        let mut session = session();
        session.record_scan(raw(1000, &[]));

        assert!(matches!(
            session.delete_newest("3:145"),
            DeleteOutcome::DeletedNewest { remaining: 0, .. }
        ));
        assert!(matches!(
            session.delete_newest("3:145"),
            DeleteOutcome::NothingToDelete { .. }
        ));
        assert!(matches!(
            session.delete_all("3:145"),
            DeleteOutcome::Deleted { .. }
        ));
    }

    #[test]
    fn import_record_outcomes() {
        let mut session = session();
        let record = serde_json::json!([
            {"coords": "3:145", "data": {}, "timestamp": 3000},
            {"coords": "3:145", "data": {}, "timestamp": 2000},
            {"coords": "3:145", "data": {}, "timestamp": 1000}
        ])
        .to_string();

        assert_eq!(
            session.import_record("3:145", &record),
            ImportOutcome::Imported {
                location_key: "3:145".to_string(),
                stored: 2,
                newest_taken_at: Some(3000)
            }
        );
        assert!(matches!(
            session.import_record("3:146", &record),
            ImportOutcome::Rejected { .. }
        ));
        assert!(matches!(
            session.import_record("3:145", "not json"),
            ImportOutcome::Rejected { .. }
        ));
        assert_eq!(session.store().load("3:145").len(), 2);
    }

    #[test]
    fn compare_json_carries_entity_keys() {
        let mut session = session();
        session.record_scan(raw(1000, &[("A", "3:145:1", 10)]));
        session.record_scan(raw(
            1000 + 7 * HOUR,
            &[("A", "3:145:1", 25), ("B", "3:145:2", 5)],
        ));

        let value = serde_json::to_value(session.compare_scan("3:145", hours(6.0))).unwrap();
        assert_eq!(value["outcome"], "ok");
        assert_eq!(value["added"][0]["key"], "3:145:2_B");
        assert_eq!(value["added"][0]["difficulty"], 5);
        assert_eq!(value["changed"][0]["entity"]["key"], "3:145:1_A");
        assert_eq!(value["changed"][0]["old_attribute"], 10);
    }

    #[test]
    fn outcome_json_is_tagged() {
        let value = serde_json::to_value(CompareResult::TooSoon {
            location_key: "3:145".to_string(),
            delta_hours: 2.0,
            required_hours: 6.0,
        })
        .unwrap();
        assert_eq!(value["outcome"], "too_soon");
        assert_eq!(value["delta_hours"], 2.0);
    }
}
