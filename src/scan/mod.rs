//! Collector contract.
//!
//! The collector (a userscript reading the galaxy page) hands over a raw
//! payload per observed system. This module:
//! - parses that payload, where `null` means "could not observe"
//! - applies the scan filter (attribute range, target names)
//! - rebuilds every entity key so identity never depends on the collector

pub mod filter;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::key::{build_key, KeyError};
use crate::snapshot::{Entity, EntityMap, Snapshot};
use filter::ScanFilter;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("collector could not observe the page")]
    NotObserved,
    #[error("collector payload is not valid: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("collector payload has an empty location key")]
    EmptyLocationKey,
    #[error("collector payload has a malformed entity: {0}")]
    BadEntity(#[from] KeyError),
}

/// Raw snapshot exactly as the collector produced it.
///
/// Entity keys in `entities` are whatever the collector used and are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSnapshot {
    #[serde(rename = "coords", alias = "locationKey")]
    pub location_key: String,
    #[serde(rename = "data", alias = "entities", default)]
    pub entities: EntityMap,
    #[serde(rename = "timestamp", alias = "takenAt", default)]
    pub taken_at: Option<i64>,
}

/// Parse a collector payload. `Ok(None)` is the collector's `null`.
pub fn parse_raw(json: &str) -> Result<Option<RawSnapshot>, CollectError> {
    Ok(serde_json::from_str::<Option<RawSnapshot>>(json)?)
}

/// What survived conversion, plus how many entities the filter dropped.
#[derive(Debug)]
pub struct Collected {
    pub snapshot: Snapshot,
    pub filtered_out: usize,
}

/// Turn a raw payload into a snapshot, stamping `now_ms` when the collector
/// did not provide a timestamp.
pub fn into_snapshot(
    raw: RawSnapshot,
    filter: &ScanFilter,
    now_ms: i64,
) -> Result<Collected, CollectError> {
    let location_key = raw.location_key.trim();
    if location_key.is_empty() {
        return Err(CollectError::EmptyLocationKey);
    }

    let mut snapshot = Snapshot::new(location_key, raw.taken_at.unwrap_or(now_ms));
    let mut filtered_out = 0;

    for entity in raw.entities {
        let key = build_key(&entity.location, &entity.name)?;

        if !filter.accepts(&entity) {
            debug!(
                name = %entity.name,
                attribute = entity.attribute,
                "entity ignored by scan filter"
            );
            filtered_out += 1;
            continue;
        }

        let location = entity.location.trim();
        let name = entity.name.trim();
        snapshot
            .entities
            .insert(Entity::new(key, name, location, entity.attribute));
    }

    debug!(
        location_key = %snapshot.location_key,
        kept = snapshot.entities.len(),
        filtered_out,
        "collector payload converted"
    );

    Ok(Collected {
        snapshot,
        filtered_out,
    })
}
