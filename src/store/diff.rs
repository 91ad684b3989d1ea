//! Snapshot comparison engine.
//!
//! Classifies every entity of the current snapshot against the previous one:
//! - matched by entity key (location + name, never the attribute)
//! - new: key absent from the previous snapshot
//! - changed: key present but the attribute differs
//! - unchanged entities are not reported
//!
//! Entities that disappeared since the previous snapshot are not reported.

use serde::Serialize;
use tracing::debug;

use crate::snapshot::{Entity, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    #[serde(serialize_with = "crate::snapshot::serialize_keyed")]
    pub entity: Entity,
    pub old_attribute: i64,
    pub new_attribute: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub added: Vec<Entity>,
    pub changed: Vec<Change>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty()
    }
}

/// Compare `current` against `previous`; output follows `current` insertion order.
pub fn diff(current: &Snapshot, previous: &Snapshot) -> Diff {
    let mut result = Diff::default();

    for entity in &current.entities {
        match previous.entities.get(&entity.key) {
            None => result.added.push(entity.clone()),
            Some(old) if old.attribute != entity.attribute => result.changed.push(Change {
                entity: entity.clone(),
                old_attribute: old.attribute,
                new_attribute: entity.attribute,
            }),
            Some(_) => {}
        }
    }

    debug!(
        location_key = %current.location_key,
        added = result.added.len(),
        changed = result.changed.len(),
        unchanged = current.entities.len() - result.added.len() - result.changed.len(),
        "snapshots compared"
    );

    result
}
