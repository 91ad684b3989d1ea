//! Snapshot data model.
//!
//! A snapshot is the full observation of one system ("G:S") at one instant:
//! - every entity seen, keyed by its stable identity
//! - the wall-clock time the scan was taken, in epoch milliseconds
//!
//! The serialized shape is the one the scan records have always used:
//! `{ "coords": "3:145", "data": { key: entity }, "timestamp": ms }`.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::key::build_key;

/// One observed entity (an NPC fleet or target) at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Filled from the enclosing map key, never stored inside the entity.
    #[serde(skip)]
    pub key: String,
    pub name: String,
    #[serde(rename = "coords", alias = "location")]
    pub location: String,
    /// Difficulty or level. Compared exactly, never with a tolerance.
    #[serde(rename = "difficulty", alias = "level", alias = "attribute")]
    pub attribute: i64,
}

impl Entity {
    pub fn new(key: String, name: &str, location: &str, attribute: i64) -> Self {
        Entity {
            key,
            name: name.to_string(),
            location: location.to_string(),
            attribute,
        }
    }
}

/// An entity with its key inlined, for output outside the record format.
#[derive(Serialize)]
struct Keyed<'a> {
    key: &'a str,
    #[serde(flatten)]
    entity: &'a Entity,
}

impl<'a> From<&'a Entity> for Keyed<'a> {
    fn from(entity: &'a Entity) -> Self {
        Keyed {
            key: &entity.key,
            entity,
        }
    }
}

/// `serialize_with` helper that writes the entity together with its key.
pub fn serialize_keyed<S: Serializer>(entity: &Entity, serializer: S) -> Result<S::Ok, S::Error> {
    Keyed::from(entity).serialize(serializer)
}

pub fn serialize_keyed_list<S: Serializer>(
    entities: &[Entity],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(entities.iter().map(Keyed::from))
}

/// Key-unique entity collection that remembers insertion order.
///
/// Inserting under an existing key replaces the old entity in place,
/// so the first insertion position is kept and the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMap {
    entries: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity under its own key, returning the entity it replaced.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        match self.index.get(&entity.key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos], entity)),
            None => {
                self.index.insert(entity.key.clone(), self.entries.len());
                self.entries.push(entity);
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a EntityMap {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for EntityMap {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<Entity> for EntityMap {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut map = EntityMap::new();
        for entity in iter {
            map.insert(entity);
        }
        map
    }
}

impl Serialize for EntityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entity in &self.entries {
            map.serialize_entry(&entity.key, entity)?;
        }
        map.end()
    }
}

struct EntityMapVisitor;

impl<'de> Visitor<'de> for EntityMapVisitor {
    type Value = EntityMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of entity key to entity")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<EntityMap, A::Error> {
        let mut map = EntityMap::new();
        while let Some((key, mut entity)) = access.next_entry::<String, Entity>()? {
            entity.key = key;
            map.insert(entity);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for EntityMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntityMapVisitor)
    }
}

/// The full observation of one location group at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "coords", alias = "locationKey")]
    pub location_key: String,
    #[serde(rename = "data", alias = "entities")]
    pub entities: EntityMap,
    #[serde(rename = "timestamp", alias = "takenAt")]
    pub taken_at: i64,
}

impl Snapshot {
    pub fn new(location_key: &str, taken_at: i64) -> Self {
        Snapshot {
            location_key: location_key.to_string(),
            entities: EntityMap::new(),
            taken_at,
        }
    }

    /// Rebuild every entity key from its location and name.
    ///
    /// Records written by early versions folded the level into the key.
    /// Entities whose location or name is empty keep their stored key.
    pub fn rekeyed(self) -> Snapshot {
        let entities = self
            .entities
            .into_iter()
            .map(|mut entity| {
                if let Ok(key) = build_key(&entity.location, &entity.name) {
                    entity.key = key;
                }
                entity
            })
            .collect();

        Snapshot {
            entities,
            ..self
        }
    }
}
