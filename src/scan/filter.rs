use serde::{Deserialize, Serialize};

use crate::snapshot::Entity;

/// Which collected entities are worth keeping.
///
/// Unset bounds are unbounded; an empty name list keeps every name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanFilter {
    pub min_attribute: Option<i64>,
    pub max_attribute: Option<i64>,
    pub target_names: Vec<String>,
}

impl ScanFilter {
    pub fn accepts(&self, entity: &Entity) -> bool {
        let above_min = self.min_attribute.map_or(true, |min| entity.attribute >= min);
        let below_max = self.max_attribute.map_or(true, |max| entity.attribute <= max);
        let name = entity.name.trim();
        let wanted = self.target_names.is_empty()
            || self.target_names.iter().any(|target| target.trim() == name);

        above_min && below_max && wanted
    }
}
