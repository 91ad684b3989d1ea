//! Entity identity.
//!
//! Keys are built from the immutable attributes of an entity only:
//! - location (the full "G:S:P" triple)
//! - name
//!
//! The volatile attribute (difficulty or level) is never part of the key,
//! otherwise every attribute change would look like a brand new entity.
//! Two entities sharing both location and name collide onto one key.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("entity has an empty location")]
    EmptyLocation,
    #[error("entity at {0} has an empty name")]
    EmptyName(String),
}

/// Build the stable identity for an entity at `location` named `name`.
///
/// Format is `{location}_{name}`, the same shape older stored records use.
pub fn build_key(location: &str, name: &str) -> Result<String, KeyError> {
    let location = location.trim();
    let name = name.trim();

    if location.is_empty() {
        return Err(KeyError::EmptyLocation);
    }
    if name.is_empty() {
        return Err(KeyError::EmptyName(location.to_string()));
    }

    Ok(format!("{location}_{name}"))
}
