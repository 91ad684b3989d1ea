//! JSON output for session outcomes.
//!
//! Serializes any outcome for scripting and piping.

use serde::Serialize;

pub fn render<T: Serialize>(outcome: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}
