//! Status lines for every session outcome.
//!
//! Each outcome renders to exactly one human-readable status line; a
//! successful comparison also renders the table of new and changed targets.

pub mod json;
pub mod table;

use crate::session::{CompareResult, DeleteOutcome, ImportOutcome, LastScan, RecordOutcome};
use crate::util::{format_hours, format_interval, format_timestamp};

pub fn record_status(outcome: &RecordOutcome) -> String {
    match outcome {
        RecordOutcome::Saved(saved) => {
            let mut message = format!(
                "Scan for {} saved ({} targets).",
                saved.location_key, saved.entity_count
            );
            if saved.filtered_out > 0 {
                message.push_str(&format!(" {} ignored by filter.", saved.filtered_out));
            }
            if let Some(previous) = saved.previous_taken_at {
                message.push_str(&format!(
                    " Previous scan was from {}.",
                    format_timestamp(previous)
                ));
            }
            message
        }
        RecordOutcome::CollectionFailure { reason } => {
            format!("Error: unable to save, the scan could not be read ({reason}).")
        }
        RecordOutcome::StorageFailure { reason } => {
            format!("Error: unable to save the scan ({reason}).")
        }
    }
}

pub fn compare_status(result: &CompareResult) -> String {
    match result {
        CompareResult::NoHistory {
            location_key,
            stored,
        } => format!(
            "Not enough scans for {location_key} ({stored} saved). Please save at least two scans."
        ),
        CompareResult::TooSoon {
            delta_hours,
            required_hours,
            ..
        } => format!(
            "Interval between scans is too short ({}). Minimum required: {}.",
            format_interval(*delta_hours),
            format_interval(*required_hours)
        ),
        CompareResult::OutOfOrder {
            location_key,
            delta_hours,
        } => format!(
            "Newest scan for {location_key} is older than the previous one ({}). Delete the last scan and rescan.",
            format_hours(*delta_hours)
        ),
        CompareResult::Ok {
            location_key,
            added,
            changed,
            previous_taken_at,
            ..
        } => {
            let found = added.len() + changed.len();
            if found == 0 {
                format!(
                    "No new targets for {location_key} since {}.",
                    format_timestamp(*previous_taken_at)
                )
            } else {
                format!(
                    "{found} targets found for {location_key} (scanned after {}).",
                    format_timestamp(*previous_taken_at)
                )
            }
        }
    }
}

pub fn last_status(last: &LastScan) -> String {
    match last {
        LastScan::Found {
            location_key,
            taken_at,
            entity_count,
            stored,
        } => format!(
            "The last scan for {location_key} was saved on {} ({entity_count} targets, {stored} scans kept).",
            format_timestamp(*taken_at)
        ),
        LastScan::Empty { location_key } => format!("No scans found for {location_key}."),
    }
}

pub fn delete_status(outcome: &DeleteOutcome) -> String {
    match outcome {
        DeleteOutcome::Deleted { location_key } => format!("Scans for {location_key} deleted."),
        DeleteOutcome::DeletedNewest {
            location_key,
            remaining,
        } => format!("Last scan for {location_key} deleted ({remaining} left)."),
        DeleteOutcome::NothingToDelete { location_key } => {
            format!("No scans to delete for {location_key}.")
        }
        DeleteOutcome::StorageFailure { reason } => format!("Error: delete failed ({reason})."),
    }
}

pub fn import_status(outcome: &ImportOutcome) -> String {
    match outcome {
        ImportOutcome::Imported {
            location_key,
            stored,
            newest_taken_at: Some(newest),
        } => format!(
            "Imported {stored} scans for {location_key} (newest from {}).",
            format_timestamp(*newest)
        ),
        ImportOutcome::Imported { location_key, .. } => {
            format!("Imported an empty history for {location_key}.")
        }
        ImportOutcome::Rejected { reason } => format!("Error: import failed ({reason})."),
    }
}
