//! Minimum elapsed time between two compared snapshots.
//!
//! Scans taken too close together say nothing about NPC respawns, so a
//! comparison is only admitted once `min_delta` has passed between the
//! previous and the current snapshot. The boundary is inclusive and a
//! negative delta (clock skew, out-of-order history) is never admitted.

use std::time::Duration;

use crate::snapshot::Snapshot;

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// A validated, non-negative comparison interval, kept in whole milliseconds
/// so the inclusive boundary is an exact integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MinDelta {
    millis: i64,
}

impl MinDelta {
    /// Returns `None` for negative, NaN or out-of-range hour counts.
    /// Fractional hours are rounded to the nearest millisecond.
    pub fn from_hours(hours: f64) -> Option<Self> {
        let millis = (hours * MS_PER_HOUR).round();
        if millis.is_finite() && millis >= 0.0 && millis <= i64::MAX as f64 {
            Some(MinDelta {
                millis: millis as i64,
            })
        } else {
            None
        }
    }

    pub fn from_millis(millis: i64) -> Option<Self> {
        (millis >= 0).then_some(MinDelta { millis })
    }

    /// Sub-millisecond precision is dropped; absurdly long intervals saturate.
    pub fn from_duration(duration: Duration) -> Self {
        MinDelta {
            millis: i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn millis(self) -> i64 {
        self.millis
    }

    /// For display only; comparisons use [`millis`](Self::millis).
    pub fn hours(self) -> f64 {
        self.millis as f64 / MS_PER_HOUR
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Comparable,
    TooSoon { delta_hours: f64, required_hours: f64 },
    OutOfOrder { delta_hours: f64 },
}

fn delta_ms(current: &Snapshot, previous: &Snapshot) -> i64 {
    current.taken_at.saturating_sub(previous.taken_at)
}

pub fn is_comparable(current: &Snapshot, previous: &Snapshot, min_delta: MinDelta) -> bool {
    matches!(check(current, previous, min_delta), Verdict::Comparable)
}

pub fn check(current: &Snapshot, previous: &Snapshot, min_delta: MinDelta) -> Verdict {
    let delta = delta_ms(current, previous);
    let delta_hours = delta as f64 / MS_PER_HOUR;

    if delta < 0 {
        return Verdict::OutOfOrder { delta_hours };
    }

    if delta < min_delta.millis() {
        return Verdict::TooSoon {
            delta_hours,
            required_hours: min_delta.hours(),
        };
    }

    Verdict::Comparable
}
