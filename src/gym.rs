use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// A single occupancy reading of the gym.
///
/// The timestamp is always held in UTC, so two readings taken at the same
/// instant compare equal no matter which offset they were created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utilization {
    pub timestamp: DateTime<Utc>,
    pub people: u64,
    pub capacity: u64,
}

impl Utilization {
    pub fn new<Tz: TimeZone>(timestamp: DateTime<Tz>, people: u64, capacity: u64) -> Self {
        Self {
            timestamp: timestamp.with_timezone(&Utc),
            people,
            capacity,
        }
    }

    /// Occupancy as a percentage of capacity.
    ///
    /// Returns `None` when the capacity is zero. Values above 100 are
    /// possible when the gym is over capacity.
    pub fn percent(&self) -> Option<f64> {
        if self.capacity == 0 {
            return None;
        }

        Some(100.0 * self.people as f64 / self.capacity as f64)
    }
}

impl fmt::Display for Utilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.people,
            self.capacity
        )
    }
}
