//! Time-of-day windows during which attendance may be marked.

use crate::error::GeofenceError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named time-of-day range, inclusive at both ends.
///
/// A window whose `start` is after its `end` wraps past midnight
/// (e.g. `22:00-02:00`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceWindow {
    pub label: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl AttendanceWindow {
    pub fn new(label: impl Into<String>, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

impl fmt::Display for AttendanceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl FromStr for AttendanceWindow {
    type Err = GeofenceError;

    /// Parses `HH:MM-HH:MM`; whitespace around either bound is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeofenceError::InvalidWindow(s.to_string());
        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").map_err(|_| invalid())?;
        let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").map_err(|_| invalid())?;
        Ok(Self::new(s.trim(), start, end))
    }
}
