//! Time ranges and slot arithmetic
//!
//! All ranges are half-open: `[start, end)`. A range ending at 10:00 and
//! another starting at 10:00 touch but do not overlap.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Default clinic slot granularity in minutes
pub const SLOT_MINUTES: u32 = 15;

/// Half-open time range within one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeRange {
    /// Creates a range, rejecting `end <= start`
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Half-open overlap test
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Length of the range in minutes
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Rounds `duration_min` up to a multiple of `slot_min`
///
/// A zero or unknown duration becomes one slot. Saturates at `u32::MAX`.
pub fn round_up_to_slot(duration_min: Option<u32>, slot_min: u32) -> u32 {
    let slot = slot_min.max(1);
    match duration_min {
        Some(d) if d > 0 => d.div_ceil(slot).saturating_mul(slot),
        _ => slot,
    }
}

/// End time of an appointment starting at `start` with the given duration
///
/// Fails with `invalid_range` when the rounded duration runs past midnight.
pub fn slot_end(
    start: NaiveTime,
    duration_min: Option<u32>,
    slot_min: u32,
) -> Result<NaiveTime, ValidationError> {
    let minutes = round_up_to_slot(duration_min, slot_min);
    let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(i64::from(minutes)));

    // Landing exactly on midnight also wraps to 00:00, which is not after start
    if wrapped != 0 || end <= start {
        return Err(ValidationError::InvalidRange { start, end });
    }
    Ok(end)
}

/// Parses a 24-hour `HH:MM` (or `HH:MM:SS`) time, truncated to the minute
pub fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(truncate_to_minute)
        .map_err(|_| ValidationError::InvalidFormat {
            field: "time",
            value: value.to_string(),
        })
}

/// Drops seconds and sub-second precision
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Calendar month, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month {
    first: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// Month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first.pred_opt().unwrap_or(self.first)
    }

    pub fn next(&self) -> Self {
        let (year, month) = if self.first.month() == 12 {
            (self.first.year() + 1, 1)
        } else {
            (self.first.year(), self.first.month() + 1)
        };
        Self::new(year, month).unwrap_or(*self)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

impl std::str::FromStr for Month {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "month",
            value: s.to_string(),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Serde adapter for `HH:MM` times
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_time(&s).map_err(serde::de::Error::custom)
    }
}
