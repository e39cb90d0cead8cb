//! Veterinarian availability
//!
//! A veterinarian publishes time blocks per day (available, unavailable or
//! blocked) and may block whole days. Blocks of the same veterinarian on the
//! same day never overlap; [`validate_block`] is the single place that rule
//! is checked.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::id::{BlockId, BlockedDayId, VeterinarianId};
use super::slot::{hhmm, TimeRange};

/// Status of an availability block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Unavailable,
    Blocked,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Unavailable => "unavailable",
            AvailabilityStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for AvailabilityStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" | "disponible" => Ok(AvailabilityStatus::Available),
            "unavailable" | "no_disponible" | "no-disponible" => {
                Ok(AvailabilityStatus::Unavailable)
            }
            "blocked" | "bloqueado" => Ok(AvailabilityStatus::Blocked),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

/// A persisted availability block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: BlockId,
    pub veterinarian: VeterinarianId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AvailabilityStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AvailabilityBlock {
    /// The block's time range
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Candidate block submitted for creation or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDraft {
    pub veterinarian: VeterinarianId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: AvailabilityStatus,
}

/// A day the veterinarian does not work at all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedDay {
    pub id: BlockedDayId,
    pub veterinarian: VeterinarianId,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Outcome of toggling a blocked day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DayToggle {
    Blocked(BlockedDay),
    Unblocked { veterinarian: VeterinarianId, date: NaiveDate },
}

impl DayToggle {
    /// Returns true if the day is blocked after the toggle
    pub fn is_blocked(&self) -> bool {
        matches!(self, DayToggle::Blocked(_))
    }
}

/// Checks a candidate block against the other blocks of its veterinarian/day
///
/// `existing` may contain blocks of any veterinarian or date; only those
/// matching the candidate are considered. `editing` excludes the block being
/// updated from the comparison.
pub fn validate_block(
    candidate: &BlockDraft,
    existing: &[AvailabilityBlock],
    editing: Option<BlockId>,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    let range = TimeRange::new(candidate.start_time, candidate.end_time)?;

    if candidate.date < today {
        return Err(ValidationError::PastDate {
            date: candidate.date,
            today,
        });
    }

    let clash = existing
        .iter()
        .filter(|b| b.veterinarian == candidate.veterinarian && b.date == candidate.date)
        .filter(|b| Some(b.id) != editing)
        .find(|b| range.overlaps(&b.range()));

    match clash {
        Some(block) => Err(ValidationError::Overlap {
            existing: block.id,
            start: block.start_time,
            end: block.end_time,
        }),
        None => Ok(()),
    }
}

/// Rejects blocked-day mutations on past dates
pub fn validate_day_mutation(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if date < today {
        return Err(ValidationError::PastDate { date, today });
    }
    Ok(())
}
