//! Typed record identifiers
//!
//! Every record is keyed by the SQLite rowid it was assigned on insert.
//! Each kind of record gets its own newtype so a pet id can never be passed
//! where an appointment id is expected.
//!
//! IDs display as plain numbers. Parsing also accepts a leading `#`
//! (e.g. `#7`), the way staff usually refer to appointments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid {kind} id: expected a positive number, got '{value}'")]
    Invalid { kind: &'static str, value: String },
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw rowid
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw rowid
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Human-readable kind, used in error messages
            pub const fn kind() -> &'static str {
                $kind
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
                match digits.parse::<i64>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(IdError::Invalid {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

record_id!(
    /// Staff member (veterinarian, receptionist or administrator)
    StaffId,
    "staff"
);
record_id!(ClientId, "client");
record_id!(PetId, "pet");
record_id!(ServiceId, "service");
record_id!(
    /// Availability block of a veterinarian
    BlockId,
    "availability block"
);
record_id!(BlockedDayId, "blocked day");
record_id!(AppointmentId, "appointment");

/// A veterinarian is a staff member; the alias documents intent at call sites
pub type VeterinarianId = StaffId;
