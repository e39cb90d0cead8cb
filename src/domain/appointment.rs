//! Appointment domain model
//!
//! An appointment books a veterinarian for one client's pet. Its status
//! follows a small state machine:
//!
//! ```text
//! pending ──► confirmed ──► attended
//!    │            │
//!    └──► cancelled ◄┘
//! ```
//!
//! `attended` and `cancelled` are terminal. Whether the graph is enforced is
//! decided by [`TransitionPolicy`].

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::id::{AppointmentId, ClientId, PetId, ServiceId, VeterinarianId};
use super::people::Role;
use super::slot::hhmm;

/// Reason recorded when an appointment is cancelled without one
pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelada sin motivo especificado";

/// Reason recorded on the original appointment of a reschedule
pub const RESCHEDULE_REASON: &str = "Replanificada";

/// Status of an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Attended,
    Cancelled,
}

impl AppointmentStatus {
    /// Returns true if no further transition is allowed by the state machine
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Attended | AppointmentStatus::Cancelled)
    }

    /// States reachable in one step
    pub fn next_states(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => &[AppointmentStatus::Attended, AppointmentStatus::Cancelled],
            AppointmentStatus::Attended | AppointmentStatus::Cancelled => &[],
        }
    }

    /// Returns true if the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.next_states().contains(&next)
    }

    /// Returns all valid status values
    pub fn all() -> &'static [AppointmentStatus] {
        &[
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Attended,
            AppointmentStatus::Cancelled,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Attended => "attended",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(AppointmentStatus::Pending),
            "confirmed" | "confirmada" => Ok(AppointmentStatus::Confirmed),
            "attended" | "atendida" => Ok(AppointmentStatus::Attended),
            "cancelled" | "canceled" | "cancelada" => Ok(AppointmentStatus::Cancelled),
            _ => Err(ValidationError::UnknownStatus(s.to_string())),
        }
    }
}

/// How status changes are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Only the transitions of the state machine are allowed
    #[default]
    Strict,
    /// Any of the four statuses may follow any other
    Permissive,
}

impl TransitionPolicy {
    /// Checks a transition; re-applying the current status is always allowed
    pub fn check(
        &self,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<(), ValidationError> {
        if from == to || *self == TransitionPolicy::Permissive || from.can_transition_to(to) {
            return Ok(());
        }
        Err(ValidationError::InvalidTransition { from, to })
    }
}

/// A booked appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub veterinarian: VeterinarianId,
    pub client: ClientId,
    pub pet: PetId,
    /// None when no service was chosen or the service was deleted later
    pub service: Option<ServiceId>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<Role>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Returns true if cancelled with a recorded reason
    pub fn needs_follow_up(&self) -> bool {
        self.status == AppointmentStatus::Cancelled && self.cancellation_reason.is_some()
    }
}

/// Booking request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub client: ClientId,
    pub pet: PetId,
    #[serde(default)]
    pub service: Option<ServiceId>,
    pub veterinarian: VeterinarianId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// Explicit end; computed from the service duration when absent
    #[serde(default, with = "optional_hhmm", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub notes: String,
}

/// Status change request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub appointment: AppointmentId,
    /// Raw status token, validated against the known statuses
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Cancel-and-reschedule request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub appointment: AppointmentId,
    /// New veterinarian; the original one when absent
    #[serde(default)]
    pub veterinarian: Option<VeterinarianId>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Both sides of a reschedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rescheduled {
    pub cancelled: Appointment,
    pub replacement: Appointment,
}

mod optional_hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => super::hhmm::serialize(t, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| crate::domain::slot::parse_time(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
