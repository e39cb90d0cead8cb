//! Domain error taxonomy
//!
//! [`ValidationError`] is always recoverable: it means the request was
//! rejected before anything was written. [`NotFoundError`] means a
//! referenced record does not exist.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use super::appointment::AppointmentStatus;
use super::id::{
    AppointmentId, BlockId, BlockedDayId, ClientId, PetId, ServiceId, StaffId,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("End time {end} must be after start time {start}")]
    InvalidRange { start: NaiveTime, end: NaiveTime },

    #[error("Cannot schedule on {date}: the date is in the past (today is {today})")]
    PastDate { date: NaiveDate, today: NaiveDate },

    #[error("The range {start}-{end} overlaps availability block {existing} on the same day")]
    Overlap {
        existing: BlockId,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Unknown status: '{0}'")]
    UnknownStatus(String),

    #[error("Pet {pet} does not belong to client {client}")]
    PetOwnership { pet: PetId, client: ClientId },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Cannot move an appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Veterinarian {veterinarian} has blocked {date}")]
    BlockedDay {
        veterinarian: StaffId,
        date: NaiveDate,
    },

    #[error("Service duration must be between 1 and 1440 minutes, got {0}")]
    InvalidDuration(u32),

    #[error("A client with email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("Staff member {0} is not a veterinarian")]
    NotVeterinarian(StaffId),

    #[error("Unknown role: '{0}'")]
    UnknownRole(String),

    #[error("Invalid {field}: '{value}'")]
    InvalidFormat { field: &'static str, value: String },
}

impl ValidationError {
    /// Stable machine-readable token for the failure
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidRange { .. } => "invalid_range",
            ValidationError::PastDate { .. } => "past_date",
            ValidationError::Overlap { .. } => "overlap",
            ValidationError::UnknownStatus(_) => "unknown_status",
            ValidationError::PetOwnership { .. } => "pet_ownership",
            ValidationError::MissingFields(_) => "missing_fields",
            ValidationError::InvalidTransition { .. } => "invalid_transition",
            ValidationError::BlockedDay { .. } => "blocked_day",
            ValidationError::InvalidDuration(_) => "invalid_duration",
            ValidationError::DuplicateEmail(_) => "duplicate_email",
            ValidationError::NotVeterinarian(_) => "not_veterinarian",
            ValidationError::UnknownRole(_) => "unknown_role",
            ValidationError::InvalidFormat { .. } => "invalid_format",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotFoundError {
    #[error("Availability block not found: {0}")]
    Block(BlockId),

    #[error("Blocked day not found: {0}")]
    BlockedDay(BlockedDayId),

    #[error("Appointment not found: {0}")]
    Appointment(AppointmentId),

    #[error("Client not found: {0}")]
    Client(ClientId),

    #[error("Pet not found: {0}")]
    Pet(PetId),

    #[error("Veterinarian not found: {0}")]
    Veterinarian(StaffId),

    #[error("Staff member not found: {0}")]
    Staff(StaffId),

    #[error("Service not found: {0}")]
    Service(ServiceId),
}

impl NotFoundError {
    /// Stable machine-readable token for the missing record kind
    pub fn code(&self) -> &'static str {
        match self {
            NotFoundError::Block(_) => "block_not_found",
            NotFoundError::BlockedDay(_) => "blocked_day_not_found",
            NotFoundError::Appointment(_) => "appointment_not_found",
            NotFoundError::Client(_) => "client_not_found",
            NotFoundError::Pet(_) => "pet_not_found",
            NotFoundError::Veterinarian(_) => "veterinarian_not_found",
            NotFoundError::Staff(_) => "staff_not_found",
            NotFoundError::Service(_) => "service_not_found",
        }
    }
}
