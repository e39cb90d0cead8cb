//! Pochita - Appointment scheduling for a veterinary clinic
//!
//! Veterinarians publish availability blocks and block whole days; the
//! front desk books, confirms, cancels and reschedules appointments; the
//! clinic reviews today's agenda and recent cancellations.
//!
//! The [`scheduling::Scheduler`] is the entry point for every operation.
//! It checks the acting user's capabilities and runs each mutation in a
//! single SQLite transaction.

pub mod domain;
pub mod error;
pub mod storage;
pub mod scheduling;
pub mod cli;

pub use domain::{
    Appointment, AppointmentId, AppointmentStatus, AvailabilityBlock, BlockedDay, Role, StaffId,
};
pub use error::{Error, Result};
pub use scheduling::{Actor, Scheduler};
