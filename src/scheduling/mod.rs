//! # Scheduling Service
//!
//! Orchestrates the availability store and the appointment ledger on
//! behalf of an [`Actor`].
//!
//! ## Operations
//!
//! | Area | Operations |
//! |------|------------|
//! | Availability | create/update/delete block, list by month |
//! | Blocked days | toggle, block, unblock, list by month |
//! | Appointments | book, set status, cancel-and-reschedule, show |
//! | Reports | today, cancellation alerts, client history, per veterinarian |
//! | Registry | register client, pets, staff, services |
//!
//! Each mutation is one transaction: the validation reads run inside the
//! same `BEGIN IMMEDIATE` transaction as the write that depends on them.

mod actor;
mod scheduler;
mod appointments;
mod reports;
mod registry;

#[cfg(test)]
mod testing;

pub use actor::{Actor, Operation};
pub use scheduler::Scheduler;
