//! # Storage Layer
//!
//! Persistence for the clinic in a single SQLite database.
//!
//! ## Tables
//!
//! | Data | Table | Notes |
//! |------|-------|-------|
//! | Availability blocks | `availability_blocks` | never overlapping per veterinarian/day |
//! | Blocked days | `blocked_days` | unique per veterinarian/date |
//! | Appointments | `appointments` | cascade on client, SET NULL on service |
//! | Registry | `clients`, `pets`, `staff`, `services` | |
//!
//! ## Concurrency Safety
//!
//! - Every mutation runs in [`Database::write`] (`BEGIN IMMEDIATE`)
//! - Validation reads happen inside that transaction, never before it
//! - WAL journal so readers are not blocked by a writer
//!
//! ## Clinic Structure
//!
//! ```text
//! .pochita/
//! ├── config.toml     # Clinic configuration
//! ├── clinic.db       # SQLite database
//! └── .gitignore      # Ignores the database files
//! ```

mod config;
mod clinic;
mod db;
mod sql;
mod availability;
mod ledger;
mod registry;

pub use config::{
    ClinicConfig, ClinicInfo, Config, ConfigError, GlobalConfig, OutputFormat, SchedulingConfig,
    CLINIC_DIR,
};
pub use clinic::{Clinic, ClinicError};
pub use db::Database;
pub use availability::AvailabilityRepo;
pub use ledger::{AgendaFilter, LedgerRepo, NewAppointment};
pub use registry::RegistryRepo;
