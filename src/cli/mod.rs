//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Clinic setup | `init`, `status` |
//! | Registry | People and services | `client register`, `pet add`, `staff add`, `service add` |
//! | Availability | Veterinarian schedules | `availability add`, `day toggle` |
//! | Appointments | Booking lifecycle | `appointment book`, `appointment cancel`, `appointment reschedule` |
//! | Reports | Daily views | `today`, `alerts`, `history` |
//!
//! ## Acting User
//!
//! Every command runs as an actor given by `--actor role[:id]` or
//! `POCHITA_ACTOR`, e.g. `receptionist:2`, `veterinarian:1`, `client:5`.
//! Without one the global `default_actor` is used, then the clinic operator.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON; failures go to stderr with an error code
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! pochita --verbose today
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod logging;
mod registry_cmd;
mod availability;
mod appointment;
mod report;

pub use app::{run, Cli, Commands, Session};
pub use output::{Output, OutputFormat, Reported};
