//! Clinic directory management
//!
//! Handles clinic initialization and provides access to the database.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use super::config::CLINIC_DIR;
use super::{Config, Database};

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("Not in a pochita clinic. Run 'pochita init' first.")]
    NotInClinic,

    #[error("Clinic directory not found at {0}")]
    Missing(PathBuf),
}

/// A clinic: a directory holding `.pochita/` with config and database
pub struct Clinic {
    root: PathBuf,
    config: Config,
}

impl Clinic {
    /// Opens an existing clinic at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(CLINIC_DIR).is_dir() {
            return Err(ClinicError::Missing(root).into());
        }

        let config = Config::for_clinic(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the clinic at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_clinic_root().ok_or(ClinicError::NotInClinic)?;

        Self::open(root)
    }

    /// Initializes a new clinic at the given path
    pub fn init(root: impl Into<PathBuf>, name: Option<&str>) -> Result<Self> {
        let root = root.into();
        let clinic_dir = root.join(CLINIC_DIR);

        fs::create_dir_all(&clinic_dir).with_context(|| {
            format!("Failed to create {} directory: {}", CLINIC_DIR, clinic_dir.display())
        })?;

        let config_path = clinic_dir.join("config.toml");
        if !config_path.exists() {
            let name = name.unwrap_or("Clínica Veterinaria").replace('"', "'");
            let default_config = format!(
                r#"# Pochita clinic configuration

[clinic]
name = "{name}"
# Database file, relative to this directory
database = "clinic.db"

[scheduling]
# Appointment lengths round up to this many minutes
slot_minutes = 15
# "strict" follows pending -> confirmed -> attended / cancelled,
# "permissive" accepts any status change
transition_policy = "strict"
reject_past_bookings = true
respect_blocked_days = true
# Days of cancellations shown as alerts
alert_window_days = 30
reschedule_reason = "Replanificada"
default_cancellation_reason = "Cancelada sin motivo especificado"
"#
            );
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = clinic_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Clinic data is not source code
*.db
*.db-wal
*.db-shm
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let clinic = Self::open(root)?;
        // Creates the schema
        clinic.database()?;
        info!(root = %clinic.root.display(), "clinic initialized");

        Ok(clinic)
    }

    /// Returns the clinic root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .pochita directory path
    pub fn clinic_dir(&self) -> PathBuf {
        self.root.join(CLINIC_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.clinic_dir().join(&self.config.clinic.clinic.database)
    }

    /// Opens the clinic database
    pub fn database(&self) -> Result<Database> {
        let path = self.database_path();
        Database::open(&path)
            .with_context(|| format!("Failed to open clinic database: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let clinic = Clinic::init(dir.path(), Some("Pochita")).unwrap();

        assert!(clinic.clinic_dir().is_dir());
        assert!(clinic.clinic_dir().join("config.toml").is_file());
        assert!(clinic.clinic_dir().join(".gitignore").is_file());
        assert!(clinic.database_path().is_file());
        assert_eq!(clinic.config().clinic.clinic.name, "Pochita");
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Clinic::init(dir.path(), None).unwrap();
        Clinic::init(dir.path(), None).unwrap(); // Should not fail

        assert!(dir.path().join(CLINIC_DIR).is_dir());
    }

    #[test]
    fn generated_config_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        let clinic = Clinic::init(dir.path(), None).unwrap();

        assert_eq!(
            clinic.config().clinic.scheduling,
            crate::storage::SchedulingConfig::default()
        );
    }

    #[test]
    fn open_existing_clinic() {
        let dir = TempDir::new().unwrap();
        Clinic::init(dir.path(), None).unwrap();

        let clinic = Clinic::open(dir.path()).unwrap();
        assert_eq!(clinic.root(), dir.path());
    }

    #[test]
    fn open_non_clinic_fails() {
        let dir = TempDir::new().unwrap();
        let result = Clinic::open(dir.path());

        assert!(result.is_err());
    }
}
