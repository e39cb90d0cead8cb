//! Configuration handling for Pochita
//!
//! Configuration is stored in `.pochita/config.toml` (clinic) and
//! `~/.config/pochita/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{TransitionPolicy, DEFAULT_CANCELLATION_REASON, RESCHEDULE_REASON, SLOT_MINUTES};

/// Name of the per-clinic directory
pub const CLINIC_DIR: &str = ".pochita";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Scheduling rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Slot granularity in minutes; appointment lengths round up to it
    pub slot_minutes: u32,

    /// Whether appointment status changes follow the state machine
    pub transition_policy: TransitionPolicy,

    /// Reject bookings on dates before today
    pub reject_past_bookings: bool,

    /// Reject bookings on days the veterinarian has blocked
    pub respect_blocked_days: bool,

    /// Days of cancelled appointments surfaced as alerts
    pub alert_window_days: u32,

    /// Reason recorded on the original appointment of a reschedule
    pub reschedule_reason: String,

    /// Reason recorded when a cancellation gives none
    pub default_cancellation_reason: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: SLOT_MINUTES,
            transition_policy: TransitionPolicy::Strict,
            reject_past_bookings: true,
            respect_blocked_days: true,
            alert_window_days: 30,
            reschedule_reason: RESCHEDULE_REASON.to_string(),
            default_cancellation_reason: DEFAULT_CANCELLATION_REASON.to_string(),
        }
    }
}

impl SchedulingConfig {
    /// Checks values that would make scheduling meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_minutes == 0 || self.slot_minutes > 240 {
            return Err(ConfigError::Invalid(format!(
                "scheduling.slot_minutes must be between 1 and 240, got {}",
                self.slot_minutes
            )));
        }
        if self.alert_window_days == 0 {
            return Err(ConfigError::Invalid(
                "scheduling.alert_window_days must be positive".to_string(),
            ));
        }
        if self.reschedule_reason.trim().is_empty()
            || self.default_cancellation_reason.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "cancellation reasons must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Clinic identity and storage location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicInfo {
    /// Display name
    pub name: String,

    /// Database file, relative to `.pochita/`
    pub database: PathBuf,
}

impl Default for ClinicInfo {
    fn default() -> Self {
        Self {
            name: "Clínica Veterinaria".to_string(),
            database: PathBuf::from("clinic.db"),
        }
    }
}

/// Clinic-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    pub clinic: ClinicInfo,
    pub scheduling: SchedulingConfig,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Actor used when `--actor` is not given (e.g. `receptionist:2`)
    pub default_actor: Option<String>,
}

/// Combined configuration (global + clinic)
#[derive(Debug, Clone)]
pub struct Config {
    pub clinic: ClinicConfig,
    pub global: GlobalConfig,
    pub clinic_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let clinic_root = Self::find_clinic_root();
        let clinic = match &clinic_root {
            Some(root) => Self::load_clinic_config(root)?,
            None => ClinicConfig::default(),
        };

        Ok(Self {
            clinic,
            global,
            clinic_root,
        })
    }

    /// Loads configuration for a specific clinic
    pub fn for_clinic(clinic_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let clinic = Self::load_clinic_config(clinic_root)?;

        Ok(Self {
            clinic,
            global,
            clinic_root: Some(clinic_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("cl", "pochita", "pochita").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads clinic configuration from a specific root
    fn load_clinic_config(clinic_root: &Path) -> Result<ClinicConfig> {
        let config_path = clinic_root.join(CLINIC_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ClinicConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read clinic config: {}", config_path.display()))?;

        let config: ClinicConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse clinic config")?;

        config
            .scheduling
            .validate()
            .with_context(|| format!("Invalid clinic config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the clinic root by looking for a `.pochita/` directory
    pub fn find_clinic_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_clinic_root_from(&current)
    }

    /// Walks up from `start` looking for a `.pochita/` directory
    pub fn find_clinic_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(CLINIC_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the clinic root, or an error if not in a clinic
    pub fn require_clinic_root(&self) -> Result<&Path> {
        self.clinic_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a pochita clinic. Run 'pochita init' first."))
    }

    /// Saves the clinic configuration
    pub fn save_clinic(&self) -> Result<()> {
        let root = self.require_clinic_root()?;
        let config_path = root.join(CLINIC_DIR).join("config.toml");

        let content =
            toml::to_string_pretty(&self.clinic).context("Failed to serialize clinic config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write clinic config: {}", config_path.display()))
    }
}
