//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use ponto_core::{CivilZone, EmployeeRecord, Roster, Tolerance, ValidationError};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Minutes after a scheduled time during which registration stays open.
    pub tolerance_minutes: u32,

    /// Offset of the civil timezone east of UTC, in minutes.
    pub utc_offset_minutes: i32,

    /// Abbreviation appended to stored stamps.
    pub timezone_abbreviation: String,

    /// Employee directory.
    #[serde(default)]
    pub employees: Vec<EmployeeRecord>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("tolerance_minutes", &self.tolerance_minutes)
            .field("utc_offset_minutes", &self.utc_offset_minutes)
            .field("timezone_abbreviation", &self.timezone_abbreviation)
            .field("employees", &self.employees.len())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("ponto.db"),
            tolerance_minutes: Tolerance::DEFAULT_MINUTES,
            utc_offset_minutes: CivilZone::DEFAULT_UTC_OFFSET_MINUTES,
            timezone_abbreviation: CivilZone::DEFAULT_ABBREVIATION.to_string(),
            employees: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (PONTO_*)
        figment = figment.merge(Env::prefixed("PONTO_").ignore(&["password"]));

        figment.extract()
    }

    pub const fn tolerance(&self) -> Tolerance {
        Tolerance::from_minutes(self.tolerance_minutes)
    }

    pub fn zone(&self) -> Result<CivilZone, ValidationError> {
        CivilZone::from_utc_offset_minutes(
            self.utc_offset_minutes,
            self.timezone_abbreviation.clone(),
        )
    }

    pub fn roster(&self) -> Roster {
        Roster::new(self.employees.iter().cloned())
    }
}

/// Returns the platform-specific config directory for ponto.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ponto"))
}

/// Returns the platform-specific data directory for ponto.
///
/// On Linux: `~/.local/share/ponto`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ponto"))
}
