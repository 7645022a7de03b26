//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cradle_core::ScheduleConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Expected intervals between scheduled events.
    pub schedule: ScheduleConfig,

    /// Seconds between refreshes in `cradle watch`.
    pub refresh_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("schedule", &self.schedule)
            .field("refresh_seconds", &self.refresh_seconds)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("cradle.db"),
            schedule: ScheduleConfig::default(),
            refresh_seconds: 60,
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

        // CRADLE_SCHEDULE__FEEDING_HOURS sets schedule.feeding_hours
        figment = figment.merge(Env::prefixed("CRADLE_").split("__"));

        figment.extract()
    }

    /// Refresh period for the watch loop, never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_seconds.max(1))
    }
}

/// Returns the platform-specific config directory for cradle.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cradle"))
}

/// Returns the platform-specific data directory for cradle.
///
/// On Linux: `~/.local/share/cradle`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("cradle"))
}
