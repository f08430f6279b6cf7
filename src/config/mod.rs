//! Persistent reporting and cycle settings.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::persistence::write_file_atomically;

const DEFAULT_DIR_NAME: &str = ".tuition_ledger";
const CONFIG_FILE: &str = "config.json";
const HOME_ENV: &str = "TUITION_LEDGER_HOME";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub cycles: CycleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportingConfig {
    /// Rows requested per legacy page; paging stops on the first short page.
    #[serde(default = "ReportingConfig::default_page_size")]
    pub legacy_page_size: usize,
    #[serde(default = "ReportingConfig::default_page_timeout_ms")]
    pub page_timeout_ms: u64,
    #[serde(default = "ReportingConfig::default_horizon_days")]
    pub upcoming_horizon_days: i64,
    /// Number of most recent months kept in the monthly revenue series.
    #[serde(default = "ReportingConfig::default_revenue_months")]
    pub revenue_months: usize,
}

impl ReportingConfig {
    fn default_page_size() -> usize {
        1000
    }

    fn default_page_timeout_ms() -> u64 {
        5_000
    }

    fn default_horizon_days() -> i64 {
        30
    }

    fn default_revenue_months() -> usize {
        6
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            legacy_page_size: Self::default_page_size(),
            page_timeout_ms: Self::default_page_timeout_ms(),
            upcoming_horizon_days: Self::default_horizon_days(),
            revenue_months: Self::default_revenue_months(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CycleConfig {
    /// Rejects assigning or editing a cycle whose range overlaps another non-archived
    /// cycle of the same account. Off by default to match historical data.
    #[serde(default)]
    pub reject_overlapping_cycles: bool,
}

/// Loads and saves [`Config`] under the application data directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        Self {
            path: base.join(CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns defaults when no file has been saved yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        write_file_atomically(&self.path, &json)?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the application data directory, defaulting to `~/.tuition_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}
