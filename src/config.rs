//! Application configuration loading from config.toml and the environment.
//!
//! Every field has a default so a missing config file is not an error; the
//! file location itself can be overridden with `DATAGOV_CONFIG`, and the two
//! deployment-sensitive values (remote base URL, database path) can also be
//! overridden with dedicated environment variables.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

fn default_remote_base_url() -> String {
    "https://datagov-default-rtdb.firebaseio.com".to_string()
}

fn default_database_path() -> String {
    "data/datagov.sqlite3".to_string()
}

/// Periodic check cadence. Coarse on purpose: new projects land on the
/// order of days, and the scheduler only guarantees eventual delivery.
const fn default_check_interval_minutes() -> u64 {
    60
}

/// Delay before the first check after startup.
const fn default_check_initial_delay_minutes() -> u64 {
    15
}

/// Top-level application configuration, parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote document store REST endpoint.
    #[serde(default = "default_remote_base_url")]
    pub remote_base_url: String,

    /// Filesystem path of the local sqlite database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Repeat interval of the periodic new-project check, in minutes.
    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,

    /// Initial delay before the first scheduled check, in minutes.
    #[serde(default = "default_check_initial_delay_minutes")]
    pub check_initial_delay_minutes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote_base_url: default_remote_base_url(),
            database_path: default_database_path(),
            check_interval_minutes: default_check_interval_minutes(),
            check_initial_delay_minutes: default_check_initial_delay_minutes(),
        }
    }
}

impl AppConfig {
    /// Repeat interval of the periodic checker as a [`Duration`].
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes * 60)
    }

    /// Initial delay of the periodic checker as a [`Duration`].
    #[must_use]
    pub const fn check_initial_delay(&self) -> Duration {
        Duration::from_secs(self.check_initial_delay_minutes * 60)
    }
}

/// Loads the application configuration.
///
/// Reads the TOML file named by `DATAGOV_CONFIG` (default `config.toml`);
/// a missing file yields the built-in defaults. `DATAGOV_REMOTE_URL` and
/// `DATAGOV_DATABASE_PATH` override the corresponding fields afterwards.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("DATAGOV_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

    let mut config = if Path::new(&path).exists() {
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {path}: {e}")))?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {path}: {e}")))?
    } else {
        info!("No config file at {}; using built-in defaults", path);
        AppConfig::default()
    };

    if let Ok(url) = std::env::var("DATAGOV_REMOTE_URL") {
        debug!("Overriding remote_base_url from environment");
        config.remote_base_url = url;
    }
    if let Ok(db_path) = std::env::var("DATAGOV_DATABASE_PATH") {
        debug!("Overriding database_path from environment");
        config.database_path = db_path;
    }

    Ok(config)
}
