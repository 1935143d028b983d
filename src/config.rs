//! Service configuration loader - parses airmon.toml
//!
//! Keeps the tracked location, upstream credentials, and schedule out of
//! the code so a deployment can point at a different city or key without
//! recompiling. Every section is optional; anything left out falls back to
//! the defaults below (Paris, polled once a minute).

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ingest::iqair::IQAIR_API_BASE;
use crate::model::Location;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "airmon.toml";

/// Environment variable that overrides `[iqair] api_key`.
pub const API_KEY_ENV: &str = "IQAIR_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(
        "Invalid location {latitude},{longitude}: latitude must be in [-90, 90] and longitude in [-180, 180]"
    )]
    InvalidLocation { latitude: f64, longitude: f64 },

    #[error("scheduler.interval_seconds must be at least 1")]
    InvalidInterval,

    #[error("No IQAir API key configured. Set IQAIR_API_KEY or [iqair] api_key in airmon.toml")]
    MissingApiKey,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub iqair: IqAirConfig,
    pub scheduler: SchedulerConfig,
    pub endpoint: EndpointConfig,
}

/// The single fixed point this deployment tracks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Human-readable name used in responses ("No air quality data found for Paris").
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: "Paris".to_string(),
            latitude: 48.856613,
            longitude: 2.352222,
        }
    }
}

impl LocationConfig {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IqAirConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for IqAirConfig {
    fn default() -> Self {
        Self {
            base_url: IQAIR_API_BASE.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub name: String,
    /// Tick period. 60 matches the cron expression `* * * * *`.
    pub interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "paris-air-quality".to_string(),
            interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Loads configuration from `path`, then applies environment overrides
    /// (including a `.env` file if present).
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = if path.exists() {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        };

        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.iqair.api_key = Some(key);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string without touching the
    /// environment.
    pub fn from_toml_str(contents: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.location.location().is_valid() {
            return Err(ConfigError::InvalidLocation {
                latitude: self.location.latitude,
                longitude: self.location.longitude,
            });
        }
        if self.scheduler.interval_seconds == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }

    /// The configured API key, or `MissingApiKey` if none is set.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.iqair
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}
