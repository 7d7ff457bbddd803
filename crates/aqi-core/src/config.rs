use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::theme::ThemeConfig;

pub const ENV_CONFIG: &str = "AQI_CONFIG";
pub const ENV_DATA_DIR: &str = "AQI_DATA_DIR";
pub const ENV_ARCHIVE_PATH: &str = "AQI_ARCHIVE_PATH";
pub const ENV_COORDINATES_PATH: &str = "AQI_COORDINATES_PATH";
pub const ENV_CACHE_TTL_SECS: &str = "AQI_CACHE_TTL_SECS";
pub const ENV_TIMEZONE: &str = "AQI_TIMEZONE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown time zone '{value}': {message}")]
    Timezone { value: String, message: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the `<YYYY-MM-DD>.csv` daily snapshots.
    pub data_dir: PathBuf,
    /// Tab-separated archive used when no live snapshot is usable.
    pub archive_path: PathBuf,
    /// JSON object of city name to `[lat, lon]`.
    pub coordinates_path: PathBuf,
    pub cache_ttl_secs: u64,
    /// IANA zone used for "today" and for the last-updated stamp.
    pub display_timezone: String,
    pub metro_cities: Vec<String>,
    pub preferred_cities: Vec<String>,
    pub theme: ThemeConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            archive_path: PathBuf::from("combined_air_quality.txt"),
            coordinates_path: PathBuf::from("lat_long.json"),
            cache_ttl_secs: 3600,
            display_timezone: "Asia/Kolkata".to_string(),
            metro_cities: [
                "Delhi",
                "Mumbai",
                "Kolkata",
                "Bengaluru",
                "Chennai",
                "Hyderabad",
                "Pune",
                "Ahmedabad",
            ]
            .iter()
            .map(|city| city.to_string())
            .collect(),
            preferred_cities: ["Delhi", "Mumbai", "Kolkata"]
                .iter()
                .map(|city| city.to_string())
                .collect(),
            theme: ThemeConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Reads the optional TOML file, then applies `AQI_*` environment
    /// overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_ARCHIVE_PATH) {
            self.archive_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_COORDINATES_PATH) {
            self.coordinates_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs =
                value
                    .trim()
                    .parse()
                    .map_err(|err: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: ENV_CACHE_TTL_SECS,
                        message: format!("'{value}': {err}"),
                    })?;
        }
        if let Some(value) = lookup(ENV_TIMEZONE) {
            self.display_timezone = value.trim().to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cache_ttl_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        self.cache_ttl()?;
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.display_timezone
            .parse::<Tz>()
            .map_err(|err| ConfigError::Timezone {
                value: self.display_timezone.clone(),
                message: err.to_string(),
            })
    }

    /// Fails for values too large for a `chrono::Duration`.
    pub fn cache_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "cache_ttl_secs",
                message: format!("{} seconds is out of range", self.cache_ttl_secs),
            })
    }
}
