/// Runtime configuration loaded from a JSON file
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },
    #[error("flight radius must be positive (got {0:.2} km)")]
    Radius(f64),
    #[error("{field} out of range (got {value:.4})")]
    Coordinate { field: &'static str, value: f64 },
    #[error("at least one watched symbol is required")]
    NoSymbols,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_city: String,
    pub weather_refresh_secs: u64,
    pub stock_watch_secs: u64,
    pub news_interval_secs: u64,
    pub flight_poll_secs: u64,
    pub watched_symbols: Vec<String>,
    pub home_latitude: f64,
    pub home_longitude: f64,
    pub flight_radius_km: f64,
    pub typewriter_chars_per_tick: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_city: "Lancaster".to_string(),
            weather_refresh_secs: 30,
            stock_watch_secs: 10,
            news_interval_secs: 45,
            flight_poll_secs: 15,
            watched_symbols: vec!["ACME".into(), "HRSE".into(), "BUGY".into()],
            // Lancaster, PA
            home_latitude: 40.0379,
            home_longitude: -76.3055,
            flight_radius_km: 25.0,
            typewriter_chars_per_tick: 1,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("weather_refresh_secs", self.weather_refresh_secs),
            ("stock_watch_secs", self.stock_watch_secs),
            ("news_interval_secs", self.news_interval_secs),
            ("flight_poll_secs", self.flight_poll_secs),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { field });
            }
        }
        if self.typewriter_chars_per_tick == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "typewriter_chars_per_tick",
            });
        }
        if !(self.flight_radius_km > 0.0) {
            return Err(ConfigError::Radius(self.flight_radius_km));
        }
        if !(-90.0..=90.0).contains(&self.home_latitude) {
            return Err(ConfigError::Coordinate {
                field: "home_latitude",
                value: self.home_latitude,
            });
        }
        if !(-180.0..=180.0).contains(&self.home_longitude) {
            return Err(ConfigError::Coordinate {
                field: "home_longitude",
                value: self.home_longitude,
            });
        }
        if self.watched_symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        Ok(())
    }

    pub fn weather_refresh(&self) -> Duration {
        Duration::from_secs(self.weather_refresh_secs)
    }

    pub fn stock_watch(&self) -> Duration {
        Duration::from_secs(self.stock_watch_secs)
    }

    pub fn news_interval(&self) -> Duration {
        Duration::from_secs(self.news_interval_secs)
    }

    pub fn flight_poll(&self) -> Duration {
        Duration::from_secs(self.flight_poll_secs)
    }
}
