use crate::analysis::{AlertThresholds, DayPart, TierCutoffs};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
///
/// Every threshold the pipeline applies lives here rather than as a
/// module-level constant, so tests and deployments can vary them freely.
/// Each section falls back to its defaults when omitted from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub buckets: BucketConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub consensus: TierCutoffs,
    #[serde(default)]
    pub alert: AlertThresholds,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default analysis point when no location is given on the command line.
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone the forecast timestamps are localized to.
    pub timezone: String,
    /// Watch-mode refresh interval; refetches inside the cache TTL are
    /// served from the snapshot cache.
    pub refresh_interval_secs: u64,
    /// Named points offered in addition to the default location.
    #[serde(default)]
    pub favorites: Vec<FavoriteLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            location: "Sentani".to_string(),
            latitude: -2.5757,
            longitude: 140.5185,
            timezone: "Asia/Jayapura".to_string(),
            refresh_interval_secs: 60,
            favorites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub forecast_endpoint: String,
    pub ensemble_endpoint: String,
    pub geocoding_endpoint: String,
    /// How long a fetched snapshot stays valid for identical requests.
    pub cache_ttl_secs: u64,
    /// Days of hourly data requested upstream (>= the bucket horizon).
    pub forecast_days: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            forecast_endpoint: "https://api.open-meteo.com/v1/forecast".to_string(),
            ensemble_endpoint: "https://ensemble-api.open-meteo.com/v1/ensemble".to_string(),
            geocoding_endpoint: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            cache_ttl_secs: 3600,
            forecast_days: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Calendar days the bucket list covers, starting today.
    pub horizon_days: u32,
    /// Minutes past its end hour a bucket stays listed.
    pub grace_minutes: i64,
    /// Day-part templates instantiated per calendar date.
    pub day_parts: Vec<DayPart>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            horizon_days: 2,
            grace_minutes: 5,
            day_parts: DayPart::standard(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Instantaneous precipitation (mm) above which a member predicts rain.
    pub rain_threshold_mm: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            rain_threshold_mm: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub output: String,
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "pretty".to_string(),
            file_path: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from environment variable or default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_FILE")
            .unwrap_or_else(|_| "config/production.toml".to_string());
        Self::from_file(path)
    }
}
