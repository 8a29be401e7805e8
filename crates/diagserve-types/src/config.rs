//! configuration types for diagserve.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// main configuration for diagserve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// address to bind the http server to.
    pub listen_addr: String,

    /// maximum number of diagnosis keys accepted per upload. the upload
    /// body is capped at this many 21-byte records.
    pub max_upload_batch_size: usize,

    /// seconds between automatic cache rehydrations from the repository.
    /// 0 disables the refresh task.
    pub cache_refresh_interval_secs: u64,

    /// database configuration.
    pub database: DatabaseConfig,

    /// exposure notification scoring parameters served to clients.
    pub exposure: ExposureConfig,
}

impl Config {
    /// the cache refresh interval as a [`Duration`].
    pub fn cache_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_upload_batch_size: 14,
            cache_refresh_interval_secs: 300,
            database: DatabaseConfig::default(),
            exposure: ExposureConfig::default(),
        }
    }
}

/// database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// database type: "sqlite" or "postgres".
    pub db_type: String,

    /// database connection string or file path.
    pub connection_string: String,

    /// upper bound on open connections in the pool. kept small so heavy
    /// read fan-out cannot starve the cache refresh task.
    pub max_connections: u32,

    /// connections the pool keeps idle and ready.
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            connection_string: "/var/lib/diagserve/db.sqlite".to_string(),
            max_connections: 30,
            min_connections: 5,
        }
    }
}

/// exposure notification scoring parameters.
///
/// served verbatim as json to clients configuring the on-device framework.
/// field names follow the casing the framework documentation uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExposureConfig {
    /// minimum risk score below which exposures are ignored.
    pub minimum_risk_score: i32,

    /// attenuation scores per level bucket.
    pub attenuation_level_values: Vec<i32>,
    /// weight of the attenuation dimension, 0-100.
    pub attenuation_weight: i32,

    /// days-since-last-exposure scores per level bucket.
    pub days_since_last_exposure_level_values: Vec<i32>,
    /// weight of the days-since-last-exposure dimension, 0-100.
    pub days_since_last_exposure_weight: i32,

    /// exposure duration scores per level bucket.
    pub duration_level_values: Vec<i32>,
    /// weight of the duration dimension, 0-100.
    pub duration_weight: i32,

    /// transmission risk scores per level bucket.
    pub transmission_risk_level_values: Vec<i32>,
    /// weight of the transmission risk dimension, 0-100.
    pub transmission_risk_weight: i32,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            minimum_risk_score: 0,
            attenuation_level_values: vec![1, 2, 3, 4, 5, 6, 7, 8],
            attenuation_weight: 50,
            days_since_last_exposure_level_values: vec![1, 2, 3, 4, 5, 6, 7, 8],
            days_since_last_exposure_weight: 50,
            duration_level_values: vec![1, 2, 3, 4, 5, 6, 7, 8],
            duration_weight: 50,
            transmission_risk_level_values: vec![1, 2, 3, 4, 5, 6, 7, 8],
            transmission_risk_weight: 50,
        }
    }
}
