//! Configuration loader for the `cropflow` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase, improving
//!
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// NodeMCU sensor snapshot endpoint polled by the scheduler.
    pub sensor_url: String,

    /// Path to the exported crop model artifact (JSON).
    pub model_path: String,

    /// Seconds between scheduled sensor pulls.
    pub pull_interval_secs: u32,

    /// Timeout for outbound HTTP requests to the sensor, in seconds.
    pub http_timeout_secs: u32,

    /// Number of most recent observations aggregated per prediction.
    pub predict_window: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
/// - `SENSOR_URL` – NodeMCU snapshot endpoint for the pull path
/// - `MODEL_PATH` – exported crop model artifact
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `PULL_INTERVAL_SECS` – pull cadence (default: 120)
/// - `HTTP_TIMEOUT_SECS` – sensor request timeout (default: 10)
/// - `PREDICT_WINDOW` – aggregation window size (default: 100)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let sensor_url = require_env!("SENSOR_URL");
    let model_path = require_env!("MODEL_PATH");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let pull_interval_secs = parse_env_u32!("PULL_INTERVAL_SECS", 120);
    let http_timeout_secs = parse_env_u32!("HTTP_TIMEOUT_SECS", 10);
    let predict_window = parse_env_u32!("PREDICT_WINDOW", 100);

    Ok(Config {
        db_url,
        db_pool_max,
        sensor_url,
        model_path,
        pull_interval_secs,
        http_timeout_secs,
        predict_window,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL       : {}", masked_db_url);
        tracing::info!("  SENSOR_URL         : {}", self.sensor_url);
        tracing::info!("  MODEL_PATH         : {}", self.model_path);
        tracing::info!("  DB_POOL_MAX        : {}", self.db_pool_max);
        tracing::info!("  PULL_INTERVAL_SECS : {}", self.pull_interval_secs);
        tracing::info!("  HTTP_TIMEOUT_SECS  : {}", self.http_timeout_secs);
        tracing::info!("  PREDICT_WINDOW     : {}", self.predict_window);
    }
}
