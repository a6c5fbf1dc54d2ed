//! Configuration loader for the `weatherstream` processor.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.

use std::env;
use std::time::Duration;

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

/// Parse an optional millisecond-duration environment variable with a default.
macro_rules! parse_env_ms {
    ($var_name:expr, $default_ms:expr) => {
        Duration::from_millis(
            env::var($var_name)
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
                .unwrap_or($default_ms),
        )
    };
}

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
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

// ---

/// Classifier rule thresholds, overridable from the environment.
///
/// Defaults are the authoritative contract for the rule table; the sample
/// alerts in older project docs (Halifax 39.3°C, Edmonton -31.8°C) predate
/// these values and do not trigger under them.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    // ---
    /// Temperatures strictly below this are `cold_extreme` (°C).
    pub cold_extreme_c: f64,

    /// Temperatures strictly above this are `heat_extreme` (°C).
    pub heat_extreme_c: f64,

    /// Humidity strictly above this is `humidity_extreme` (%).
    pub humidity_high_pct: f64,

    /// Humidity strictly below this is `humidity_extreme` (%).
    pub humidity_low_pct: f64,

    /// Wind strictly above this is `wind_extreme` (km/h).
    pub wind_extreme_kph: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        // ---
        Thresholds {
            cold_extreme_c: -50.0,
            heat_extreme_c: 45.0,
            humidity_high_pct: 95.0,
            humidity_low_pct: 5.0,
            wind_extreme_kph: 100.0,
        }
    }
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

    /// Alert channel endpoint (webhook URL) for anomaly publications.
    pub alert_webhook_url: String,

    /// Table holding the enriched records.
    pub records_table: String,

    /// Classifier thresholds (defaults overridable per rule).
    pub thresholds: Thresholds,

    /// Upper bound on a single store upsert or baseline read.
    pub store_timeout: Duration,

    /// Upper bound on a single alert publish.
    pub publish_timeout: Duration,

    /// Deadline for processing one whole batch; records not started by
    /// then are reported retryable instead of processed.
    pub batch_timeout: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
/// - `ALERT_WEBHOOK_URL` – alert channel endpoint
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `RECORDS_TABLE` – storage table name (default: `weather_records`)
/// - `COLD_EXTREME_C`, `HEAT_EXTREME_C`, `HUMIDITY_HIGH_PCT`,
///   `HUMIDITY_LOW_PCT`, `WIND_EXTREME_KPH` – threshold overrides
/// - `STORE_TIMEOUT_MS`, `PUBLISH_TIMEOUT_MS`, `BATCH_TIMEOUT_MS` – I/O and
///   batch deadlines (defaults: 2000 / 2000 / 30000)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let alert_webhook_url = require_env!("ALERT_WEBHOOK_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);

    // Table names are spliced into SQL, so restrict them to identifier
    // characters rather than trusting the environment blindly.
    let records_table = env::var("RECORDS_TABLE").unwrap_or_else(|_| "weather_records".into());
    if records_table.is_empty()
        || !records_table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(anyhow!(
            "RECORDS_TABLE must be a plain SQL identifier, got {records_table:?}"
        ));
    }

    let defaults = Thresholds::default();
    let thresholds = Thresholds {
        cold_extreme_c: parse_env_f64!("COLD_EXTREME_C", defaults.cold_extreme_c),
        heat_extreme_c: parse_env_f64!("HEAT_EXTREME_C", defaults.heat_extreme_c),
        humidity_high_pct: parse_env_f64!("HUMIDITY_HIGH_PCT", defaults.humidity_high_pct),
        humidity_low_pct: parse_env_f64!("HUMIDITY_LOW_PCT", defaults.humidity_low_pct),
        wind_extreme_kph: parse_env_f64!("WIND_EXTREME_KPH", defaults.wind_extreme_kph),
    };

    let store_timeout = parse_env_ms!("STORE_TIMEOUT_MS", 2_000);
    let publish_timeout = parse_env_ms!("PUBLISH_TIMEOUT_MS", 2_000);
    let batch_timeout = parse_env_ms!("BATCH_TIMEOUT_MS", 30_000);

    Ok(Config {
        db_url,
        db_pool_max,
        alert_webhook_url,
        records_table,
        thresholds,
        store_timeout,
        publish_timeout,
        batch_timeout,
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
        tracing::info!("  DATABASE_URL      : {}", masked_db_url);
        tracing::info!("  ALERT_WEBHOOK_URL : {}", self.alert_webhook_url);
        tracing::info!("  RECORDS_TABLE     : {}", self.records_table);
        tracing::info!("  DB_POOL_MAX       : {}", self.db_pool_max);
        tracing::info!(
            "  THRESHOLDS        : cold<{} heat>{} humidity<{} or >{} wind>{}",
            self.thresholds.cold_extreme_c,
            self.thresholds.heat_extreme_c,
            self.thresholds.humidity_low_pct,
            self.thresholds.humidity_high_pct,
            self.thresholds.wind_extreme_kph
        );
        tracing::info!(
            "  TIMEOUTS          : store={:?} publish={:?} batch={:?}",
            self.store_timeout,
            self.publish_timeout,
            self.batch_timeout
        );
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_default_thresholds_match_rule_table() {
        // ---
        let t = Thresholds::default();
        assert_eq!(t.cold_extreme_c, -50.0);
        assert_eq!(t.heat_extreme_c, 45.0);
        assert_eq!(t.humidity_high_pct, 95.0);
        assert_eq!(t.humidity_low_pct, 5.0);
        assert_eq!(t.wind_extreme_kph, 100.0);
    }
}
