//! Persistence writer for enriched records.
//!
//! Rows are keyed by the `(city, timestamp)` primary key, so redelivered
//! records overwrite themselves: the content is a pure function of the input
//! record, making the upsert idempotent under at-least-once delivery. The
//! writer never retries; failures surface as retryable `StorageError`s and
//! the invoking runtime decides redelivery.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::time::timeout;

use crate::models::EnrichedRecord;

// ---

/// A store operation that failed and may be retried by redelivery.
#[derive(Debug)]
pub enum StorageError {
    /// The operation exceeded its configured deadline.
    Timeout(Duration),
    /// The database rejected or dropped the operation.
    Database(sqlx::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Timeout(limit) => write!(f, "store call exceeded {limit:?}"),
            StorageError::Database(e) => write!(f, "store call failed: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Timeout(_) => None,
            StorageError::Database(e) => Some(e),
        }
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Database(e)
    }
}

// ---

/// Upsert one enriched record, bounded by `limit`.
///
/// Last write wins on conflict. Writing the same record twice leaves the
/// table in the same observable state as writing it once.
///
/// `table` comes from validated configuration (identifier characters only),
/// which is why splicing it into the statement is acceptable here.
pub async fn upsert(
    pool: &PgPool,
    table: &str,
    record: &EnrichedRecord,
    limit: Duration,
) -> Result<(), StorageError> {
    // ---
    let sql = format!(
        r#"
        INSERT INTO {table} (
            city, timestamp,
            temperature_c, humidity_pct, wind_kph,
            feels_like_c, baseline_delta_c,
            severity_score, alert_category, anomaly_detected,
            processed_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (city, timestamp) DO UPDATE SET
            temperature_c    = EXCLUDED.temperature_c,
            humidity_pct     = EXCLUDED.humidity_pct,
            wind_kph         = EXCLUDED.wind_kph,
            feels_like_c     = EXCLUDED.feels_like_c,
            baseline_delta_c = EXCLUDED.baseline_delta_c,
            severity_score   = EXCLUDED.severity_score,
            alert_category   = EXCLUDED.alert_category,
            anomaly_detected = EXCLUDED.anomaly_detected,
            processed_at     = EXCLUDED.processed_at
        "#
    );

    let query = sqlx::query(&sql)
        .bind(&record.city)
        .bind(record.timestamp)
        .bind(record.temperature_c)
        .bind(record.humidity_pct)
        .bind(record.wind_kph)
        .bind(record.feels_like_c)
        .bind(record.baseline_delta_c)
        .bind(record.severity_score)
        .bind(record.alert_category.as_str())
        .bind(record.anomaly_detected)
        .bind(record.processed_at)
        .execute(pool);

    match timeout(limit, query).await {
        Ok(result) => {
            result?;
            Ok(())
        }
        Err(_) => Err(StorageError::Timeout(limit)),
    }
}

/// Narrow baseline read: the most recent stored temperature for a city
/// strictly before `before`.
///
/// Used as the explicit history input to enrichment. The bound keeps the
/// read deterministic under at-least-once redelivery: a record never sees
/// its own previously-upserted row (or a later sibling) as history, so
/// re-processing stores the same content as the first delivery.
/// `Ok(None)` means the city has no stored temperature from before then.
pub async fn latest_temperature(
    pool: &PgPool,
    table: &str,
    city: &str,
    before: DateTime<Utc>,
    limit: Duration,
) -> Result<Option<f64>, StorageError> {
    // ---
    let sql = format!(
        r#"
        SELECT temperature_c FROM {table}
        WHERE city = $1 AND timestamp < $2 AND temperature_c IS NOT NULL
        ORDER BY timestamp DESC
        LIMIT 1
        "#
    );

    let query = sqlx::query_scalar::<_, Option<f64>>(&sql)
        .bind(city)
        .bind(before)
        .fetch_optional(pool);

    match timeout(limit, query).await {
        Ok(result) => Ok(result?.flatten()),
        Err(_) => Err(StorageError::Timeout(limit)),
    }
}
