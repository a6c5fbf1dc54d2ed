//! Database schema management for `weatherstream`.
//!
//! Ensures the records table and indexes exist before serving requests.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// The `(city, timestamp)` composite primary key is what makes the
/// persistence writer's upsert idempotent under at-least-once redelivery.
/// Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool, table: &str) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            city             TEXT              NOT NULL,
            timestamp        TIMESTAMPTZ       NOT NULL,
            temperature_c    DOUBLE PRECISION,
            humidity_pct     DOUBLE PRECISION,
            wind_kph         DOUBLE PRECISION,
            feels_like_c     DOUBLE PRECISION,
            baseline_delta_c DOUBLE PRECISION,
            severity_score   DOUBLE PRECISION  NOT NULL,
            alert_category   TEXT              NOT NULL,
            anomaly_detected BOOLEAN           NOT NULL,
            processed_at     TIMESTAMPTZ       NOT NULL,
            PRIMARY KEY (city, timestamp)
        );
        "#
    ))
    .execute(&mut *tx)
    .await?;

    // The composite primary key already indexes (city, timestamp) and
    // serves the backward baseline scan; no extra index needed for it.

    // Lets the archival collaborator scan anomalous rows cheaply
    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{table}_anomaly
            ON {table} (anomaly_detected)
            WHERE anomaly_detected;
        "#
    ))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
