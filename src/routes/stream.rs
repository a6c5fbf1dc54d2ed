//! Batch entry point for the stream collaborator.
//!
//! `POST /stream/records` accepts a JSON array of already-decoded telemetry
//! objects (transport decoding, e.g. base64 unwrapping, is the stream
//! consumer's job) and runs each through the processing pipeline. The
//! response is always a structured batch result: per-record failures are
//! enumerated, never signalled as an HTTP error, so the caller can decide
//! redelivery record by record.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use sqlx::PgPool;
use tracing::{error, info};

use crate::{pipeline, Config};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new().route("/stream/records", post(handler))
}

async fn handler(
    State((pool, config)): State<(PgPool, Config)>,
    Json(records): Json<Vec<serde_json::Value>>,
) -> impl IntoResponse {
    // ---
    info!("POST /stream/records - batch of {} records", records.len());

    // One client per batch; its builder timeout bounds every publish call.
    let client = match reqwest::Client::builder()
        .timeout(config.publish_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build alert channel client: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Alert channel unavailable"),
            )
                .into_response();
        }
    };

    let result = pipeline::process_batch(&pool, &client, &config, records).await;

    (StatusCode::OK, Json(result)).into_response()
}
