use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct BatchResult {
    processed_records: usize,
    rejected_records: usize,
    persist_failures: usize,
    dispatch_failures: usize,
    alerts_published: usize,
    outcomes: Vec<RecordOutcome>,
}

#[derive(Debug, Deserialize)]
struct RecordOutcome {
    index: usize,
    city: Option<String>,
    status: String,
    reason: Option<String>,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    // ---
    let client = Client::new();
    let response = client
        .get(format!("{}/health", base_url()))
        .send()
        .await?;

    assert!(response.status().is_success());
    Ok(())
}

#[tokio::test]
async fn mixed_batch_isolates_the_malformed_record() -> Result<()> {
    // ---
    // One record with an unparseable timestamp among nine valid ones: the
    // bad record must be rejected, the rest must be processed.
    let mut batch = Vec::new();
    for i in 0..9 {
        batch.push(json!({
            "city": format!("Testville-{i}"),
            "timestamp": format!("2025-08-18T{:02}:00:00Z", i),
            "temperature_c": 20.0 + i as f64,
            "humidity_pct": 55.0,
            "wind_kph": 12.0,
        }));
    }
    batch.push(json!({
        "city": "Brokenton",
        "timestamp": "not-a-timestamp",
        "temperature_c": 21.0,
    }));

    let client = Client::new();
    let result: BatchResult = client
        .post(format!("{}/stream/records", base_url()))
        .json(&batch)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(result.outcomes.len(), 10);
    assert_eq!(result.rejected_records, 1);
    assert_eq!(
        result.processed_records + result.persist_failures + result.dispatch_failures,
        9,
        "all well-formed records must be attempted"
    );

    let rejected = result
        .outcomes
        .iter()
        .find(|o| o.status == "rejected")
        .expect("one rejected outcome");
    assert_eq!(rejected.index, 9);
    assert_eq!(rejected.city.as_deref(), Some("Brokenton"));
    assert!(
        rejected.reason.as_deref().unwrap_or("").contains("timestamp"),
        "rejection must name the offending field"
    );

    // Outcomes come back in delivery order.
    for (i, outcome) in result.outcomes.iter().enumerate() {
        assert_eq!(outcome.index, i);
    }

    Ok(())
}

#[tokio::test]
async fn redelivered_batch_is_idempotent() -> Result<()> {
    // ---
    // At-least-once delivery: re-POSTing the identical batch must succeed
    // and report the same per-record statuses (upsert overwrites in place).
    let batch = vec![json!({
        "city": "Reprise",
        "timestamp": "2025-08-18T12:00:00Z",
        "temperature_c": 18.5,
        "humidity_pct": 60.0,
        "wind_kph": 8.0,
    })];

    let client = Client::new();
    let url = format!("{}/stream/records", base_url());

    let first: BatchResult = client.post(&url).json(&batch).send().await?.json().await?;
    let second: BatchResult = client.post(&url).json(&batch).send().await?.json().await?;

    assert_eq!(first.outcomes.len(), 1);
    assert_eq!(second.outcomes.len(), 1);
    assert_eq!(first.outcomes[0].status, second.outcomes[0].status);
    assert_eq!(first.rejected_records, 0);
    assert_eq!(second.rejected_records, 0);

    Ok(())
}

#[tokio::test]
async fn redelivered_record_stores_identical_content() -> Result<()> {
    // ---
    // At-least-once redelivery must overwrite the row with the same derived
    // content it stored the first time. In particular, the baseline read is
    // bounded to history strictly before the record's own timestamp, so a
    // redelivered record with no prior history keeps a null baseline delta
    // instead of treating its own stored row as history.
    //
    // Needs direct table access; skipped when DATABASE_URL is not provided.
    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping stored-content check");
        return Ok(());
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    // A fresh city guarantees the record has no history on first delivery.
    let city = format!(
        "Reprise-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_nanos()
    );
    let batch = vec![json!({
        "city": city,
        "timestamp": "2025-08-18T12:00:00Z",
        "temperature_c": 18.5,
        "humidity_pct": 60.0,
        "wind_kph": 8.0,
    })];

    let client = Client::new();
    let url = format!("{}/stream/records", base_url());

    type StoredRow = (Option<f64>, Option<f64>, Option<f64>, f64, String, bool);
    let select = "SELECT temperature_c, feels_like_c, baseline_delta_c, \
                  severity_score, alert_category, anomaly_detected \
                  FROM weather_records WHERE city = $1";

    let first: BatchResult = client.post(&url).json(&batch).send().await?.json().await?;
    assert_eq!(first.rejected_records, 0);

    let before: StoredRow = sqlx::query_as(select).bind(&city).fetch_one(&pool).await?;
    assert_eq!(before.2, None, "no history, so no baseline delta");

    let second: BatchResult = client.post(&url).json(&batch).send().await?.json().await?;
    assert_eq!(second.rejected_records, 0);

    let after: StoredRow = sqlx::query_as(select).bind(&city).fetch_one(&pool).await?;
    assert_eq!(after, before, "redelivery must store the same content");

    Ok(())
}

#[tokio::test]
async fn anomalous_record_reports_an_alert() -> Result<()> {
    // ---
    let batch = vec![json!({
        "city": "Deep Freeze",
        "timestamp": "2025-01-15T03:00:00Z",
        "temperature_c": -55.0,
        "humidity_pct": 60.0,
        "wind_kph": 20.0,
    })];

    let client = Client::new();
    let result: BatchResult = client
        .post(format!("{}/stream/records", base_url()))
        .json(&batch)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(result.outcomes.len(), 1);
    match result.outcomes[0].status.as_str() {
        // Either the webhook accepted the publish or the channel is down in
        // this environment; persistence must have succeeded either way.
        "ok" => assert_eq!(result.alerts_published, 1),
        "dispatch_failed" => assert_eq!(result.alerts_published, 0),
        other => panic!("unexpected status for anomalous record: {other}"),
    }

    Ok(())
}
