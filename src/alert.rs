//! Alert formatting and publication.
//!
//! Builds a category-specific message for an anomalous record and posts it
//! to the configured alert channel. Publication is fire-and-forget: a
//! failure here never rolls back the already-completed persistence step,
//! and the two outcomes are reported independently per record.

use crate::models::{AlertCategory, AlertEvent, EnrichedRecord};

// ---

/// A publish that failed and may be retried by redelivery.
#[derive(Debug)]
pub enum DispatchError {
    /// Transport-level failure (connect, timeout, TLS).
    Publish(reqwest::Error),
    /// The channel answered with a non-success status.
    Rejected(reqwest::StatusCode),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Publish(e) => write!(f, "alert publish failed: {e}"),
            DispatchError::Rejected(status) => {
                write!(f, "alert channel rejected publish: {status}")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Publish(e) => Some(e),
            DispatchError::Rejected(_) => None,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        DispatchError::Publish(e)
    }
}

// ---

/// Build the alert event for an anomalous record, or `None` when the
/// record carries no anomaly. Pure; publication happens in `dispatch`.
pub fn build_alert(record: &EnrichedRecord) -> Option<AlertEvent> {
    // ---
    if !record.anomaly_detected {
        return None;
    }

    Some(AlertEvent {
        city: record.city.clone(),
        timestamp: record.timestamp,
        category: record.alert_category,
        severity_score: record.severity_score,
        message: format_message(record),
    })
}

/// Publish the alert for a record, if any.
///
/// Returns `Ok(None)` without touching the network when the record is not
/// anomalous. The client's builder timeout bounds the publish call.
pub async fn dispatch(
    client: &reqwest::Client,
    webhook_url: &str,
    record: &EnrichedRecord,
) -> Result<Option<AlertEvent>, DispatchError> {
    // ---
    let Some(event) = build_alert(record) else {
        return Ok(None);
    };

    let response = client.post(webhook_url).json(&event).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DispatchError::Rejected(status));
    }

    tracing::info!(
        "Published {} alert for {} (severity {})",
        event.category,
        event.city,
        event.severity_score
    );

    Ok(Some(event))
}

// ---

/// Human-readable alert body: city, observation time, the metric that
/// triggered the rule, the feels-like estimate, and the severity score.
fn format_message(record: &EnrichedRecord) -> String {
    // ---
    let when = record.timestamp.format("%Y-%m-%d %H:%M UTC");
    let feels_like = match record.feels_like_c {
        Some(fl) => format!("{fl:.1}°C"),
        None => "n/a".to_string(),
    };

    match record.alert_category {
        AlertCategory::ColdExtreme => format!(
            "EXTREME COLD in {} at {}: {:.1}°C (feels like {}). Severity {:.0}/100.",
            record.city,
            when,
            record.temperature_c.unwrap_or(f64::NAN),
            feels_like,
            record.severity_score
        ),
        AlertCategory::HeatExtreme => format!(
            "EXTREME HEAT in {} at {}: {:.1}°C (feels like {}). Severity {:.0}/100.",
            record.city,
            when,
            record.temperature_c.unwrap_or(f64::NAN),
            feels_like,
            record.severity_score
        ),
        AlertCategory::HumidityExtreme => format!(
            "EXTREME HUMIDITY in {} at {}: {:.0}% relative humidity (feels like {}). Severity {:.0}/100.",
            record.city,
            when,
            record.humidity_pct.unwrap_or(f64::NAN),
            feels_like,
            record.severity_score
        ),
        AlertCategory::WindExtreme => format!(
            "EXTREME WIND in {} at {}: {:.0} km/h (feels like {}). Severity {:.0}/100.",
            record.city,
            when,
            record.wind_kph.unwrap_or(f64::NAN),
            feels_like,
            record.severity_score
        ),
        AlertCategory::None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::classify::classify;
    use crate::config::Thresholds;
    use crate::enrich::enrich;
    use crate::models::TelemetryRecord;
    use chrono::{TimeZone, Utc};

    fn classified(temp: f64, humidity: f64, wind: f64) -> EnrichedRecord {
        // ---
        let record = TelemetryRecord {
            city: "Regina".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 20, 8, 0, 0).unwrap(),
            temperature_c: Some(temp),
            humidity_pct: Some(humidity),
            wind_kph: Some(wind),
        };
        let mut enriched = enrich(
            &record,
            None,
            Utc.with_ymd_and_hms(2025, 1, 20, 8, 1, 0).unwrap(),
        );
        classify(&enriched, &Thresholds::default()).apply(&mut enriched);
        enriched
    }

    #[test]
    fn test_no_alert_for_normal_record() {
        // ---
        assert!(build_alert(&classified(22.0, 50.0, 10.0)).is_none());
    }

    #[test]
    fn test_cold_alert_content() {
        // ---
        let event = build_alert(&classified(-55.0, 60.0, 20.0)).unwrap();

        assert_eq!(event.category, AlertCategory::ColdExtreme);
        assert_eq!(event.city, "Regina");
        assert!(event.severity_score >= 90.0);
        assert!(event.message.contains("EXTREME COLD"));
        assert!(event.message.contains("Regina"));
        assert!(event.message.contains("-55.0°C"));
        assert!(event.message.contains("feels like"));
    }

    #[test]
    fn test_wind_alert_names_primary_metric() {
        // ---
        let event = build_alert(&classified(20.0, 50.0, 120.0)).unwrap();

        assert_eq!(event.category, AlertCategory::WindExtreme);
        assert!(event.message.contains("120 km/h"));
        assert!(event.message.contains("Severity 70/100"));
    }
}
