//! Data models for the weather stream processor.
//!
//! Two record shapes flow through the pipeline: `RawTelemetry` is the
//! loosely-typed JSON object as delivered by the stream collaborator, and
//! `TelemetryRecord` is the validated form produced by `validate`. The
//! `EnrichedRecord` is what gets persisted: the validated fields plus the
//! derived metrics and classification outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// One telemetry object exactly as decoded from the incoming batch.
///
/// Every field is optional here; `validate::validate` is the only place
/// that decides which absences are acceptable.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTelemetry {
    // ---
    pub city: Option<String>,
    pub timestamp: Option<String>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_kph: Option<f64>,
}

/// A structurally valid telemetry record.
///
/// Invariants (enforced by `validate::validate`, relied on downstream):
/// - `city` is non-empty
/// - at least one metric field is present
/// - each present metric is within its physical plausibility range
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    // ---
    pub city: String,
    pub timestamp: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_kph: Option<f64>,
}

// ---

/// Anomaly category assigned by the classifier rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    ColdExtreme,
    HeatExtreme,
    HumidityExtreme,
    WindExtreme,
    None,
}

impl AlertCategory {
    /// Short label used in stored rows and alert messages.
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            AlertCategory::ColdExtreme => "cold_extreme",
            AlertCategory::HeatExtreme => "heat_extreme",
            AlertCategory::HumidityExtreme => "humidity_extreme",
            AlertCategory::WindExtreme => "wind_extreme",
            AlertCategory::None => "none",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for AlertCategory {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        // ---
        match s.as_str() {
            "cold_extreme" => Ok(AlertCategory::ColdExtreme),
            "heat_extreme" => Ok(AlertCategory::HeatExtreme),
            "humidity_extreme" => Ok(AlertCategory::HumidityExtreme),
            "wind_extreme" => Ok(AlertCategory::WindExtreme),
            "none" => Ok(AlertCategory::None),
            other => Err(format!("unknown alert category: {other}")),
        }
    }
}

// ---

/// The persisted record: validated fields plus derived metrics and the
/// classification outcome. Keyed by `(city, timestamp)` in storage, so
/// re-processing the same raw record overwrites with identical content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    // ---
    pub city: String,
    pub timestamp: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_kph: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub baseline_delta_c: Option<f64>,
    pub severity_score: f64,
    pub alert_category: AlertCategory,
    pub anomaly_detected: bool,
    pub processed_at: DateTime<Utc>,
}

// ---

/// Message published to the alert channel for an anomalous record.
///
/// Not persisted by this service; durability past publish is the
/// messaging collaborator's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    // ---
    pub city: String,
    pub timestamp: DateTime<Utc>,
    pub category: AlertCategory,
    pub severity_score: f64,
    pub message: String,
}

// ---

/// Per-record outcome reported in the batch result.
///
/// `PersistFailed` and `DispatchFailed` are partial successes from the
/// batch's point of view; the invoking runtime decides redelivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RecordStatus {
    Ok,
    Rejected(String),
    PersistFailed(String),
    DispatchFailed(String),
}

/// One entry per input record, in delivery order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    // ---
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(flatten)]
    pub status: RecordStatus,
}

/// Batch-level result returned to the invoking runtime. Always produced;
/// per-record failures never abort sibling records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    // ---
    pub processed_records: usize,
    pub rejected_records: usize,
    pub persist_failures: usize,
    pub dispatch_failures: usize,
    pub alerts_published: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchResult {
    /// Build the summary counters from a finished outcome list.
    pub fn from_outcomes(outcomes: Vec<RecordOutcome>, alerts_published: usize) -> Self {
        // ---
        let mut result = BatchResult {
            processed_records: 0,
            rejected_records: 0,
            persist_failures: 0,
            dispatch_failures: 0,
            alerts_published,
            outcomes: Vec::new(),
        };

        for outcome in &outcomes {
            match outcome.status {
                RecordStatus::Ok => result.processed_records += 1,
                RecordStatus::Rejected(_) => result.rejected_records += 1,
                RecordStatus::PersistFailed(_) => result.persist_failures += 1,
                RecordStatus::DispatchFailed(_) => result.dispatch_failures += 1,
            }
        }

        result.outcomes = outcomes;
        result
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_category_labels_round_trip() {
        // ---
        for cat in [
            AlertCategory::ColdExtreme,
            AlertCategory::HeatExtreme,
            AlertCategory::HumidityExtreme,
            AlertCategory::WindExtreme,
            AlertCategory::None,
        ] {
            let parsed = AlertCategory::try_from(cat.as_str().to_string()).unwrap();
            assert_eq!(parsed, cat);
        }

        assert!(AlertCategory::try_from("blizzard".to_string()).is_err());
    }

    #[test]
    fn test_batch_result_counters() {
        // ---
        let outcomes = vec![
            RecordOutcome {
                index: 0,
                city: Some("Toronto".into()),
                status: RecordStatus::Ok,
            },
            RecordOutcome {
                index: 1,
                city: None,
                status: RecordStatus::Rejected("missing city".into()),
            },
            RecordOutcome {
                index: 2,
                city: Some("Calgary".into()),
                status: RecordStatus::PersistFailed("store timeout".into()),
            },
            RecordOutcome {
                index: 3,
                city: Some("Halifax".into()),
                status: RecordStatus::DispatchFailed("publish refused".into()),
            },
        ];

        let result = BatchResult::from_outcomes(outcomes, 1);
        assert_eq!(result.processed_records, 1);
        assert_eq!(result.rejected_records, 1);
        assert_eq!(result.persist_failures, 1);
        assert_eq!(result.dispatch_failures, 1);
        assert_eq!(result.alerts_published, 1);
        assert_eq!(result.outcomes.len(), 4);
    }

    #[test]
    fn test_record_status_wire_shape() {
        // ---
        let ok = serde_json::to_value(RecordOutcome {
            index: 0,
            city: Some("Ottawa".into()),
            status: RecordStatus::Ok,
        })
        .unwrap();
        assert_eq!(ok["status"], "ok");

        let rejected = serde_json::to_value(RecordOutcome {
            index: 1,
            city: None,
            status: RecordStatus::Rejected("timestamp unparseable".into()),
        })
        .unwrap();
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["reason"], "timestamp unparseable");
    }
}
