//! Fixed-threshold anomaly classification.
//!
//! A priority-ordered rule table maps an enriched record to a severity score
//! in [0, 100] plus a category label. First matching rule wins; a rule whose
//! metric is absent simply does not match. No history, no randomness: the
//! result is a pure function of the record fields and the threshold set.

use crate::config::Thresholds;
use crate::models::{AlertCategory, EnrichedRecord};

// ---

const SEVERITY_CAP: f64 = 100.0;
const COLD_BASE_SEVERITY: f64 = 90.0;
const HEAT_BASE_SEVERITY: f64 = 85.0;
const HUMIDITY_SEVERITY: f64 = 60.0;
const WIND_SEVERITY: f64 = 70.0;

/// Outcome of classifying one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    // ---
    pub severity_score: f64,
    pub category: AlertCategory,
    pub anomaly_detected: bool,
}

impl Classification {
    fn none() -> Self {
        // ---
        Classification {
            severity_score: 0.0,
            category: AlertCategory::None,
            anomaly_detected: false,
        }
    }

    fn anomaly(category: AlertCategory, severity_score: f64) -> Self {
        // ---
        Classification {
            severity_score: severity_score.min(SEVERITY_CAP),
            category,
            anomaly_detected: true,
        }
    }

    /// Copy the outcome onto the record that will be persisted.
    pub fn apply(self, record: &mut EnrichedRecord) {
        // ---
        record.severity_score = self.severity_score;
        record.alert_category = self.category;
        record.anomaly_detected = self.anomaly_detected;
    }
}

// ---

/// Classify an enriched record against the rule table.
///
/// Rules in priority order (ties broken by listed order):
/// 1. temperature below the cold threshold: `cold_extreme`, base 90,
///    +1 per degree below, capped at 100
/// 2. temperature above the heat threshold: `heat_extreme`, base 85,
///    +1 per degree above, capped at 100
/// 3. humidity above the high or below the low threshold:
///    `humidity_extreme`, flat 60
/// 4. wind above the wind threshold: `wind_extreme`, flat 70
/// 5. otherwise `none`, severity 0
pub fn classify(record: &EnrichedRecord, thresholds: &Thresholds) -> Classification {
    // ---
    if let Some(temp) = record.temperature_c {
        if temp < thresholds.cold_extreme_c {
            let severity = COLD_BASE_SEVERITY + (thresholds.cold_extreme_c - temp);
            return Classification::anomaly(AlertCategory::ColdExtreme, severity);
        }
        if temp > thresholds.heat_extreme_c {
            let severity = HEAT_BASE_SEVERITY + (temp - thresholds.heat_extreme_c);
            return Classification::anomaly(AlertCategory::HeatExtreme, severity);
        }
    }

    if let Some(humidity) = record.humidity_pct {
        if humidity > thresholds.humidity_high_pct || humidity < thresholds.humidity_low_pct {
            return Classification::anomaly(AlertCategory::HumidityExtreme, HUMIDITY_SEVERITY);
        }
    }

    if let Some(wind) = record.wind_kph {
        if wind > thresholds.wind_extreme_kph {
            return Classification::anomaly(AlertCategory::WindExtreme, WIND_SEVERITY);
        }
    }

    Classification::none()
}
