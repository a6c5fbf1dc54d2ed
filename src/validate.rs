//! Structural validation of raw telemetry.
//!
//! Converts the loosely-typed `RawTelemetry` into a `TelemetryRecord`,
//! failing fast on the first violation. Malformed JSON at the transport
//! layer is the stream collaborator's concern; by the time a record reaches
//! this module it is already a decoded object.

use chrono::{DateTime, Utc};

use crate::models::{RawTelemetry, TelemetryRecord};

// ---

/// Physical plausibility bounds for each metric. Values outside these are
/// sensor garbage, rejected before classification ever sees them.
const TEMPERATURE_RANGE_C: (f64, f64) = (-60.0, 60.0);
const HUMIDITY_RANGE_PCT: (f64, f64) = (0.0, 100.0);
const WIND_MIN_KPH: f64 = 0.0;

/// A record rejected by validation, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid field `{}`: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ---

/// Validate a raw telemetry object into a `TelemetryRecord`.
///
/// Checks, in order:
/// 1. required fields present: non-empty `city`, `timestamp`, and at
///    least one metric
/// 2. `timestamp` parses as an ISO-8601 UTC instant
/// 3. each present metric lies within its physical plausibility range
///
/// Fails on the first violation. Pure; no side effects.
pub fn validate(raw: &RawTelemetry) -> Result<TelemetryRecord, ValidationError> {
    // ---
    let city = match raw.city.as_deref() {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        Some(_) => return Err(ValidationError::new("city", "must be non-empty")),
        None => return Err(ValidationError::new("city", "missing required field")),
    };

    let timestamp_str = raw
        .timestamp
        .as_deref()
        .ok_or_else(|| ValidationError::new("timestamp", "missing required field"))?;

    if raw.temperature_c.is_none() && raw.humidity_pct.is_none() && raw.wind_kph.is_none() {
        return Err(ValidationError::new(
            "temperature_c",
            "record carries no metric fields",
        ));
    }

    let timestamp = timestamp_str
        .parse::<DateTime<Utc>>()
        .map_err(|e| ValidationError::new("timestamp", format!("not an ISO-8601 instant: {e}")))?;

    if let Some(t) = raw.temperature_c {
        check_range("temperature_c", t, TEMPERATURE_RANGE_C.0, TEMPERATURE_RANGE_C.1)?;
    }
    if let Some(h) = raw.humidity_pct {
        check_range("humidity_pct", h, HUMIDITY_RANGE_PCT.0, HUMIDITY_RANGE_PCT.1)?;
    }
    if let Some(w) = raw.wind_kph {
        if !w.is_finite() || w < WIND_MIN_KPH {
            return Err(ValidationError::new(
                "wind_kph",
                format!("{w} is outside plausible range [0, ∞)"),
            ));
        }
    }

    Ok(TelemetryRecord {
        city,
        timestamp,
        temperature_c: raw.temperature_c,
        humidity_pct: raw.humidity_pct,
        wind_kph: raw.wind_kph,
    })
}

fn check_range(field: &'static str, value: f64, lo: f64, hi: f64) -> Result<(), ValidationError> {
    // ---
    if !value.is_finite() || value < lo || value > hi {
        return Err(ValidationError::new(
            field,
            format!("{value} is outside plausible range [{lo}, {hi}]"),
        ));
    }
    Ok(())
}
