//! Derived-metric enrichment.
//!
//! Computes the feels-like temperature and the optional baseline delta for a
//! validated record. Everything here is a pure function of its arguments:
//! the historical baseline and the processing timestamp are supplied by the
//! caller rather than read from any ambient state, so enriching the same
//! inputs twice yields bit-identical output.

use chrono::{DateTime, Utc};

use crate::models::{AlertCategory, EnrichedRecord, TelemetryRecord};

// ---

/// Wind chill applies at or below this temperature (°C)...
const WIND_CHILL_MAX_TEMP_C: f64 = 10.0;
/// ...and only when wind exceeds a walking pace (km/h).
const WIND_CHILL_MIN_WIND_KPH: f64 = 4.8;

/// Heat index applies above this temperature (°C), and only once the
/// Fahrenheit equivalent reaches the regression's validity floor.
const HEAT_INDEX_MIN_TEMP_C: f64 = 20.0;
const HEAT_INDEX_MIN_TEMP_F: f64 = 80.0;

// ---

/// Enrich a validated record with derived metrics.
///
/// `baseline_temp_c` is the caller-supplied rolling baseline for the city
/// (typically the last stored temperature); `None` means no history is
/// available and the delta is simply omitted. Classification fields are
/// initialized to their non-anomalous defaults; the classifier fills them in.
///
/// Never fails: missing metrics propagate as `None` rather than erroring.
pub fn enrich(
    record: &TelemetryRecord,
    baseline_temp_c: Option<f64>,
    processed_at: DateTime<Utc>,
) -> EnrichedRecord {
    // ---
    let feels_like_c = feels_like(record.temperature_c, record.wind_kph, record.humidity_pct);

    let baseline_delta_c = match (record.temperature_c, baseline_temp_c) {
        (Some(temp), Some(baseline)) => Some(round1(temp - baseline)),
        _ => None,
    };

    EnrichedRecord {
        city: record.city.clone(),
        timestamp: record.timestamp,
        temperature_c: record.temperature_c,
        humidity_pct: record.humidity_pct,
        wind_kph: record.wind_kph,
        feels_like_c,
        baseline_delta_c,
        severity_score: 0.0,
        alert_category: AlertCategory::None,
        anomaly_detected: false,
        processed_at,
    }
}

/// Feels-like temperature in °C; computed bands are rounded to one decimal,
/// identity passes the raw value through.
///
/// - wind-chill band: temperature ≤ 10°C with wind above 4.8 km/h, using
///   the Environment Canada metric formula
/// - heat-index band: temperature > 20°C with humidity known, using the
///   Rothfusz regression once the Fahrenheit equivalent reaches 80°F
/// - identity otherwise (including when the deciding metric is absent)
pub fn feels_like(
    temperature_c: Option<f64>,
    wind_kph: Option<f64>,
    humidity_pct: Option<f64>,
) -> Option<f64> {
    // ---
    let temp = temperature_c?;

    if temp <= WIND_CHILL_MAX_TEMP_C {
        if let Some(wind) = wind_kph {
            if wind > WIND_CHILL_MIN_WIND_KPH {
                return Some(round1(wind_chill(temp, wind)));
            }
        }
        return Some(temp);
    }

    if temp > HEAT_INDEX_MIN_TEMP_C {
        if let Some(humidity) = humidity_pct {
            let temp_f = temp * 9.0 / 5.0 + 32.0;
            if temp_f >= HEAT_INDEX_MIN_TEMP_F {
                let hi_f = heat_index_f(temp_f, humidity);
                return Some(round1((hi_f - 32.0) * 5.0 / 9.0));
            }
        }
    }

    Some(temp)
}

/// Environment Canada wind chill, metric units.
fn wind_chill(temp_c: f64, wind_kph: f64) -> f64 {
    // ---
    let v16 = wind_kph.powf(0.16);
    13.12 + 0.6215 * temp_c - 11.37 * v16 + 0.3965 * temp_c * v16
}

/// Rothfusz heat index regression, in °F.
fn heat_index_f(temp_f: f64, humidity: f64) -> f64 {
    // ---
    -42.379 + 2.04901523 * temp_f + 10.14333127 * humidity
        - 0.22475541 * temp_f * humidity
        - 6.83783e-3 * temp_f * temp_f
        - 5.481717e-2 * humidity * humidity
        + 1.22874e-3 * temp_f * temp_f * humidity
        + 8.5282e-4 * temp_f * humidity * humidity
        - 1.99e-6 * temp_f * temp_f * humidity * humidity
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
