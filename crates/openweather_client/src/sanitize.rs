//! Validation and sanitization of the untrusted upstream payload.
//!
//! Converts `RawOneCall` into the typed `ForecastResult`. Structural
//! problems (no current conditions) reject the payload; field-level
//! anomalies are repaired in place — the caller gets a plausible degraded
//! forecast rather than an error.

use crate::{RawDaily, RawOneCall, RawWeather};
use chrono::Utc;
use common::types::{
    Alert, CurrentConditions, DailyConditions, DailyTemp, ForecastResult, Unit, WeatherDescriptor,
};
use common::GatewayError;
use tracing::debug;

/// Plausible temperature window and fallback, metric.
const METRIC_TEMP_RANGE: (f64, f64) = (-50.0, 60.0);
const METRIC_TEMP_FALLBACK: f64 = 20.0;
/// Plausible temperature window and fallback, imperial.
const IMPERIAL_TEMP_RANGE: (f64, f64) = (-60.0, 150.0);
const IMPERIAL_TEMP_FALLBACK: f64 = 70.0;
/// Daily highs get a wider window; both unit systems share it.
const DAILY_MAX_RANGE: (f64, f64) = (-100.0, 150.0);
const DAILY_MAX_FALLBACK: f64 = 70.0;
/// Substituted for icon codes that do not match `NNd`/`NNn`.
const CLEAR_SKY_ICON: &str = "01d";

/// Validate and sanitize a decoded upstream payload.
///
/// Rejects only when `current` is absent; every other anomaly is clamped
/// or substituted. Attaches `fetched_at` and the requested unit system.
pub fn sanitize(raw: RawOneCall, unit: Unit) -> Result<ForecastResult, GatewayError> {
    let current = raw
        .current
        .ok_or_else(|| GatewayError::InvalidUpstreamPayload("missing current conditions".into()))?;

    let (range, fallback) = match unit {
        Unit::Metric => (METRIC_TEMP_RANGE, METRIC_TEMP_FALLBACK),
        Unit::Imperial => (IMPERIAL_TEMP_RANGE, IMPERIAL_TEMP_FALLBACK),
    };

    let temp = plausible_or(current.temp, range, fallback);
    let feels_like = plausible_or(current.feels_like, range, temp);

    let humidity = current.humidity.map(|h| h.clamp(0.0, 100.0));

    let sanitized = ForecastResult {
        current: CurrentConditions {
            temp,
            feels_like,
            humidity,
            wind_speed: current.wind_speed.unwrap_or(0.0),
            wind_deg: current.wind_deg.unwrap_or(0.0),
            weather: vec![sanitize_descriptor(current.weather.first())],
            sunrise: current.sunrise,
            sunset: current.sunset,
        },
        daily: raw.daily.iter().map(sanitize_daily).collect(),
        alerts: raw
            .alerts
            .into_iter()
            .map(|a| Alert {
                event: a.event,
                sender_name: a.sender_name,
                description: a.description,
            })
            .collect(),
        timezone: raw.timezone,
        fetched_at: Utc::now().timestamp(),
        units: unit,
    };

    Ok(sanitized)
}

fn sanitize_daily(day: &RawDaily) -> DailyConditions {
    let raw_max = day.temp.as_ref().and_then(|t| t.max);
    let max = plausible_or(raw_max, DAILY_MAX_RANGE, DAILY_MAX_FALLBACK);
    let min = day.temp.as_ref().and_then(|t| t.min).unwrap_or(max);

    DailyConditions {
        dt: day.dt,
        temp: DailyTemp { min, max },
        weather: vec![sanitize_descriptor(day.weather.first())],
    }
}

fn sanitize_descriptor(weather: Option<&RawWeather>) -> WeatherDescriptor {
    let (description, icon) = match weather {
        Some(w) => (strip_markup(&w.description), sanitize_icon(&w.icon)),
        None => (String::new(), CLEAR_SKY_ICON.to_string()),
    };
    WeatherDescriptor {
        description,
        icon,
        icon_class: None,
        icon_name: None,
    }
}

/// Accept a value only inside its plausibility window; substitute the
/// fallback otherwise. NaN reads as implausible.
fn plausible_or(value: Option<f64>, (min, max): (f64, f64), fallback: f64) -> f64 {
    match value {
        Some(v) if v >= min && v <= max => v,
        Some(v) => {
            debug!("implausible temperature {v} replaced with {fallback}");
            fallback
        }
        None => fallback,
    }
}

/// Icon codes are two ASCII digits followed by `d` or `n`.
fn sanitize_icon(code: &str) -> String {
    let bytes = code.as_bytes();
    let valid = bytes.len() == 3
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && (bytes[2] == b'd' || bytes[2] == b'n');
    if valid {
        code.to_string()
    } else {
        debug!("malformed icon code {code:?} replaced with {CLEAR_SKY_ICON}");
        CLEAR_SKY_ICON.to_string()
    }
}

/// Reduce a description to plain text: drop `<...>` tag segments and any
/// stray markup-significant characters.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '"' | '\'' | '{' | '}' => {}
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}
