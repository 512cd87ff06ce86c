//! Domain types shared across the gateway.
//!
//! `ForecastResult` and everything under it are value snapshots: the cache
//! stores independent copies, so `Clone` everywhere and no shared mutable
//! state between cache and caller.

use serde::{Deserialize, Serialize};

/// Unit system requested by the caller and forwarded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Imperial,
    Metric,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Imperial => "imperial",
            Unit::Metric => "metric",
        }
    }
}

/// Visual representation scheme; decides which enrichment field is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleSet {
    /// Renderer derives an image filename from the icon code directly.
    #[default]
    PlainImage,
    /// Weather Icons font classes (`wi-*`).
    IconFont,
    VectorFill,
    VectorOutline,
}

/// One inbound forecast request. Constructed once per call, immutable.
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub unit: Unit,
}

/// Weather descriptor attached to current and daily conditions.
///
/// `icon_class`/`icon_name` are populated by the enricher depending on the
/// configured style set; absent fields are omitted from the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDescriptor {
    pub description: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    pub wind_speed: f64,
    pub wind_deg: f64,
    /// One-element descriptor list, matching the upstream shape.
    pub weather: Vec<WeatherDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTemp {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConditions {
    /// Forecast date, epoch seconds.
    pub dt: i64,
    pub temp: DailyTemp,
    pub weather: Vec<WeatherDescriptor>,
}

/// Weather alert, passed through to the renderer untransformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub event: String,
    pub sender_name: String,
    pub description: String,
}

/// A complete, sanitized forecast as returned to the caller and cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub current: CurrentConditions,
    pub daily: Vec<DailyConditions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
    pub timezone: String,
    /// When the payload was fetched from upstream, epoch seconds.
    pub fetched_at: i64,
    pub units: Unit,
}
