//! OpenWeather One Call API client.
//!
//! Issues the single outbound request of the pipeline and decodes the body
//! into a loosely-typed raw payload. Nothing in `RawOneCall` is trusted
//! until it has passed through [`sanitize`].

pub mod sanitize;

use common::{GatewayError, Unit};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "weather-gateway/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather client with a bounded request timeout and fixed identifier.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
}

// ── Raw upstream payload ──────────────────────────────────────────────
// Every field is optional or defaulted: the upstream shape is not ours to
// rely on, and presence checks belong to the sanitizer.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOneCall {
    #[serde(default)]
    pub current: Option<RawCurrent>,
    #[serde(default)]
    pub daily: Vec<RawDaily>,
    #[serde(default)]
    pub alerts: Vec<RawAlert>,
    #[serde(default)]
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrent {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_deg: Option<f64>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
    #[serde(default)]
    pub weather: Vec<RawWeather>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWeather {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDaily {
    #[serde(default)]
    pub dt: i64,
    #[serde(default)]
    pub temp: Option<RawDailyTemp>,
    #[serde(default)]
    pub weather: Vec<RawWeather>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDailyTemp {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlert {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub description: String,
}

// ── Implementation ────────────────────────────────────────────────────

impl OpenWeatherClient {
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Build a client against a non-default endpoint (used by tests).
    pub fn with_base_url(base_url: &str) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Config(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the One Call payload for a coordinate.
    ///
    /// No retries: transport failures and non-200 statuses surface
    /// immediately as `UpstreamUnavailable`; an undecodable body is
    /// `InvalidUpstreamPayload`.
    pub async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
        api_key: &str,
    ) -> Result<RawOneCall, GatewayError> {
        let url = format!("{}/data/3.0/onecall", self.base_url);

        debug!(
            "Fetching upstream forecast: lat={} lon={} units={}",
            lat,
            lon,
            unit.as_str()
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", unit.as_str().to_string()),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(format!("HTTP error: {e}")))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(GatewayError::UpstreamUnavailable(format!(
                "upstream returned status {status}"
            )));
        }

        resp.json::<RawOneCall>()
            .await
            .map_err(|e| GatewayError::InvalidUpstreamPayload(format!("JSON decode error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_body() -> &'static str {
        r#"{
            "timezone": "America/Los_Angeles",
            "current": {
                "temp": 72.4,
                "feels_like": 71.0,
                "humidity": 40,
                "wind_speed": 5.2,
                "wind_deg": 250,
                "sunrise": 1756476000,
                "sunset": 1756523000,
                "weather": [{"description": "clear sky", "icon": "01d"}]
            },
            "daily": [
                {
                    "dt": 1756500000,
                    "temp": {"min": 61.0, "max": 84.0},
                    "weather": [{"description": "clear sky", "icon": "01d"}]
                }
            ]
        }"#
    }

    #[test]
    fn test_deserialize_one_call_body() {
        let parsed: RawOneCall = serde_json::from_str(sample_body()).expect("body should decode");
        let current = parsed.current.expect("current present");
        assert_eq!(current.temp, Some(72.4));
        assert_eq!(current.humidity, Some(40.0));
        assert_eq!(parsed.daily.len(), 1);
        assert_eq!(parsed.timezone, "America/Los_Angeles");
        assert!(parsed.alerts.is_empty());
    }

    #[test]
    fn test_deserialize_tolerates_missing_fields() {
        let parsed: RawOneCall = serde_json::from_str("{}").expect("empty object decodes");
        assert!(parsed.current.is_none());
        assert!(parsed.daily.is_empty());
        assert!(parsed.timezone.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sends_key_and_units() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .and(query_param("lat", "34.05"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri()).unwrap();
        let raw = client
            .fetch(34.05, -118.25, Unit::Metric, "test-key")
            .await
            .expect("fetch should succeed");
        assert!(raw.current.is_some());
    }

    #[tokio::test]
    async fn test_fetch_maps_non_200_to_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"cod\":401}"))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri()).unwrap();
        let err = client
            .fetch(34.05, -118.25, Unit::Imperial, "bad-key")
            .await
            .expect_err("401 should fail");
        match err {
            GatewayError::UpstreamUnavailable(msg) => assert!(msg.contains("401")),
            other => panic!("expected UpstreamUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_maps_garbage_body_to_invalid_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::with_base_url(&server.uri()).unwrap();
        let err = client
            .fetch(34.05, -118.25, Unit::Imperial, "key")
            .await
            .expect_err("garbage body should fail");
        assert!(matches!(err, GatewayError::InvalidUpstreamPayload(_)));
    }
}
