//! Forecast request pipeline.
//!
//! One entry point runs the whole pipeline: admission control → input
//! validation → cache lookup → upstream fetch on miss → sanitization →
//! enrichment → cache write. Failures short-circuit before any network or
//! cache I/O they don't need.

use crate::cache::{adaptive_ttl, CacheManager};
use crate::enrich::enrich;
use crate::rate_limit::{Admission, RateLimiter};
use crate::stats::UsageStats;
use crate::store::ExpiringStore;
use crate::validate::validate_request;
use async_trait::async_trait;
use chrono::Utc;
use common::types::{ForecastRequest, ForecastResult, Unit};
use common::{GatewayConfig, GatewayError};
use openweather_client::{OpenWeatherClient, RawOneCall};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Upstream fetch seam; implemented by `OpenWeatherClient` and by
/// counting fakes in tests.
#[async_trait]
pub trait ForecastFetcher: Send + Sync {
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
        api_key: &str,
    ) -> Result<RawOneCall, GatewayError>;
}

#[async_trait]
impl ForecastFetcher for OpenWeatherClient {
    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        unit: Unit,
        api_key: &str,
    ) -> Result<RawOneCall, GatewayError> {
        OpenWeatherClient::fetch(self, lat, lon, unit, api_key).await
    }
}

pub struct Orchestrator {
    config: GatewayConfig,
    fetcher: Arc<dyn ForecastFetcher>,
    cache: CacheManager,
    limiter: RateLimiter,
    stats: Arc<UsageStats>,
}

impl Orchestrator {
    /// Wire the pipeline. The cache and the rate-limit counters take
    /// separate stores on purpose; flushing one never touches the other.
    pub fn new(
        config: GatewayConfig,
        fetcher: Arc<dyn ForecastFetcher>,
        cache_store: Arc<dyn ExpiringStore>,
        counter_store: Arc<dyn ExpiringStore>,
    ) -> Self {
        let config = config.clamped();
        let cache = CacheManager::new(cache_store, config.cache_enabled);
        let limiter = RateLimiter::new(
            counter_store,
            config.rate_limit_enabled,
            config.rate_limit_per_hour,
        );
        Self {
            config,
            fetcher,
            cache,
            limiter,
            stats: Arc::new(UsageStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<UsageStats> {
        self.stats.clone()
    }

    /// Clear all cached forecasts and the usage report. Rate-limit
    /// counters keep running.
    pub fn flush_cache(&self) {
        self.cache.flush();
        self.stats.clear();
    }

    /// Run one forecast request through the full pipeline.
    pub async fn forecast(
        &self,
        request: &ForecastRequest,
        client: IpAddr,
    ) -> Result<ForecastResult, GatewayError> {
        if self.config.api_key.trim().is_empty() {
            return Err(GatewayError::NotConfigured);
        }

        if self.limiter.admit(client) == Admission::Denied {
            self.stats.record_blocked();
            return Err(GatewayError::RateLimited);
        }

        validate_request(request.latitude, request.longitude, &request.location_name)?;

        if let Some(mut cached) = self.cache.get(&request.location_name, request.unit) {
            // Entries written under another style set may lack the field the
            // current style needs; enrichment is idempotent, so redo it on
            // the copy without rewriting the stored entry.
            enrich(&mut cached, self.config.style_set);
            self.stats.record_cache();
            debug!(
                "cache hit for {} ({})",
                request.location_name,
                request.unit.as_str()
            );
            return Ok(cached);
        }

        let raw = self
            .fetcher
            .fetch(
                request.latitude,
                request.longitude,
                request.unit,
                &self.config.api_key,
            )
            .await?;
        self.stats.record_api();

        let mut result = openweather_client::sanitize::sanitize(raw, request.unit)?;
        if result.daily.is_empty() {
            // A forecast with no daily entries never reaches the cache or
            // the caller.
            return Err(GatewayError::InvalidUpstreamPayload(
                "daily forecast is empty".into(),
            ));
        }

        enrich(&mut result, self.config.style_set);

        let ttl = adaptive_ttl(self.config.expiration_hours, &result.timezone, Utc::now());
        self.cache
            .put(&request.location_name, request.unit, &result, ttl);
        info!(
            "fetched forecast for {} ({}), ttl={}s",
            request.location_name,
            request.unit.as_str(),
            ttl.as_secs()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use common::types::StyleSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake upstream that serves a fixed body and counts calls.
    struct CountingFetcher {
        body: &'static str,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                body,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ForecastFetcher for CountingFetcher {
        async fn fetch(
            &self,
            _lat: f64,
            _lon: f64,
            _unit: Unit,
            _api_key: &str,
        ) -> Result<RawOneCall, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            serde_json::from_str(self.body)
                .map_err(|e| GatewayError::InvalidUpstreamPayload(e.to_string()))
        }
    }

    const WELL_FORMED: &str = r#"{
        "timezone": "America/Los_Angeles",
        "current": {
            "temp": 72.0, "feels_like": 71.0, "humidity": 40,
            "wind_speed": 5.0, "wind_deg": 250,
            "weather": [{"description": "clear sky", "icon": "01d"}]
        },
        "daily": [
            {"dt": 1, "temp": {"min": 60.0, "max": 80.0},
             "weather": [{"description": "clear sky", "icon": "01d"}]},
            {"dt": 2, "temp": {"min": 58.0, "max": 78.0},
             "weather": [{"description": "few clouds", "icon": "02d"}]},
            {"dt": 3, "temp": {"min": 59.0, "max": 79.0},
             "weather": [{"description": "rain", "icon": "10d"}]},
            {"dt": 4, "temp": {"min": 57.0, "max": 77.0},
             "weather": [{"description": "rain", "icon": "10d"}]},
            {"dt": 5, "temp": {"min": 56.0, "max": 76.0},
             "weather": [{"description": "clear sky", "icon": "01d"}]},
            {"dt": 6, "temp": {"min": 55.0, "max": 75.0},
             "weather": [{"description": "clear sky", "icon": "01d"}]},
            {"dt": 7, "temp": {"min": 54.0, "max": 74.0},
             "weather": [{"description": "snow", "icon": "13d"}]},
            {"dt": 8, "temp": {"min": 53.0, "max": 73.0},
             "weather": [{"description": "clear sky", "icon": "01d"}]}
        ]
    }"#;

    const NO_DAILY: &str = r#"{
        "timezone": "UTC",
        "current": {"temp": 50.0, "weather": [{"description": "rain", "icon": "10d"}]},
        "daily": []
    }"#;

    fn config(api_key: &str) -> GatewayConfig {
        GatewayConfig {
            api_key: api_key.into(),
            style_set: StyleSet::IconFont,
            ..Default::default()
        }
    }

    fn orchestrator(cfg: GatewayConfig, fetcher: Arc<CountingFetcher>) -> Orchestrator {
        Orchestrator::new(
            cfg,
            fetcher,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    fn la_request() -> ForecastRequest {
        ForecastRequest {
            latitude: 34.05,
            longitude: -118.25,
            location_name: "Los Angeles".into(),
            unit: Unit::Imperial,
        }
    }

    fn client() -> IpAddr {
        "203.0.113.5".parse().unwrap()
    }

    #[tokio::test]
    async fn test_cold_then_warm_calls_upstream_once() {
        let fetcher = CountingFetcher::new(WELL_FORMED);
        let orch = orchestrator(config("key"), fetcher.clone());

        let first = orch.forecast(&la_request(), client()).await.unwrap();
        assert_eq!(first.daily.len(), 8);
        assert_eq!(
            first.current.weather[0].icon_class.as_deref(),
            Some("wi-day-sunny")
        );
        assert_eq!(fetcher.calls(), 1);

        let second = orch.forecast(&la_request(), client()).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(fetcher.calls(), 1, "second request must be a cache hit");

        let report = orch.stats().report();
        let (_, today) = report.last().unwrap();
        assert_eq!(today.api, 1);
        assert_eq!(today.cache, 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_everything() {
        let fetcher = CountingFetcher::new(WELL_FORMED);
        let orch = orchestrator(config("  "), fetcher.clone());
        let err = orch.forecast(&la_request(), client()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_upstream() {
        let fetcher = CountingFetcher::new(WELL_FORMED);
        let orch = orchestrator(config("key"), fetcher.clone());

        let mut request = la_request();
        request.latitude = 91.0;
        let err = orch.forecast(&request, client()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let mut request = la_request();
        request.location_name = "<script>alert(1)</script>".into();
        let err = orch.forecast(&request, client()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_denial_is_counted() {
        let fetcher = CountingFetcher::new(WELL_FORMED);
        let cfg = GatewayConfig {
            rate_limit_enabled: true,
            rate_limit_per_hour: 10,
            ..config("key")
        };
        let orch = orchestrator(cfg, fetcher.clone());

        for _ in 0..10 {
            orch.forecast(&la_request(), client()).await.unwrap();
        }
        let err = orch.forecast(&la_request(), client()).await.unwrap_err();
        assert!(matches!(err, GatewayError::RateLimited));
        assert_eq!(err.status_code(), 429);
        // One real fetch, nine cache hits, one block.
        assert_eq!(fetcher.calls(), 1);
        let report = orch.stats().report();
        let (_, today) = report.last().unwrap();
        assert_eq!(today.blocked, 1);
    }

    #[tokio::test]
    async fn test_empty_daily_rejected_and_not_cached() {
        let fetcher = CountingFetcher::new(NO_DAILY);
        let orch = orchestrator(config("key"), fetcher.clone());

        let err = orch.forecast(&la_request(), client()).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUpstreamPayload(_)));

        // Still a miss: the bad payload must not have been cached.
        let err = orch.forecast(&la_request(), client()).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUpstreamPayload(_)));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_fetches_every_time() {
        let fetcher = CountingFetcher::new(WELL_FORMED);
        let cfg = GatewayConfig {
            cache_enabled: false,
            ..config("key")
        };
        let orch = orchestrator(cfg, fetcher.clone());

        let first = orch.forecast(&la_request(), client()).await.unwrap();
        let second = orch.forecast(&la_request(), client()).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        // Responses identical with caching on or off, fetched_at aside.
        assert_eq!(first.daily, second.daily);
        assert_eq!(first.current, second.current);
    }

    #[tokio::test]
    async fn test_cache_hit_repaired_for_new_style_set() {
        let fetcher = CountingFetcher::new(WELL_FORMED);
        let cache_store: Arc<MemoryStore> = Arc::new(MemoryStore::new());

        // Populate the cache with the plain-image style (no extra fields).
        let plain = GatewayConfig {
            style_set: StyleSet::PlainImage,
            ..config("key")
        };
        let orch = Orchestrator::new(
            plain,
            fetcher.clone(),
            cache_store.clone(),
            Arc::new(MemoryStore::new()),
        );
        let bare = orch.forecast(&la_request(), client()).await.unwrap();
        assert!(bare.current.weather[0].icon_class.is_none());

        // Same cache store, icon-font configuration: the hit is repaired.
        let orch = Orchestrator::new(
            config("key"),
            fetcher.clone(),
            cache_store,
            Arc::new(MemoryStore::new()),
        );
        let repaired = orch.forecast(&la_request(), client()).await.unwrap();
        assert_eq!(fetcher.calls(), 1, "repair must not refetch");
        assert_eq!(
            repaired.current.weather[0].icon_class.as_deref(),
            Some("wi-day-sunny")
        );
        assert_eq!(
            repaired.daily[2].weather[0].icon_class.as_deref(),
            Some("wi-day-rain")
        );
    }

    #[tokio::test]
    async fn test_flush_cache_forces_refetch() {
        let fetcher = CountingFetcher::new(WELL_FORMED);
        let orch = orchestrator(config("key"), fetcher.clone());

        orch.forecast(&la_request(), client()).await.unwrap();
        orch.flush_cache();
        orch.forecast(&la_request(), client()).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }
}
