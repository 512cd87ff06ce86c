//! Gateway configuration types.
//!
//! The settings layer owns persistence; the orchestrator receives one
//! immutable `GatewayConfig` at construction time.

use crate::types::StyleSet;
use serde::{Deserialize, Serialize};

/// Allowed range for the fixed cache lifetime, hours.
pub const EXPIRATION_HOURS_RANGE: (f64, f64) = (0.5, 8.0);
/// Allowed range for the per-client hourly request limit.
pub const RATE_LIMIT_RANGE: (u32, u32) = (10, 1000);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// OpenWeather API key. Empty means not configured; requests fail with
    /// a 500-equivalent until it is set.
    #[serde(default)]
    pub api_key: String,

    /// Cache upstream results to reduce API calls.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Fixed cache lifetime in hours, clamped to [0.5, 8].
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: f64,

    /// Icon style set applied by the enricher.
    #[serde(default)]
    pub style_set: StyleSet,

    /// Per-client admission control.
    #[serde(default)]
    pub rate_limit_enabled: bool,

    /// Requests per hour per client identity, clamped to [10, 1000].
    #[serde(default = "default_rate_limit_per_hour")]
    pub rate_limit_per_hour: u32,

    /// Address the HTTP facade binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_true() -> bool {
    true
}

fn default_expiration_hours() -> f64 {
    4.0
}

fn default_rate_limit_per_hour() -> u32 {
    100
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            cache_enabled: default_true(),
            expiration_hours: default_expiration_hours(),
            style_set: StyleSet::default(),
            rate_limit_enabled: false,
            rate_limit_per_hour: default_rate_limit_per_hour(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl GatewayConfig {
    /// Clamp stored values into their allowed ranges. Applied once at
    /// configuration time; out-of-range persisted values never reach the
    /// pipeline.
    pub fn clamped(mut self) -> Self {
        let (min_hours, max_hours) = EXPIRATION_HOURS_RANGE;
        if !self.expiration_hours.is_finite() {
            self.expiration_hours = default_expiration_hours();
        }
        self.expiration_hours = self.expiration_hours.clamp(min_hours, max_hours);

        let (min_limit, max_limit) = RATE_LIMIT_RANGE;
        self.rate_limit_per_hour = self.rate_limit_per_hour.clamp(min_limit, max_limit);
        self
    }
}
