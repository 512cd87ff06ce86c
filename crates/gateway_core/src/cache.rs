//! Forecast cache: key derivation, adaptive TTL, get/put.
//!
//! Caching is a pure optimization — with the cache disabled every lookup
//! misses and every write is a no-op, and responses are identical.

use crate::store::ExpiringStore;
use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use common::types::{ForecastResult, Unit};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const FORECAST_KEY_PREFIX: &str = "utw_forecast_";
/// Cached forecasts never live shorter than 30 minutes.
const MIN_TTL_SECS: u64 = 1800;
const MIN_EXPIRATION_HOURS: f64 = 0.5;
/// Added to the midnight candidate to guard against clock skew serving
/// yesterday's forecast past midnight.
const MIDNIGHT_BUFFER_SECS: u64 = 600;

pub struct CacheManager {
    store: Arc<dyn ExpiringStore>,
    enabled: bool,
}

impl CacheManager {
    pub fn new(store: Arc<dyn ExpiringStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Look up a cached snapshot. Undecodable entries are discarded as if
    /// absent; the store may drop entries at any time anyway.
    pub fn get(&self, location_name: &str, unit: Unit) -> Option<ForecastResult> {
        if !self.enabled {
            return None;
        }
        let key = cache_key(location_name, unit);
        let raw = self.store.get(&key)?;
        match serde_json::from_str(&raw) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("discarding undecodable cache entry {key}: {e}");
                None
            }
        }
    }

    /// Store an independent snapshot of `result` under the derived key.
    pub fn put(&self, location_name: &str, unit: Unit, result: &ForecastResult, ttl: Duration) {
        if !self.enabled {
            return;
        }
        let key = cache_key(location_name, unit);
        match serde_json::to_string(result) {
            Ok(raw) => {
                debug!("caching {key} for {}s", ttl.as_secs());
                self.store.set(&key, raw, ttl);
            }
            Err(e) => warn!("failed to serialize forecast for {key}: {e}"),
        }
    }

    /// Drop every forecast entry. Rate-limit counters live elsewhere and
    /// are unaffected.
    pub fn flush(&self) {
        self.store.clear_prefix(FORECAST_KEY_PREFIX);
    }
}

/// Stable, identifier-safe cache key for a (location, unit) pair.
pub fn cache_key(location_name: &str, unit: Unit) -> String {
    format!(
        "{FORECAST_KEY_PREFIX}{}_{}",
        normalize_location(location_name),
        unit.as_str()
    )
}

/// Lowercase, alphanumerics kept, every run of anything else collapsed to
/// a single `-`.
fn normalize_location(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Effective TTL for a forecast entry.
///
/// Candidate A is the fixed configured lifetime (hours floored at 0.5);
/// candidate B is the time until the next local midnight in the forecast's
/// own timezone plus a skew buffer, skipped when the timezone does not
/// resolve. The lesser candidate wins, floored at 30 minutes.
pub fn adaptive_ttl(expiration_hours: f64, timezone: &str, now: DateTime<Utc>) -> Duration {
    let fixed_secs = (expiration_hours.max(MIN_EXPIRATION_HOURS) * 3600.0).round() as u64;

    let mut ttl = fixed_secs;
    if let Some(secs) = secs_until_local_midnight(timezone, now) {
        ttl = ttl.min(secs.saturating_add(MIDNIGHT_BUFFER_SECS));
    }

    Duration::from_secs(ttl.max(MIN_TTL_SECS))
}

fn secs_until_local_midnight(timezone: &str, now: DateTime<Utc>) -> Option<u64> {
    let tz: Tz = timezone.parse().ok()?;
    let local = now.with_timezone(&tz);
    let next_midnight = local
        .date_naive()
        .checked_add_days(Days::new(1))?
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(tz)
        // A DST transition exactly at midnight makes the instant ambiguous
        // or nonexistent; take the earlier reading, or skip the candidate.
        .earliest()?;
    let secs = (next_midnight.with_timezone(&Utc) - now).num_seconds();
    u64::try_from(secs).ok()
}
