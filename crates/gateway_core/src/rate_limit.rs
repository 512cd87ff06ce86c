//! Per-client admission control.
//!
//! Fixed one-hour window keyed by a one-way hash of the client IP. The
//! counter store is independent of the forecast cache and is never flushed
//! together with it.

use crate::store::ExpiringStore;
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(3600);
const KEY_PREFIX: &str = "utw_ratelimit_";
const FALLBACK_IDENTITY: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

pub struct RateLimiter {
    store: Arc<dyn ExpiringStore>,
    enabled: bool,
    limit: u64,
    window: Duration,
}

impl RateLimiter {
    /// The limit arrives pre-clamped from `GatewayConfig::clamped`; the
    /// limiter itself enforces whatever it is handed.
    pub fn new(store: Arc<dyn ExpiringStore>, enabled: bool, requests_per_hour: u32) -> Self {
        Self::with_window(store, enabled, requests_per_hour, RATE_LIMIT_WINDOW)
    }

    /// Construct with a custom window (shortened in tests).
    pub fn with_window(
        store: Arc<dyn ExpiringStore>,
        enabled: bool,
        requests_per_hour: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            enabled,
            limit: u64::from(requests_per_hour),
            window,
        }
    }

    /// Admit or deny one request from `client`.
    ///
    /// Denials do not advance the counter, so a blocked client's window
    /// still expires on schedule.
    pub fn admit(&self, client: IpAddr) -> Admission {
        if !self.enabled {
            return Admission::Allowed;
        }

        let key = counter_key(client);
        let current = self
            .store
            .get(&key)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        if current >= self.limit {
            debug!("rate limit exceeded for {client}");
            return Admission::Denied;
        }

        self.store.increment(&key, self.window);
        Admission::Allowed
    }
}

fn counter_key(client: IpAddr) -> String {
    let digest = Sha256::digest(client.to_string().as_bytes());
    format!("{KEY_PREFIX}{}", hex::encode(digest))
}

/// Resolve the client identity: forwarded-for header (first entry), then
/// real-IP header, then the socket peer. Each candidate must parse as a
/// well-formed IP address; loopback is the fallback when none do.
pub fn resolve_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer: Option<IpAddr>,
) -> IpAddr {
    if let Some(first) = forwarded_for.and_then(|raw| raw.split(',').next()) {
        if let Ok(ip) = first.trim().parse::<IpAddr>() {
            return ip;
        }
    }
    if let Some(raw) = real_ip {
        if let Ok(ip) = raw.trim().parse::<IpAddr>() {
            return ip;
        }
    }
    peer.unwrap_or(FALLBACK_IDENTITY)
}
