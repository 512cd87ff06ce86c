//! Generic expiring key-value stores.
//!
//! Models the host-provided transient storage: atomic per-key get/set with
//! TTL, lazy expiry on read, and bulk clear by key prefix. The forecast
//! cache and the rate-limit counters each get their own independent
//! instance and never share keys.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Abstract expiring store. Entries may disappear at any time; callers
/// must treat every read as fallible.
pub trait ExpiringStore: Send + Sync {
    /// Fetch a live value; expired entries read as absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value that expires after `ttl`, replacing any previous entry.
    fn set(&self, key: &str, value: String, ttl: Duration);

    /// Bump a counter, creating it at 1 with `window` TTL. The expiry of a
    /// live counter is left untouched, so the window is fixed rather than
    /// sliding. Returns the new count.
    fn increment(&self, key: &str, window: Duration) -> u64;

    /// Remove every entry whose key starts with `prefix`.
    fn clear_prefix(&self, prefix: &str);
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory `ExpiringStore` backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExpiringStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn increment(&self, key: &str, window: Duration) -> u64 {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".into(),
            expires_at: now + window,
        });
        if entry.expires_at <= now {
            entry.value = "0".into();
            entry.expires_at = now + window;
        }
        let next = entry.value.parse::<u64>().unwrap_or(0).saturating_add(1);
        entry.value = next.to_string();
        next
    }

    fn clear_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set("k", "v".into(), Duration::from_secs(60));
        assert_eq!(store.get("k"), Some("v".into()));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store.set("k", "v".into(), Duration::ZERO);
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_increment_creates_then_counts() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("c", Duration::from_secs(60)), 1);
        assert_eq!(store.increment("c", Duration::from_secs(60)), 2);
        assert_eq!(store.increment("c", Duration::from_secs(60)), 3);
        assert_eq!(store.get("c"), Some("3".into()));
    }

    #[test]
    fn test_increment_restarts_after_window_expiry() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("c", Duration::ZERO), 1);
        // Window already over: the next bump starts a fresh count.
        assert_eq!(store.increment("c", Duration::ZERO), 1);
    }

    #[test]
    fn test_clear_prefix_only_touches_matching_keys() {
        let store = MemoryStore::new();
        store.set("cache_a", "1".into(), Duration::from_secs(60));
        store.set("cache_b", "2".into(), Duration::from_secs(60));
        store.set("counter_a", "3".into(), Duration::from_secs(60));
        store.clear_prefix("cache_");
        assert_eq!(store.get("cache_a"), None);
        assert_eq!(store.get("cache_b"), None);
        assert_eq!(store.get("counter_a"), Some("3".into()));
    }
}
