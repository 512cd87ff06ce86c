//! Core forecast pipeline: admission control, input validation, caching
//! with adaptive TTL, icon enrichment, usage accounting, and the
//! orchestrator tying them together.

pub mod cache;
pub mod enrich;
pub mod orchestrator;
pub mod rate_limit;
pub mod stats;
pub mod store;
pub mod validate;

pub use cache::{adaptive_ttl, cache_key, CacheManager};
pub use orchestrator::{ForecastFetcher, Orchestrator};
pub use rate_limit::{resolve_client_ip, Admission, RateLimiter};
pub use stats::{DayStats, UsageStats};
pub use store::{ExpiringStore, MemoryStore};
pub use validate::validate_request;
