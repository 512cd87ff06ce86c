//! Daily usage counters: upstream calls vs. cache hits vs. rate-limit
//! blocks. Feeds the 7-day activity report; days beyond the retention
//! horizon are dropped as new traffic arrives.

use chrono::{Duration, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;

const RETENTION_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DayStats {
    pub api: u64,
    pub cache: u64,
    pub blocked: u64,
}

#[derive(Debug, Default)]
pub struct UsageStats {
    days: DashMap<NaiveDate, DayStats>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one upstream API call.
    pub fn record_api(&self) {
        self.bump(|d| d.api += 1);
    }

    /// Count one response served from cache.
    pub fn record_cache(&self) {
        self.bump(|d| d.cache += 1);
    }

    /// Count one request denied by the rate limiter.
    pub fn record_blocked(&self) {
        self.bump(|d| d.blocked += 1);
    }

    fn bump(&self, f: impl FnOnce(&mut DayStats)) {
        let today = Utc::now().date_naive();
        f(&mut self.days.entry(today).or_default());
        if self.days.len() > RETENTION_DAYS {
            self.days
                .retain(|date, _| (today - *date).num_days() < RETENTION_DAYS as i64);
        }
    }

    /// Last-7-days report, oldest day first; quiet days are zero-filled.
    pub fn report(&self) -> Vec<(NaiveDate, DayStats)> {
        let today = Utc::now().date_naive();
        (0..RETENTION_DAYS as i64)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                let stats = self.days.get(&date).map(|e| *e).unwrap_or_default();
                (date, stats)
            })
            .collect()
    }

    pub fn clear(&self) {
        self.days.clear();
    }
}
