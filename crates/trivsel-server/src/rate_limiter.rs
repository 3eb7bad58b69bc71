//! Fixed-window request counter keyed by client identity.
//!
//! Counts reset at window boundaries instead of decaying, so a client can
//! burst up to twice the limit across a boundary. Memory per key is O(1).

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, RateWindow>>,
    limit: u32,
    window: Duration,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            limit,
            window,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(u32::MAX, Duration::ZERO)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check with this limiter's configured limit and window. Returns true if allowed.
    pub fn check(&self, key: &str) -> bool {
        self.check_with(key, self.limit, self.window)
    }

    /// Check with an explicit limit and window.
    pub fn check_with(&self, key: &str, limit: u32, window: Duration) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut entry = match self.windows.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateWindow {
                    window_start: now,
                    count: 1,
                });
                return true;
            }
            Entry::Occupied(occupied) => occupied,
        };
        let record = entry.get_mut();

        if now.duration_since(record.window_start) > window {
            *record = RateWindow {
                window_start: now,
                count: 1,
            };
            return true;
        }

        if record.count < limit {
            record.count += 1;
            true
        } else {
            false
        }
    }

    /// Approximate requests left in the current window for `key`.
    pub fn remaining(&self, key: &str) -> u32 {
        match self.windows.get(key) {
            Some(record) => self.limit.saturating_sub(record.count),
            None => self.limit,
        }
    }
}
