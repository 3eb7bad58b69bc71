//! In-memory TTL cache shared by all in-flight requests.
//!
//! Expired entries are purged lazily on lookup; there is no background sweep,
//! so memory is bounded only by the number of distinct keys requested.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Store `value` under `key`, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = Instant::now();
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: now,
                expires_at: now + ttl,
            },
        );
    }

    /// Return the stored value if it has not expired; otherwise drop it.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
        // Read guard is released here; re-check so a concurrent refresh survives.
        self.entries.remove_if(key, |_, entry| !entry.is_fresh(now));
        None
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic cache key: `{kind}:{lat}:{lon}` rounded to `precision` decimals.
pub fn coordinate_key(kind: &str, lat: f64, lon: f64, precision: usize) -> String {
    format!("{kind}:{lat:.precision$}:{lon:.precision$}")
}
