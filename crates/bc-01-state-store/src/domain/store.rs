//! # State Store
//!
//! A single `parking_lot` mutex guards the map and the counters together, so
//! an expiry check, the eviction and the hit/miss bump are one step.

use super::entities::{CacheEntry, StoreStats};
use super::errors::StoreError;
use parking_lot::Mutex;
use shared_types::{Payload, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    sets: u64,
    deletes: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    counters: Counters,
}

/// TTL-bearing key/value store.
pub struct StateStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn TimeSource>,
}

impl StateStore {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// A non-zero `ttl` makes the entry expire `ttl` after now.
    pub fn set(&self, key: &str, value: Payload, ttl: Option<Duration>) -> Result<(), StoreError> {
        if key.is_empty() {
            error!("[StateStore] Cache key must be a non-empty string");
            return Err(StoreError::EmptyKey);
        }

        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| {
                let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
                self.clock.now().saturating_add(ttl_ms)
            });

        let mut inner = self.inner.lock();
        inner
            .entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
        inner.counters.sets += 1;
        Ok(())
    }

    /// Read `key`. Expired entries are evicted and count as a miss.
    ///
    /// A stored JSON `null` reads back as `None`, but still counts as a hit.
    pub fn get(&self, key: &str) -> Option<Payload> {
        if key.is_empty() {
            return None;
        }

        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            None => {
                inner.counters.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            inner.entries.remove(key);
            inner.counters.misses += 1;
            debug!(key, "[StateStore] Evicted expired entry");
            return None;
        }

        inner.counters.hits += 1;
        match inner.entries.get(key) {
            Some(entry) if !entry.value.is_null() => Some(entry.value.clone()),
            _ => None,
        }
    }

    /// Remove `key`. Returns false if it was not present.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.entries.remove(key).is_some() {
            inner.counters.deletes += 1;
            true
        } else {
            false
        }
    }

    /// Same as `get(key).is_some()`, including its eviction and counting.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove every entry and return how many there were.
    pub fn clear(&self) -> usize {
        let count = {
            let mut inner = self.inner.lock();
            let count = inner.entries.len();
            inner.entries.clear();
            count
        };
        info!("[StateStore] Cache cleared: {} entries removed", count);
        count
    }

    /// Evict every expired entry and return how many were removed.
    pub fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        let count = {
            let mut inner = self.inner.lock();
            let before = inner.entries.len();
            inner.entries.retain(|_, entry| !entry.is_expired(now));
            before - inner.entries.len()
        };
        if count > 0 {
            debug!("[StateStore] Cleared {} expired cache entries", count);
        }
        count
    }

    /// Unexpired keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut keys: Vec<String> = self
            .inner
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Entries held, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.lock();
        let c = &inner.counters;
        let requests = c.hits + c.misses;
        StoreStats {
            size: inner.entries.len(),
            hits: c.hits,
            misses: c.misses,
            sets: c.sets,
            deletes: c.deletes,
            hit_rate: if requests == 0 {
                0.0
            } else {
                c.hits as f64 / requests as f64
            },
        }
    }
}
