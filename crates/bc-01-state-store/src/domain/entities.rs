//! Store entities.

use serde::Serialize;
use shared_types::{Payload, Timestamp};

/// A stored value with its optional expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Payload,
    /// Absolute expiry in ms; `None` never expires.
    pub expires_at: Option<Timestamp>,
}

impl CacheEntry {
    /// An entry is expired strictly after its expiry instant.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Snapshot of store counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Entries currently held, including expired ones not yet evicted.
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// `hits / (hits + misses)`, or 0 before any read.
    pub hit_rate: f64,
}
