//! # Ephemeral State Store
//!
//! In-memory key/value store shared by modules for short-lived cross-module
//! state (sessions, cooldowns, lookups).
//!
//! ## Entry Lifecycle
//!
//! ```text
//! set(k, v, ttl) ──→ [LIVE] ──(now > expires_at)──→ [EXPIRED] ──get/has/clear_expired──→ [EVICTED]
//!                       │
//!                       └── delete / clear ──→ [EVICTED]
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Expired entries are never returned | `domain/store.rs` - `get()` checks `now > expires_at` |
//! | Expired entries are evicted on access | `domain/store.rs` - `get()` removes before returning |
//! | Empty keys are rejected | `domain/store.rs` - `set()` |
//!
//! There is no background sweeper in this crate; the runtime's maintenance
//! task calls [`StateStore::clear_expired`] on an interval.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;

pub use domain::entities::{CacheEntry, StoreStats};
pub use domain::errors::StoreError;
pub use domain::store::StateStore;
