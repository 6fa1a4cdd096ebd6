//! # Event Bus
//!
//! Synchronous in-process pub/sub with per-name rate limiting.
//!
//! Dispatch takes a snapshot of the listener bucket and releases the lock
//! before invoking anything, so a listener may register, unregister or
//! publish from inside its own callback. Changes made during a dispatch take
//! effect from the next publish.

use crate::error::BusError;
use crate::listener::Listener;
use crate::publisher::EventPublisher;
use crate::rate_limiter::{Admission, EventRateLimiter};
use parking_lot::RwLock;
use serde::Serialize;
use shared_types::{ConfigSource, Payload, TimeSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one admitted publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Event name.
    pub event: String,
    /// Listeners that returned success.
    pub delivered: usize,
    /// Listeners that returned an error or panicked.
    pub failed: usize,
}

/// Bus counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BusStats {
    /// Distinct event names with at least one listener.
    pub events: usize,
    /// Total registered listeners.
    pub listeners: usize,
    /// Admitted publishes.
    pub emitted: u64,
    /// Publishes rejected by the rate limiter.
    pub blocked: u64,
    /// Listener invocations that failed.
    pub errors: u64,
}

/// In-process event bus.
pub struct EventBus {
    /// Listener buckets keyed by event name, in registration order.
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
    limiter: EventRateLimiter,
    emitted: AtomicU64,
    blocked: AtomicU64,
    errors: AtomicU64,
}

impl EventBus {
    pub fn new(config: Arc<dyn ConfigSource>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            limiter: EventRateLimiter::new(config, clock),
            emitted: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Append `listener` to the bucket for `event`.
    pub fn register(&self, event: &str, listener: Listener) -> Result<(), BusError> {
        if event.is_empty() {
            return Err(BusError::EmptyEventName);
        }

        let mut listeners = self.listeners.write();
        let bucket = listeners.entry(event.to_string()).or_default();
        bucket.push(listener);
        debug!("[Bus] Registered listener for '{}' ({} total)", event, bucket.len());
        Ok(())
    }

    /// Remove the first listener in `event`'s bucket that is `listener`.
    ///
    /// Returns false if nothing matched. A bucket left empty is dropped.
    pub fn unregister(&self, event: &str, listener: &Listener) -> bool {
        let mut listeners = self.listeners.write();
        let Some(bucket) = listeners.get_mut(event) else {
            return false;
        };
        let Some(index) = bucket.iter().position(|l| l.same_as(listener)) else {
            return false;
        };

        bucket.remove(index);
        if bucket.is_empty() {
            listeners.remove(event);
        }
        debug!("[Bus] Unregistered listener for '{}'", event);
        true
    }

    /// Clear one bucket, or every bucket when `event` is `None`.
    pub fn unregister_all(&self, event: Option<&str>) {
        let mut listeners = self.listeners.write();
        match event {
            Some(event) => {
                listeners.remove(event);
            }
            None => listeners.clear(),
        }
    }

    /// Dispatch `payload` to every listener of `event`.
    pub fn emit(&self, event: &str, payload: &Payload) -> Result<DispatchReport, BusError> {
        if event.is_empty() {
            return Err(BusError::EmptyEventName);
        }

        if let Admission::Limited { policy, .. } = self.limiter.check(event) {
            self.blocked.fetch_add(1, Ordering::Relaxed);
            warn!(
                "[Bus] Rate limit exceeded for '{}' ({} per {}s)",
                event, policy.limit, policy.window_secs
            );
            return Err(BusError::RateLimited {
                event: event.to_string(),
                limit: policy.limit,
                window_secs: policy.window_secs,
            });
        }

        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default();

        let mut report = DispatchReport {
            event: event.to_string(),
            delivered: 0,
            failed: 0,
        };

        for listener in &snapshot {
            match listener.invoke(payload) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    self.errors.fetch_add(1, Ordering::Relaxed);
                    warn!("[Bus] Listener for '{}' failed: {}", event, e);
                }
            }
        }

        self.emitted.fetch_add(1, Ordering::Relaxed);
        Ok(report)
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Event names with at least one listener, sorted.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listeners.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop all rate-limit windows.
    pub fn reset_rate_limits(&self) {
        self.limiter.reset();
    }

    /// Rate limiter used by this bus.
    #[must_use]
    pub fn rate_limiter(&self) -> &EventRateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn stats(&self) -> BusStats {
        let listeners = self.listeners.read();
        BusStats {
            events: listeners.len(),
            listeners: listeners.values().map(Vec::len).sum(),
            emitted: self.emitted.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, name: &str, payload: Payload) -> Result<DispatchReport, BusError> {
        self.emit(name, &payload)
    }
}
