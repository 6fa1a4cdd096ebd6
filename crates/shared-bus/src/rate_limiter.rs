//! # Per-Event Rate Limiter
//!
//! Fixed-window counter per event name.
//!
//! ## Algorithm
//!
//! - A window `{count, reset_at}` is created on the first dispatch of a name
//! - A dispatch at or after `reset_at` restarts the window at `{0, now + window}`
//! - A dispatch is admitted while `count < limit`, and bumps `count`
//!
//! Windows are only reset when a dispatch arrives; there is no timer. Across
//! a window boundary up to twice the nominal limit can pass.
//!
//! ## Configuration
//!
//! | Path | Default |
//! |------|---------|
//! | `rate_limit.enabled` | `true` |
//! | `rate_limit.default_limit` | `100` |
//! | `rate_limit.window` | `60` seconds |
//! | `rate_limit.events.<name>.limit` | falls back to the default pair |
//! | `rate_limit.events.<name>.window` | falls back to `rate_limit.window` |

use crate::{DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW_SECS};
use parking_lot::Mutex;
use shared_types::{ConfigSource, TimeSource, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;

/// Limit and window length resolved for one event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Dispatches admitted per window.
    pub limit: u64,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitPolicy {
    fn window_ms(&self) -> u64 {
        self.window_secs.saturating_mul(1000)
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Dispatch admitted; `count` is the window count including this one.
    Admitted { count: u64 },
    /// Rate limiting is disabled by configuration.
    Unlimited,
    /// Over the limit until `retry_at`.
    Limited {
        policy: RateLimitPolicy,
        retry_at: Timestamp,
    },
}

impl Admission {
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Self::Limited { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    count: u64,
    reset_at: Timestamp,
}

/// Rate limiter keyed by event name.
pub struct EventRateLimiter {
    /// Window per event name. Check and increment happen under this lock.
    windows: Mutex<HashMap<String, RateLimitWindow>>,
    config: Arc<dyn ConfigSource>,
    clock: Arc<dyn TimeSource>,
}

impl EventRateLimiter {
    pub fn new(config: Arc<dyn ConfigSource>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Whether limiting is switched on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.get_bool("rate_limit.enabled", true)
    }

    /// Resolve the policy for `event`.
    ///
    /// An override only counts when it carries a positive `limit`; a missing
    /// override `window` uses the global window.
    #[must_use]
    pub fn policy_for(&self, event: &str) -> RateLimitPolicy {
        let default_window = self
            .config
            .get_u64("rate_limit.window", DEFAULT_RATE_WINDOW_SECS);

        // Event names may contain dots, so the override table is indexed
        // directly instead of through a dotted path.
        let overrides = self
            .config
            .lookup("rate_limit.events")
            .and_then(|events| events.get(event).cloned());

        let override_limit = overrides
            .as_ref()
            .and_then(|o| o.get("limit"))
            .and_then(|v| v.as_u64())
            .filter(|limit| *limit > 0);

        match override_limit {
            Some(limit) => RateLimitPolicy {
                limit,
                window_secs: overrides
                    .as_ref()
                    .and_then(|o| o.get("window"))
                    .and_then(|v| v.as_u64())
                    .unwrap_or(default_window),
            },
            None => RateLimitPolicy {
                limit: self
                    .config
                    .get_u64("rate_limit.default_limit", DEFAULT_RATE_LIMIT),
                window_secs: default_window,
            },
        }
    }

    /// Check `event` against its window and count it if admitted.
    pub fn check(&self, event: &str) -> Admission {
        if !self.is_enabled() {
            return Admission::Unlimited;
        }

        let policy = self.policy_for(event);
        let now = self.clock.now();

        let mut windows = self.windows.lock();
        let window = windows
            .entry(event.to_string())
            .or_insert_with(|| RateLimitWindow {
                count: 0,
                reset_at: now.saturating_add(policy.window_ms()),
            });

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now.saturating_add(policy.window_ms());
        }

        if window.count >= policy.limit {
            return Admission::Limited {
                policy,
                retry_at: window.reset_at,
            };
        }

        window.count += 1;
        Admission::Admitted {
            count: window.count,
        }
    }

    /// Current `(count, reset_at)` for `event`, if a window exists.
    #[must_use]
    pub fn window(&self, event: &str) -> Option<(u64, Timestamp)> {
        self.windows
            .lock()
            .get(event)
            .map(|w| (w.count, w.reset_at))
    }

    /// Number of event names with a window.
    #[must_use]
    pub fn tracked_events(&self) -> usize {
        self.windows.lock().len()
    }

    /// Drop every window.
    pub fn reset(&self) {
        self.windows.lock().clear();
    }
}
