//! # Shared Bus - Event Bus for Core Services and Modules
//!
//! Every core service and every module talks to the others through this bus.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Module A    │                    │  Module B    │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │ [rate limit] │ ─────────┘
//!                  └──────────────┘  register()
//! ```
//!
//! ## Dispatch Guarantees
//!
//! - Listeners of one event name run in registration order, synchronously.
//! - A listener that fails (error result or panic) is counted and logged; the
//!   remaining listeners still run and the publisher never sees the failure.
//! - Each event name has a fixed-window rate limit; an over-limit publish
//!   invokes nothing.
//! - Ordering across different event names is not guaranteed.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod error;
pub mod events;
pub mod listener;
pub mod publisher;
pub mod rate_limiter;

// Re-export main types
pub use bus::{BusStats, DispatchReport, EventBus};
pub use error::BusError;
pub use events::CoreEvent;
pub use listener::{Listener, ListenerError};
pub use publisher::{EventPublisher, NoopPublisher};
pub use rate_limiter::{Admission, EventRateLimiter, RateLimitPolicy};

/// Default number of dispatches admitted per window for an event name.
pub const DEFAULT_RATE_LIMIT: u64 = 100;

/// Default rate-limit window in seconds.
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
