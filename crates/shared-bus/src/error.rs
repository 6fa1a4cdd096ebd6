//! Bus error types.

use thiserror::Error;

/// Errors from bus operations. None of them change bus state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Event names must be non-empty.
    #[error("Event name must be a non-empty string")]
    EmptyEventName,

    /// The event exceeded its rate limit for the current window.
    #[error("Rate limit exceeded for event '{event}' (limit {limit} per {window_secs}s)")]
    RateLimited {
        event: String,
        limit: u64,
        window_secs: u64,
    },
}
