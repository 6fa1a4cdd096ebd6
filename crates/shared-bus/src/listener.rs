//! # Listeners
//!
//! A [`Listener`] is a callback bound to one event name. Listeners are
//! reference-counted handles: cloning one keeps the same identity, which is
//! what `unregister` compares against.

use shared_types::Payload;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a listener invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

type Callback = dyn Fn(&Payload) -> Result<(), ListenerError> + Send + Sync;

/// Handle to a registered callback.
#[derive(Clone)]
pub struct Listener {
    callback: Arc<Callback>,
}

impl Listener {
    /// Wrap a fallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Payload) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Wrap a callback that never reports failure.
    pub fn infallible<F>(callback: F) -> Self
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        Self::new(move |payload| {
            callback(payload);
            Ok(())
        })
    }

    /// True if both handles refer to the same registered callback.
    #[must_use]
    pub fn same_as(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }

    /// Invoke the callback. A panic inside the callback is caught and turned
    /// into a [`ListenerError`].
    pub fn invoke(&self, payload: &Payload) -> Result<(), ListenerError> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(payload))) {
            Ok(result) => result,
            Err(panic) => Err(ListenerError::new(format!(
                "listener panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &Arc::as_ptr(&self.callback))
            .finish()
    }
}

/// Best-effort text of a caught panic payload.
#[must_use]
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
