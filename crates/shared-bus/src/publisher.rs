//! # Event Publisher
//!
//! The publishing side of the bus. Services that only emit events depend on
//! this trait instead of the concrete [`EventBus`](crate::EventBus).

use crate::bus::DispatchReport;
use crate::error::BusError;
use crate::events::CoreEvent;
use shared_types::Payload;

/// Trait for publishing events to the bus.
pub trait EventPublisher: Send + Sync {
    /// Publish `payload` under `name`.
    ///
    /// Listener failures never surface here; only a rejected publish
    /// (empty name, rate limited) is an error.
    fn publish(&self, name: &str, payload: Payload) -> Result<DispatchReport, BusError>;

    /// Publish a core lifecycle event.
    fn publish_event(&self, event: &CoreEvent) -> Result<DispatchReport, BusError> {
        self.publish(event.name(), event.payload())
    }
}

/// Publisher that drops everything. Used where a service runs without a bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, name: &str, _payload: Payload) -> Result<DispatchReport, BusError> {
        if name.is_empty() {
            return Err(BusError::EmptyEventName);
        }
        Ok(DispatchReport {
            event: name.to_string(),
            delivered: 0,
            failed: 0,
        })
    }
}
