//! Prometheus metrics for Bucu Core services.
//!
//! All metrics follow the naming convention: `bucu_<service>_<metric>`.
//! Services keep their own counters; the runtime copies a
//! [`MetricsSnapshot`] into these gauges on every maintenance tick.

use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntGauge, Registry, TextEncoder};
use serde::Serialize;

use crate::TelemetryError;

lazy_static! {
    /// Process metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EVENT BUS
    // =========================================================================

    pub static ref BUS_EVENTS_EMITTED: IntGauge = IntGauge::new(
        "bucu_bus_events_emitted",
        "Publishes admitted by the event bus"
    ).expect("metric creation failed");

    pub static ref BUS_EVENTS_BLOCKED: IntGauge = IntGauge::new(
        "bucu_bus_events_blocked",
        "Publishes rejected by the rate limiter"
    ).expect("metric creation failed");

    pub static ref BUS_LISTENER_ERRORS: IntGauge = IntGauge::new(
        "bucu_bus_listener_errors",
        "Listener invocations that failed or panicked"
    ).expect("metric creation failed");

    pub static ref BUS_LISTENERS: IntGauge = IntGauge::new(
        "bucu_bus_listeners",
        "Registered listeners"
    ).expect("metric creation failed");

    // =========================================================================
    // MODULE LOADER
    // =========================================================================

    pub static ref MODULES_LOADED: IntGauge = IntGauge::new(
        "bucu_modules_loaded",
        "Modules in the loaded state"
    ).expect("metric creation failed");

    pub static ref MODULES_FAILED: IntGauge = IntGauge::new(
        "bucu_modules_failed",
        "Modules rejected or failed"
    ).expect("metric creation failed");

    // =========================================================================
    // STATE STORE
    // =========================================================================

    pub static ref CACHE_ENTRIES: IntGauge = IntGauge::new(
        "bucu_cache_entries",
        "Entries held by the state store"
    ).expect("metric creation failed");

    pub static ref CACHE_HIT_RATIO: Gauge = Gauge::new(
        "bucu_cache_hit_ratio",
        "State store hits over total reads"
    ).expect("metric creation failed");

    // =========================================================================
    // PERMISSIONS
    // =========================================================================

    pub static ref PERMISSION_OVERRIDES: IntGauge = IntGauge::new(
        "bucu_permission_overrides",
        "Subjects with an explicitly stored role"
    ).expect("metric creation failed");
}

/// Point-in-time service counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub bus_emitted: u64,
    pub bus_blocked: u64,
    pub bus_errors: u64,
    pub bus_listeners: usize,
    pub modules_loaded: usize,
    pub modules_failed: usize,
    pub cache_entries: usize,
    pub cache_hit_ratio: f64,
    pub permission_overrides: usize,
}

/// Register all metrics with the process registry.
///
/// Safe to call more than once; already registered metrics are kept.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Bus
        Box::new(BUS_EVENTS_EMITTED.clone()),
        Box::new(BUS_EVENTS_BLOCKED.clone()),
        Box::new(BUS_LISTENER_ERRORS.clone()),
        Box::new(BUS_LISTENERS.clone()),
        // Modules
        Box::new(MODULES_LOADED.clone()),
        Box::new(MODULES_FAILED.clone()),
        // Store
        Box::new(CACHE_ENTRIES.clone()),
        Box::new(CACHE_HIT_RATIO.clone()),
        // Permissions
        Box::new(PERMISSION_OVERRIDES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Copy a snapshot into the gauges.
pub fn record_snapshot(snapshot: &MetricsSnapshot) {
    BUS_EVENTS_EMITTED.set(clamp(snapshot.bus_emitted));
    BUS_EVENTS_BLOCKED.set(clamp(snapshot.bus_blocked));
    BUS_LISTENER_ERRORS.set(clamp(snapshot.bus_errors));
    BUS_LISTENERS.set(clamp(snapshot.bus_listeners as u64));
    MODULES_LOADED.set(clamp(snapshot.modules_loaded as u64));
    MODULES_FAILED.set(clamp(snapshot.modules_failed as u64));
    CACHE_ENTRIES.set(clamp(snapshot.cache_entries as u64));
    CACHE_HIT_RATIO.set(snapshot.cache_hit_ratio);
    PERMISSION_OVERRIDES.set(clamp(snapshot.permission_overrides as u64));
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
