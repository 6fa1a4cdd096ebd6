//! # Maintenance Task
//!
//! Periodic housekeeping on the tokio runtime: evict expired state store
//! entries and refresh the Prometheus gauges. Runs every
//! `cache.cleanup_interval` seconds until stopped; an interval of 0 disables
//! it.

use crate::container::CoreContainer;
use shared_types::ConfigSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configured sweep interval, or `None` when disabled.
#[must_use]
pub fn maintenance_interval(config: &dyn ConfigSource) -> Option<Duration> {
    match config.get_u64("cache.cleanup_interval", 60) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

/// One sweep. Returns the number of evicted entries.
pub fn run_once(container: &CoreContainer) -> usize {
    let evicted = container.store.clear_expired();
    if evicted > 0 {
        debug!("[Maintenance] Evicted {} expired entries", evicted);
    }
    bucu_telemetry::record_snapshot(&container.metrics_snapshot());
    evicted
}

/// Handle to a running maintenance task.
pub struct MaintenanceHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Signal the task and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("[Maintenance] Task ended abnormally: {}", e);
        }
    }
}

/// Spawn the sweep loop on the current tokio runtime.
pub fn spawn_maintenance(container: Arc<CoreContainer>, interval: Duration) -> MaintenanceHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("[Maintenance] Running every {:?}", interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    run_once(&container);
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        info!("[Maintenance] Stopped");
    });

    MaintenanceHandle { shutdown_tx, task }
}
