//! # Bucu Core Runtime
//!
//! Wires the core services together and runs them.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `BUCU_CONFIG` file, `BUCU__*` overrides)
//! 2. Build the services ([`CoreContainer`])
//! 3. Register module sources (built-ins, then the module directory)
//! 4. Load modules in dependency order
//! 5. Start the maintenance task
//!
//! ## Modules
//!
//! - `container/` - configuration and service construction
//! - `builtin/` - modules compiled into the binary
//! - `maintenance` - periodic cache eviction and metric refresh

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod builtin;
pub mod container;
pub mod maintenance;

pub use container::{CoreContainer, CoreStatus};

use bc_03_module_loader::LoadSummary;
use maintenance::MaintenanceHandle;
use shared_types::ConfigTree;
use std::sync::Arc;
use tracing::info;

/// A started core: services plus the background maintenance task.
pub struct CoreRuntime {
    container: Arc<CoreContainer>,
    maintenance: Option<MaintenanceHandle>,
}

impl CoreRuntime {
    pub fn new(config: ConfigTree) -> Self {
        Self::from_container(CoreContainer::with_system_clock(Arc::new(config)))
    }

    pub fn from_container(container: CoreContainer) -> Self {
        Self {
            container: Arc::new(container),
            maintenance: None,
        }
    }

    #[must_use]
    pub fn container(&self) -> &Arc<CoreContainer> {
        &self.container
    }

    /// Register sources, load modules and start maintenance.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> LoadSummary {
        info!("[Core] Starting Bucu Core v{}", env!("CARGO_PKG_VERSION"));

        self.container.register_default_sources();
        let summary = self.container.loader.load_modules();

        if let Some(interval) = maintenance::maintenance_interval(&*self.container.config) {
            self.maintenance = Some(maintenance::spawn_maintenance(
                Arc::clone(&self.container),
                interval,
            ));
        }
        maintenance::run_once(&self.container);

        info!(
            "[Core] Ready: {} module(s) loaded, {} failed",
            summary.loaded, summary.failed
        );
        summary
    }

    /// Stop background work. Module listeners stay registered.
    pub async fn shutdown(mut self) {
        info!("[Core] Shutting down");
        if let Some(handle) = self.maintenance.take() {
            handle.stop().await;
        }
    }
}
