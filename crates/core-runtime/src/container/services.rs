//! Service construction and status reporting.

use crate::builtin;
use bc_01_state_store::{StateStore, StoreStats};
use bc_02_permissions::{PermissionAuthority, PermissionStats};
use bc_03_module_loader::{CoreServices, DirectorySource, LoaderStats, ModuleLoader};
use bucu_telemetry::MetricsSnapshot;
use serde::Serialize;
use shared_bus::{BusStats, EventBus};
use shared_types::{ConfigSource, ConfigTree, SystemTimeSource, TimeSource};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything the core runs on.
pub struct CoreContainer {
    pub config: Arc<ConfigTree>,
    pub clock: Arc<dyn TimeSource>,
    pub bus: Arc<EventBus>,
    pub store: Arc<StateStore>,
    pub permissions: Arc<PermissionAuthority>,
    pub loader: ModuleLoader,
}

/// Point-in-time view of all services.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreStatus {
    pub modules: LoaderStats,
    pub loaded_modules: Vec<String>,
    pub failed_modules: BTreeMap<String, String>,
    pub bus: BusStats,
    pub cache: StoreStats,
    pub permissions: PermissionStats,
}

impl CoreContainer {
    pub fn new(config: Arc<ConfigTree>, clock: Arc<dyn TimeSource>) -> Self {
        let source: Arc<dyn ConfigSource> = config.clone();

        let bus = Arc::new(EventBus::new(source.clone(), clock.clone()));
        let store = Arc::new(StateStore::new(clock.clone()));
        let permissions = Arc::new(PermissionAuthority::new(bus.clone(), source.clone()));
        let loader = ModuleLoader::new(CoreServices {
            bus: bus.clone(),
            store: store.clone(),
            permissions: permissions.clone(),
            config: source,
        });

        info!("[Core] Services initialized");
        Self {
            config,
            clock,
            bus,
            store,
            permissions,
            loader,
        }
    }

    /// Container on the wall clock.
    pub fn with_system_clock(config: Arc<ConfigTree>) -> Self {
        Self::new(config, Arc::new(SystemTimeSource))
    }

    #[must_use]
    pub fn module_directory(&self) -> PathBuf {
        PathBuf::from(self.config.get_string("modules.directory", "modules"))
    }

    /// Built-in modules first, then the module directory.
    pub fn register_default_sources(&self) {
        self.loader.add_source(Arc::new(builtin::builtin_source()));

        let directory = self.module_directory();
        info!("[Core] Module directory: {}", directory.display());
        self.loader
            .add_source(Arc::new(builtin::with_builtin_entries(DirectorySource::new(
                directory,
            ))));
    }

    #[must_use]
    pub fn status(&self) -> CoreStatus {
        CoreStatus {
            modules: self.loader.stats(),
            loaded_modules: self.loader.loaded_modules(),
            failed_modules: self.loader.failed_modules(),
            bus: self.bus.stats(),
            cache: self.store.stats(),
            permissions: self.permissions.stats(),
        }
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let bus = self.bus.stats();
        let cache = self.store.stats();
        let modules = self.loader.stats();
        MetricsSnapshot {
            bus_emitted: bus.emitted,
            bus_blocked: bus.blocked,
            bus_errors: bus.errors,
            bus_listeners: bus.listeners,
            modules_loaded: modules.loaded,
            modules_failed: modules.failed,
            cache_entries: cache.size,
            cache_hit_ratio: cache.hit_rate,
            permission_overrides: self.permissions.stats().total,
        }
    }
}
