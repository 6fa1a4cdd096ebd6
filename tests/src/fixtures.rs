//! Shared setup for integration tests.

use bc_01_state_store::StateStore;
use bc_02_permissions::PermissionAuthority;
use bc_03_module_loader::{CoreServices, ModuleLoader};
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{EventBus, Listener};
use shared_types::{ConfigSource, ConfigTree, ManualTimeSource, Payload};
use std::sync::Arc;

/// All four services on a manual clock.
pub struct TestCore {
    pub config: Arc<ConfigTree>,
    pub clock: Arc<ManualTimeSource>,
    pub bus: Arc<EventBus>,
    pub store: Arc<StateStore>,
    pub permissions: Arc<PermissionAuthority>,
    pub loader: ModuleLoader,
}

impl TestCore {
    pub fn new() -> Self {
        Self::with_config(serde_json::json!({}))
    }

    pub fn with_config(config: Value) -> Self {
        let config = Arc::new(ConfigTree::from_value(config).expect("config must be an object"));
        let source: Arc<dyn ConfigSource> = config.clone();
        let clock = Arc::new(ManualTimeSource::new(1_000_000));
        let bus = Arc::new(EventBus::new(source.clone(), clock.clone()));
        let store = Arc::new(StateStore::new(clock.clone()));
        let permissions = Arc::new(PermissionAuthority::new(bus.clone(), source.clone()));
        let loader = ModuleLoader::new(CoreServices {
            bus: bus.clone(),
            store: store.clone(),
            permissions: permissions.clone(),
            config: source,
        });
        Self {
            config,
            clock,
            bus,
            store,
            permissions,
            loader,
        }
    }

    /// Collect every payload published on `event`.
    pub fn record(&self, event: &str) -> Arc<Mutex<Vec<Payload>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        self.bus
            .register(
                event,
                Listener::infallible(move |payload| sink.lock().push(payload.clone())),
            )
            .expect("event name is valid");
        seen
    }
}

impl Default for TestCore {
    fn default() -> Self {
        Self::new()
    }
}
