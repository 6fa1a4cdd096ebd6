//! # Core Facade
//!
//! [`CoreServices`] bundles the shared services. Each module receives its own
//! [`CoreHandle`] during `init`: the same services, narrowed to what modules
//! are meant to use, plus the module's identity, its attached config and a
//! logger that tags every record with the module name.
//!
//! A handle is cheap to clone. Modules may keep one for use from their
//! listeners after `init` returns.

use crate::registry::ModuleRegistry;
use bc_01_state_store::{StateStore, StoreError};
use bc_02_permissions::PermissionAuthority;
use shared_bus::{BusError, DispatchReport, EventBus, Listener};
use shared_types::{ConfigSource, Payload, SubjectId};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shared services handed to the loader.
#[derive(Clone)]
pub struct CoreServices {
    pub bus: Arc<EventBus>,
    pub store: Arc<StateStore>,
    pub permissions: Arc<PermissionAuthority>,
    pub config: Arc<dyn ConfigSource>,
}

/// Logger bound to one module.
#[derive(Debug, Clone)]
pub struct ModuleLog {
    module: String,
}

impl ModuleLog {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }

    pub fn debug(&self, message: impl Display) {
        debug!(module = %self.module, "{}", message);
    }

    pub fn info(&self, message: impl Display) {
        info!(module = %self.module, "{}", message);
    }

    pub fn warn(&self, message: impl Display) {
        warn!(module = %self.module, "{}", message);
    }

    pub fn error(&self, message: impl Display) {
        error!(module = %self.module, "{}", message);
    }
}

/// What a module sees of the core.
#[derive(Clone)]
pub struct CoreHandle {
    services: CoreServices,
    registry: Arc<ModuleRegistry>,
    module: String,
    module_config: Option<Payload>,
    log: ModuleLog,
}

impl CoreHandle {
    pub fn new(
        services: CoreServices,
        registry: Arc<ModuleRegistry>,
        module: impl Into<String>,
        module_config: Option<Payload>,
    ) -> Self {
        let module = module.into();
        Self {
            services,
            registry,
            log: ModuleLog::new(module.clone()),
            module,
            module_config,
        }
    }

    // Bus

    pub fn on(&self, event: &str, listener: Listener) -> Result<(), BusError> {
        self.services.bus.register(event, listener)
    }

    pub fn emit(&self, event: &str, payload: Payload) -> Result<DispatchReport, BusError> {
        self.services.bus.emit(event, &payload)
    }

    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        self.services.bus.unregister(event, listener)
    }

    // Permissions

    #[must_use]
    pub fn get_permission(&self, subject: SubjectId) -> String {
        self.services.permissions.get_permission(subject)
    }

    #[must_use]
    pub fn has_permission(&self, subject: SubjectId, required: &str) -> bool {
        self.services.permissions.has_permission(subject, required)
    }

    // State

    pub fn state_get(&self, key: &str) -> Option<Payload> {
        self.services.store.get(key)
    }

    pub fn state_set(
        &self,
        key: &str,
        value: Payload,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.services.store.set(key, value, ttl)
    }

    pub fn state_delete(&self, key: &str) -> bool {
        self.services.store.delete(key)
    }

    // Module identity and config

    #[must_use]
    pub fn log(&self) -> &ModuleLog {
        &self.log
    }

    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Config attached to this module by its source.
    #[must_use]
    pub fn module_config(&self) -> Option<&Payload> {
        self.module_config.as_ref()
    }

    #[must_use]
    pub fn is_module_loaded(&self, name: &str) -> bool {
        self.registry.is_loaded(name)
    }

    /// Read-only lookup into the core configuration.
    #[must_use]
    pub fn config(&self, path: &str) -> Option<Payload> {
        self.services.config.lookup(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::{ConfigTree, ManualTimeSource};

    fn services() -> CoreServices {
        let config: Arc<dyn ConfigSource> = Arc::new(
            ConfigTree::from_value(json!({ "server": { "name": "test" } })).unwrap(),
        );
        let clock = Arc::new(ManualTimeSource::new(0));
        let bus = Arc::new(EventBus::new(config.clone(), clock.clone()));
        CoreServices {
            store: Arc::new(StateStore::new(clock)),
            permissions: Arc::new(PermissionAuthority::new(bus.clone(), config.clone())),
            bus,
            config,
        }
    }

    #[test]
    fn test_facade_reaches_services() {
        let services = services();
        let handle = CoreHandle::new(
            services.clone(),
            Arc::new(ModuleRegistry::new()),
            "m",
            Some(json!({ "greeting": "hi" })),
        );

        handle.state_set("k", json!(1), None).unwrap();
        assert_eq!(services.store.get("k"), Some(json!(1)));
        assert!(handle.state_delete("k"));
        assert_eq!(handle.state_get("k"), None);

        services.permissions.set_permission(3, "admin").unwrap();
        assert_eq!(handle.get_permission(3), "admin");
        assert!(handle.has_permission(3, "moderator"));

        assert_eq!(handle.module_name(), "m");
        assert_eq!(handle.module_config().unwrap()["greeting"], json!("hi"));
        assert_eq!(handle.config("server.name"), Some(json!("test")));
        assert!(!handle.is_module_loaded("m"));
    }

    #[test]
    fn test_facade_bus_roundtrip() {
        let services = services();
        let handle = CoreHandle::new(services.clone(), Arc::new(ModuleRegistry::new()), "m", None);

        let listener = Listener::infallible(|_| {});
        handle.on("custom", listener.clone()).unwrap();
        assert_eq!(services.bus.listener_count("custom"), 1);

        let report = handle.emit("custom", Payload::Null).unwrap();
        assert_eq!(report.delivered, 1);

        assert!(handle.off("custom", &listener));
        assert_eq!(services.bus.listener_count("custom"), 0);
    }
}
