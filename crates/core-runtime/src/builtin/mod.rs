//! # Built-in Modules
//!
//! Modules compiled into the runtime binary and offered through a
//! [`StaticSource`]. Directory manifests may point their `entry` at the same
//! names to reuse them with their own `config.json`.
//!
//! | Module | Depends on | Purpose |
//! |--------|------------|---------|
//! | `bucu-sessions` | - | player sessions in the state store |
//! | `bucu-admin` | `bucu-sessions` | role-gated admin commands |

pub mod admin;
pub mod sessions;

use bc_03_module_loader::{CoreHandle, DirectorySource, DynModule, StaticSource};
use parking_lot::Mutex;
use shared_bus::{BusError, Listener};
use std::collections::HashMap;
use std::sync::Arc;

/// Listeners registered through one entry point, per module name.
///
/// A reload calls `init` on a fresh entry point; sharing this slot between
/// the instances lets the new `init` unregister what the old one left behind.
/// Several manifests may share one entry point, so listeners are tracked
/// under the name of the module that registered them.
#[derive(Default)]
pub struct Subscriptions {
    active: Mutex<HashMap<String, Vec<(String, Listener)>>>,
}

impl Subscriptions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Unregister what `core`'s module registered before, then register
    /// `listeners` for it.
    pub fn replace(
        &self,
        core: &CoreHandle,
        listeners: Vec<(&str, Listener)>,
    ) -> Result<(), BusError> {
        let mut active = self.active.lock();
        let slot = active.entry(core.module_name().to_string()).or_default();
        for (event, listener) in slot.drain(..) {
            core.off(&event, &listener);
        }
        for (event, listener) in listeners {
            core.on(event, listener.clone())?;
            slot.push((event.to_string(), listener));
        }
        Ok(())
    }

    /// Listeners currently held for `module`.
    #[must_use]
    pub fn count_for(&self, module: &str) -> usize {
        self.active.lock().get(module).map_or(0, Vec::len)
    }

    /// Listeners held across all modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.lock().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Static source with every built-in module.
#[must_use]
pub fn builtin_source() -> StaticSource {
    let sessions_slot = Subscriptions::new();
    let admin_slot = Subscriptions::new();
    StaticSource::new()
        .with(sessions::NAME, move || {
            sessions::descriptor(Arc::clone(&sessions_slot))
        })
        .with(admin::NAME, move || admin::descriptor(Arc::clone(&admin_slot)))
}

/// Make the built-in entry points available to directory manifests.
#[must_use]
pub fn with_builtin_entries(source: DirectorySource) -> DirectorySource {
    let sessions_entry: DynModule =
        Arc::new(sessions::SessionsModule::new(Subscriptions::new()));
    let admin_entry: DynModule = Arc::new(admin::AdminModule::new(Subscriptions::new()));
    source
        .with_entry(sessions::NAME, sessions_entry)
        .with_entry(admin::NAME, admin_entry)
}
