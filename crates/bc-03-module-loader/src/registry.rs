//! # Module Registry
//!
//! Lifecycle records by module name, shared between the loader and every
//! module facade (`is_module_loaded`). Writers are the loader only.

use crate::domain::descriptor::ModuleDescriptor;
use crate::domain::record::{ModuleRecord, ModuleState};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

/// Loader counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoaderStats {
    /// Descriptors discovered across all passes.
    pub total: usize,
    pub loaded: usize,
    /// Rejected plus failed, including rejections that have no record.
    pub failed: usize,
}

#[derive(Debug, Default)]
struct RegistryInner {
    records: HashMap<String, ModuleRecord>,
    load_order: Vec<String>,
    discovered: usize,
    /// Rejections with no record of their own (unnamed, duplicate name).
    untracked_rejections: usize,
}

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    inner: RwLock<RegistryInner>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // WRITES (loader only)
    // =========================================================================

    pub(crate) fn note_discovered(&self) {
        self.inner.write().discovered += 1;
    }

    pub(crate) fn note_untracked_rejection(&self) {
        self.inner.write().untracked_rejections += 1;
    }

    /// Insert a `Discovered` record. Returns false if the name is taken.
    pub(crate) fn insert_discovered(&self, descriptor: ModuleDescriptor) -> bool {
        let mut inner = self.inner.write();
        if inner.records.contains_key(&descriptor.name) {
            return false;
        }
        inner
            .records
            .insert(descriptor.name.clone(), ModuleRecord::discovered(descriptor));
        true
    }

    /// Move `name` to `state`. Returns false, changing nothing, if the name
    /// has no record.
    pub(crate) fn set_state(&self, name: &str, state: ModuleState, reason: Option<String>) -> bool {
        let mut inner = self.inner.write();
        let Some(record) = inner.records.get_mut(name) else {
            warn!("[Registry] No record for '{}', state {:?} not applied", name, state);
            return false;
        };
        record.state = state;
        record.reason = reason;
        if state == ModuleState::Loaded && !inner.load_order.iter().any(|n| n == name) {
            inner.load_order.push(name.to_string());
        }
        true
    }

    /// Swap in a reloaded descriptor for a loaded module.
    pub(crate) fn replace_loaded(&self, descriptor: ModuleDescriptor) {
        let mut inner = self.inner.write();
        if let Some(record) = inner.records.get_mut(&descriptor.name) {
            record.descriptor = descriptor;
            record.state = ModuleState::Loaded;
            record.reason = None;
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().records.contains_key(name)
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.inner.read().records.get(name).map(|r| r.state)
    }

    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.state(name) == Some(ModuleState::Loaded)
    }

    #[must_use]
    pub fn record(&self, name: &str) -> Option<ModuleRecord> {
        self.inner.read().records.get(name).cloned()
    }

    /// Descriptor of a loaded module.
    #[must_use]
    pub fn loaded_descriptor(&self, name: &str) -> Option<ModuleDescriptor> {
        self.inner
            .read()
            .records
            .get(name)
            .filter(|r| r.state == ModuleState::Loaded)
            .map(|r| r.descriptor.clone())
    }

    /// Loaded module names in the order they finished loading.
    #[must_use]
    pub fn loaded_names(&self) -> Vec<String> {
        let inner = self.inner.read();
        inner
            .load_order
            .iter()
            .filter(|n| {
                inner
                    .records
                    .get(n.as_str())
                    .is_some_and(|r| r.state == ModuleState::Loaded)
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn loaded_set(&self) -> HashSet<String> {
        self.inner
            .read()
            .records
            .values()
            .filter(|r| r.state == ModuleState::Loaded)
            .map(|r| r.descriptor.name.clone())
            .collect()
    }

    /// Rejected and failed modules with their reasons.
    #[must_use]
    pub fn failed(&self) -> BTreeMap<String, String> {
        self.inner
            .read()
            .records
            .values()
            .filter(|r| r.state.is_failure())
            .map(|r| {
                (
                    r.descriptor.name.clone(),
                    r.reason.clone().unwrap_or_default(),
                )
            })
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> LoaderStats {
        let inner = self.inner.read();
        let loaded = inner
            .records
            .values()
            .filter(|r| r.state == ModuleState::Loaded)
            .count();
        let failed = inner
            .records
            .values()
            .filter(|r| r.state.is_failure())
            .count();
        LoaderStats {
            total: inner.discovered,
            loaded,
            failed: failed + inner.untracked_rejections,
        }
    }
}
