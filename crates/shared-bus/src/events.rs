//! # Core Lifecycle Events
//!
//! Events the core itself publishes on the bus. Collaborators such as a
//! cross-runtime bridge subscribe to these by name.

use serde::Serialize;
use shared_types::{Payload, SubjectId};

/// Event name published after a module initialized successfully.
pub const MODULE_LOADED: &str = "module:loaded";

/// Event name published after a module failed to initialize.
pub const MODULE_FAILED: &str = "module:failed";

/// Event name published after a module was hot-reloaded.
pub const MODULE_RELOADED: &str = "module:reloaded";

/// Event name published after a subject's role was set.
pub const PERMISSION_CHANGED: &str = "permission:changed";

/// All events originated by the core services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CoreEvent {
    // =========================================================================
    // MODULE LOADER
    // =========================================================================
    /// A module's init succeeded and it is now loaded.
    ModuleLoaded { name: String, version: String },

    /// A module's init failed; `error` is the failure message.
    ModuleFailed { name: String, error: String },

    /// A loaded module was re-initialized from a fresh descriptor.
    ModuleReloaded { name: String, version: String },

    // =========================================================================
    // PERMISSION AUTHORITY
    // =========================================================================
    /// A subject's stored role changed. `old_role` is absent if the subject
    /// had no stored role before.
    PermissionChanged {
        #[serde(rename = "subjectId")]
        subject_id: SubjectId,
        #[serde(rename = "oldRole")]
        old_role: Option<String>,
        #[serde(rename = "newRole")]
        new_role: String,
    },
}

impl CoreEvent {
    /// Bus event name for this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModuleLoaded { .. } => MODULE_LOADED,
            Self::ModuleFailed { .. } => MODULE_FAILED,
            Self::ModuleReloaded { .. } => MODULE_RELOADED,
            Self::PermissionChanged { .. } => PERMISSION_CHANGED,
        }
    }

    /// JSON payload delivered to listeners.
    #[must_use]
    pub fn payload(&self) -> Payload {
        serde_json::to_value(self).unwrap_or(Payload::Null)
    }
}
