//! # Permission Authority
//!
//! The role table and hierarchy sit behind one `RwLock`. Change events are
//! published after the lock is released, so a listener may query or modify
//! permissions from inside its callback.

use super::errors::PermissionError;
use super::hierarchy::{RoleHierarchy, RoleLevel};
use super::stats::PermissionStats;
use parking_lot::RwLock;
use shared_bus::{CoreEvent, EventPublisher};
use shared_types::{ConfigSource, SubjectId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Role used when `player.default_permission` is not configured.
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Default)]
struct Inner {
    /// Explicit role overrides, ordered by subject id.
    roles: BTreeMap<SubjectId, String>,
    hierarchy: RoleHierarchy,
}

pub struct PermissionAuthority {
    inner: RwLock<Inner>,
    publisher: Arc<dyn EventPublisher>,
    config: Arc<dyn ConfigSource>,
}

impl PermissionAuthority {
    /// Create an authority. The hierarchy comes from `permissions.hierarchy`
    /// when configured, otherwise the built-in default.
    pub fn new(publisher: Arc<dyn EventPublisher>, config: Arc<dyn ConfigSource>) -> Self {
        let hierarchy = config
            .lookup("permissions.hierarchy")
            .and_then(|value| RoleHierarchy::from_value(&value))
            .filter(|h| !h.is_empty())
            .unwrap_or_default();

        debug!(
            "[Permissions] Initialized with {} roles",
            hierarchy.len()
        );

        Self {
            inner: RwLock::new(Inner {
                roles: BTreeMap::new(),
                hierarchy,
            }),
            publisher,
            config,
        }
    }

    fn default_role(&self) -> String {
        let role = self
            .config
            .get_string("player.default_permission", DEFAULT_ROLE);
        if role.is_empty() {
            DEFAULT_ROLE.to_string()
        } else {
            role
        }
    }

    // =========================================================================
    // ROLE TABLE
    // =========================================================================

    /// Assign `role` to `subject`, replacing any previous role.
    pub fn set_permission(&self, subject: SubjectId, role: &str) -> Result<(), PermissionError> {
        if role.is_empty() {
            error!(subject_id = subject, "[Permissions] Role must be a non-empty string");
            return Err(PermissionError::EmptyRole);
        }

        let old_role = self.inner.write().roles.insert(subject, role.to_string());

        info!(
            subject_id = subject,
            "[Permissions] Permission set for subject {}: {} -> {}",
            subject,
            old_role.as_deref().unwrap_or("none"),
            role
        );

        let event = CoreEvent::PermissionChanged {
            subject_id: subject,
            old_role,
            new_role: role.to_string(),
        };
        if let Err(e) = self.publisher.publish_event(&event) {
            warn!("[Permissions] Failed to publish permission change: {}", e);
        }
        Ok(())
    }

    /// Stored role, or the configured default. Never absent.
    #[must_use]
    pub fn get_permission(&self, subject: SubjectId) -> String {
        let stored = self.inner.read().roles.get(&subject).cloned();
        stored.unwrap_or_else(|| self.default_role())
    }

    /// True if the subject's effective role is at least as high as `required`.
    #[must_use]
    pub fn has_permission(&self, subject: SubjectId, required: &str) -> bool {
        let role = self.get_permission(subject);
        let inner = self.inner.read();
        inner.hierarchy.level(&role) >= inner.hierarchy.level(required)
    }

    /// True if the subject's effective role is exactly `role`.
    #[must_use]
    pub fn has_role(&self, subject: SubjectId, role: &str) -> bool {
        self.get_permission(subject) == role
    }

    /// Drop the subject's override. Returns false if none was stored.
    pub fn clear_permission(&self, subject: SubjectId) -> bool {
        match self.inner.write().roles.remove(&subject) {
            Some(old) => {
                debug!(
                    subject_id = subject,
                    "[Permissions] Permission cleared for subject {} (was: {})", subject, old
                );
                true
            }
            None => false,
        }
    }

    /// Subjects whose stored role is exactly `role`, ascending.
    #[must_use]
    pub fn players_with_role(&self, role: &str) -> Vec<SubjectId> {
        self.inner
            .read()
            .roles
            .iter()
            .filter(|(_, r)| r.as_str() == role)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Subjects whose stored role is at least `role`'s level, ascending.
    ///
    /// Only stored overrides are scanned.
    #[must_use]
    pub fn players_with_min_level(&self, role: &str) -> Vec<SubjectId> {
        let inner = self.inner.read();
        let required = inner.hierarchy.level(role);
        inner
            .roles
            .iter()
            .filter(|(_, r)| inner.hierarchy.level(r) >= required)
            .map(|(id, _)| *id)
            .collect()
    }

    // =========================================================================
    // HIERARCHY
    // =========================================================================

    /// Replace the whole hierarchy.
    pub fn set_role_hierarchy(&self, hierarchy: RoleHierarchy) -> Result<(), PermissionError> {
        if hierarchy.is_empty() {
            error!("[Permissions] Role hierarchy must define at least one role");
            return Err(PermissionError::EmptyHierarchy);
        }
        self.inner.write().hierarchy = hierarchy;
        info!("[Permissions] Role hierarchy updated");
        Ok(())
    }

    #[must_use]
    pub fn role_hierarchy(&self) -> RoleHierarchy {
        self.inner.read().hierarchy.clone()
    }

    #[must_use]
    pub fn role_level(&self, role: &str) -> RoleLevel {
        self.inner.read().hierarchy.level(role)
    }

    #[must_use]
    pub fn role_exists(&self, role: &str) -> bool {
        self.inner.read().hierarchy.contains(role)
    }

    /// Defined roles by ascending level.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        self.inner.read().hierarchy.roles_by_level()
    }

    #[must_use]
    pub fn stats(&self) -> PermissionStats {
        let inner = self.inner.read();
        let mut by_role = BTreeMap::new();
        for role in inner.roles.values() {
            *by_role.entry(role.clone()).or_insert(0) += 1;
        }
        PermissionStats {
            total: inner.roles.len(),
            by_role,
        }
    }
}
