//! Role hierarchy: role name to level, higher is more privileged.

use serde::{Deserialize, Serialize};
use shared_types::Payload;
use std::collections::BTreeMap;
use tracing::warn;

pub type RoleLevel = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleHierarchy {
    levels: BTreeMap<String, RoleLevel>,
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        [("user", 0), ("moderator", 1), ("admin", 2), ("superadmin", 3)]
            .into_iter()
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, RoleLevel)> for RoleHierarchy {
    fn from_iter<I: IntoIterator<Item = (S, RoleLevel)>>(iter: I) -> Self {
        Self {
            levels: iter.into_iter().map(|(role, level)| (role.into(), level)).collect(),
        }
    }
}

impl RoleHierarchy {
    /// Build from a JSON object of `role: level`.
    ///
    /// Entries whose level is not a non-negative integer are skipped. Returns
    /// `None` if `value` is not an object.
    #[must_use]
    pub fn from_value(value: &Payload) -> Option<Self> {
        let object = value.as_object()?;
        let levels = object
            .iter()
            .filter_map(|(role, level)| {
                match level.as_u64().and_then(|l| RoleLevel::try_from(l).ok()) {
                    Some(level) => Some((role.clone(), level)),
                    None => {
                        warn!(role = %role, "[Permissions] Ignoring role with invalid level {}", level);
                        None
                    }
                }
            })
            .collect();
        Some(Self { levels })
    }

    /// Level of `role`; unknown roles are level 0.
    #[must_use]
    pub fn level(&self, role: &str) -> RoleLevel {
        self.levels.get(role).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.levels.contains_key(role)
    }

    /// Roles ordered by ascending level, ties by name.
    #[must_use]
    pub fn roles_by_level(&self) -> Vec<String> {
        let mut roles: Vec<(&String, &RoleLevel)> = self.levels.iter().collect();
        roles.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        roles.into_iter().map(|(role, _)| role.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
