use super::descriptor::ModuleDescriptor;
use serde::Serialize;

/// Lifecycle state of a discovered module.
///
/// ```text
/// Discovered ──validate──→ Validated ──resolve + init──→ Loaded
///     │                        │
///     └──→ Rejected            └──→ Failed
/// ```
///
/// `Loaded` and `Failed` are terminal except through an explicit reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Discovered,
    Validated,
    Rejected,
    Loaded,
    Failed,
}

impl ModuleState {
    /// Rejected and failed modules both count as failures.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Rejected | Self::Failed)
    }
}

/// What the loader knows about one module name.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub descriptor: ModuleDescriptor,
    pub state: ModuleState,
    /// Human-readable reason for `Rejected` or `Failed`.
    pub reason: Option<String>,
}

impl ModuleRecord {
    pub fn discovered(descriptor: ModuleDescriptor) -> Self {
        Self {
            descriptor,
            state: ModuleState::Discovered,
            reason: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}
