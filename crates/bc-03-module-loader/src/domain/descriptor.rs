//! # Module Descriptor
//!
//! What a source hands the loader: identity, dependencies, entry point and
//! optional attached config.
//!
//! ```rust,ignore
//! let descriptor = ModuleDescriptor::new("bucu-admin", "1.0.0")
//!     .depends_on("bucu-sessions")
//!     .with_entry(FnModule::new(|core| {
//!         core.log().info("admin ready");
//!         Ok(())
//!     }));
//! ```

use super::errors::ModuleError;
use crate::context::CoreHandle;
use shared_types::Payload;
use std::fmt;
use std::sync::Arc;

/// A module's entry point.
pub trait Module: Send + Sync {
    /// Called once per load (and once more per reload) with the core facade.
    fn init(&self, core: &CoreHandle) -> Result<(), ModuleError>;
}

/// [`Module`] backed by a closure.
pub struct FnModule<F> {
    init: F,
}

impl<F> FnModule<F>
where
    F: Fn(&CoreHandle) -> Result<(), ModuleError> + Send + Sync + 'static,
{
    pub fn new(init: F) -> Self {
        Self { init }
    }
}

impl<F> Module for FnModule<F>
where
    F: Fn(&CoreHandle) -> Result<(), ModuleError> + Send + Sync + 'static,
{
    fn init(&self, core: &CoreHandle) -> Result<(), ModuleError> {
        (self.init)(core)
    }
}

/// Shared handle to an entry point.
pub type DynModule = Arc<dyn Module>;

#[derive(Clone, Default)]
pub struct ModuleDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    /// Names of modules that must be loaded first, in listed order.
    pub dependencies: Vec<String>,
    pub entry: Option<DynModule>,
    /// Module-specific config, visible through the facade.
    pub config: Option<Payload>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_entry(mut self, entry: impl Module + 'static) -> Self {
        self.entry = Some(Arc::new(entry));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: Payload) -> Self {
        self.config = Some(config);
        self
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("dependencies", &self.dependencies)
            .field("entry", &self.entry.is_some())
            .field("config", &self.config)
            .finish()
    }
}
