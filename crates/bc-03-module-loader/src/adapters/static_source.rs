//! Compiled-in modules, registered as named factories.
//!
//! Each `resolve` calls the factory again, so a reload always gets a freshly
//! built descriptor.

use crate::domain::descriptor::ModuleDescriptor;
use crate::domain::errors::SourceError;
use crate::ports::source::{ModuleCandidate, ModuleSource};
use parking_lot::RwLock;
use std::sync::Arc;

type Factory = Arc<dyn Fn() -> ModuleDescriptor + Send + Sync>;

#[derive(Default)]
pub struct StaticSource {
    factories: RwLock<Vec<(String, Factory)>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory under `name`. A later registration under the same name
    /// replaces the earlier one in place.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> ModuleDescriptor + Send + Sync + 'static,
    {
        let name = name.into();
        let factory: Factory = Arc::new(factory);
        let mut factories = self.factories.write();
        match factories.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = factory,
            None => factories.push((name, factory)),
        }
    }

    #[must_use]
    pub fn with<F>(self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> ModuleDescriptor + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }
}

impl ModuleSource for StaticSource {
    fn label(&self) -> &str {
        "static"
    }

    fn enumerate(&self) -> Vec<ModuleCandidate> {
        self.factories
            .read()
            .iter()
            .map(|(name, _)| ModuleCandidate::new(name.clone(), "static"))
            .collect()
    }

    fn resolve(&self, candidate: &ModuleCandidate) -> Result<ModuleDescriptor, SourceError> {
        let factory = self
            .factories
            .read()
            .iter()
            .find(|(n, _)| *n == candidate.name)
            .map(|(_, f)| Arc::clone(f))
            .ok_or_else(|| SourceError::NotFound(candidate.name.clone()))?;
        Ok(factory())
    }
}
