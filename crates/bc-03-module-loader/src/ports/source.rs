//! # Module Source Port
//!
//! A source enumerates candidates cheaply and resolves them into descriptors
//! on demand. Sources may cache resolved descriptors; `invalidate` drops the
//! cached copy so the next `resolve` starts fresh, which is what hot reload
//! relies on.

use crate::domain::descriptor::ModuleDescriptor;
use crate::domain::errors::SourceError;

/// A module a source says it can provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCandidate {
    /// Name the source knows the module by (directory name, factory key).
    pub name: String,
    /// Where it comes from, for logs.
    pub origin: String,
}

impl ModuleCandidate {
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
        }
    }
}

pub trait ModuleSource: Send + Sync {
    /// Short label for logs.
    fn label(&self) -> &str;

    /// Candidates in a stable order. An empty or missing source yields none.
    fn enumerate(&self) -> Vec<ModuleCandidate>;

    fn resolve(&self, candidate: &ModuleCandidate) -> Result<ModuleDescriptor, SourceError>;

    /// Forget any cached copy of `name`.
    fn invalidate(&self, _name: &str) {}
}
