//! # Dependency Resolution
//!
//! Depth-first topological sort with three-colour cycle detection.
//!
//! - Modules are visited in discovery order, dependencies in listed order.
//! - Output is post-order, so every module comes after its dependencies.
//! - Every module on a cycle fails as circular. Modules that depend on a
//!   failed module fail too, with that dependency as the reason.
//! - A dependency that is neither in the batch nor already loaded fails the
//!   dependent as missing.
//! - Failures never abort the sort; unrelated branches still resolve.

use super::descriptor::ModuleDescriptor;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::error;

/// Why a module was excluded from the load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// The module is on a dependency cycle. `cycle` starts and ends with the
    /// same name.
    Circular { cycle: Vec<String> },
    MissingDependency { dependency: String },
    DependencyFailed { dependency: String },
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circular { cycle } => {
                write!(f, "Circular dependency: {}", cycle.join(" -> "))
            }
            Self::MissingDependency { dependency } => {
                write!(f, "Missing dependency: {dependency}")
            }
            Self::DependencyFailed { dependency } => {
                write!(f, "Dependency failed: {dependency}")
            }
        }
    }
}

/// Result of [`resolve_order`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Module names in initialization order.
    pub order: Vec<String>,
    /// Excluded modules in discovery order.
    pub failed: Vec<(String, ResolveFailure)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

struct Resolver<'a> {
    lookup: HashMap<&'a str, &'a ModuleDescriptor>,
    preloaded: &'a HashSet<String>,
    marks: HashMap<&'a str, Mark>,
    stack: Vec<&'a str>,
    failed: HashMap<&'a str, ResolveFailure>,
    order: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    fn visit(&mut self, name: &'a str) -> bool {
        if self.failed.contains_key(name) {
            return false;
        }

        match self.marks.get(name) {
            Some(Mark::Done) => return true,
            Some(Mark::Visiting) => {
                let start = self.stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> =
                    self.stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());

                error!("[Loader] Circular dependency detected: {}", cycle.join(" -> "));
                for member in &self.stack[start..] {
                    self.failed
                        .entry(*member)
                        .or_insert_with(|| ResolveFailure::Circular {
                            cycle: cycle.clone(),
                        });
                }
                return false;
            }
            None => {}
        }

        let Some(module) = self.lookup.get(name).copied() else {
            return false;
        };

        self.marks.insert(name, Mark::Visiting);
        self.stack.push(name);

        let mut resolved = true;
        for dependency in &module.dependencies {
            let dependency = dependency.as_str();

            if !self.lookup.contains_key(dependency) {
                if self.preloaded.contains(dependency) {
                    continue;
                }
                error!(
                    "[Loader] Module '{}' requires missing dependency '{}'",
                    name, dependency
                );
                self.failed
                    .entry(name)
                    .or_insert_with(|| ResolveFailure::MissingDependency {
                        dependency: dependency.to_string(),
                    });
                resolved = false;
                break;
            }

            if !self.visit(dependency) {
                self.failed
                    .entry(name)
                    .or_insert_with(|| ResolveFailure::DependencyFailed {
                        dependency: dependency.to_string(),
                    });
                resolved = false;
                break;
            }
        }

        self.stack.pop();
        self.marks.insert(name, Mark::Done);
        if resolved {
            self.order.push(name);
        }
        resolved
    }
}

/// Compute the initialization order for `modules`.
///
/// Names in `preloaded` satisfy dependencies without being part of the
/// batch. If two descriptors share a name, the first one is used.
pub fn resolve_order(modules: &[ModuleDescriptor], preloaded: &HashSet<String>) -> Resolution {
    let mut lookup = HashMap::with_capacity(modules.len());
    for module in modules {
        lookup.entry(module.name.as_str()).or_insert(module);
    }

    let mut resolver = Resolver {
        lookup,
        preloaded,
        marks: HashMap::new(),
        stack: Vec::new(),
        failed: HashMap::new(),
        order: Vec::with_capacity(modules.len()),
    };

    for module in modules {
        let name = module.name.as_str();
        if !resolver.marks.contains_key(name) && !resolver.failed.contains_key(name) {
            resolver.visit(name);
        }
    }

    let mut seen = HashSet::new();
    let failed = modules
        .iter()
        .filter(|m| seen.insert(m.name.as_str()))
        .filter_map(|m| {
            resolver
                .failed
                .get(m.name.as_str())
                .map(|f| (m.name.clone(), f.clone()))
        })
        .collect();

    Resolution {
        order: resolver.order.into_iter().map(str::to_string).collect(),
        failed,
    }
}
