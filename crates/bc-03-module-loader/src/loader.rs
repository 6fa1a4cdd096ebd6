//! # Module Loader
//!
//! Drives every module through its lifecycle:
//!
//! ```text
//! discover ──→ validate ──→ resolve_order ──→ initialize
//!  (sources)   (contract)   (topological)     (init, in order)
//! ```
//!
//! ## Failure Isolation
//!
//! | Stage | Failure | Effect |
//! |-------|---------|--------|
//! | discover | candidate does not resolve | skipped (debug log) |
//! | discover | duplicate name | first wins, later ones counted as rejected |
//! | validate | contract violation or disabled | `Rejected` with reason |
//! | resolve | cycle, missing or failed dependency | `Failed` with reason |
//! | initialize | dependency not loaded | `Failed`, init not called |
//! | initialize | init error or panic | `Failed`, `module:failed` published |
//!
//! No failure stops the remaining modules. Module init runs with no loader
//! lock held, so an init may query the loader or re-enter any service.

use crate::context::{CoreHandle, CoreServices};
use crate::domain::descriptor::ModuleDescriptor;
use crate::domain::errors::{LoaderError, ValidationError};
use crate::domain::record::{ModuleRecord, ModuleState};
use crate::domain::resolver::{resolve_order, Resolution};
use crate::domain::validation::validate_contract;
use crate::ports::source::{ModuleCandidate, ModuleSource};
use crate::registry::{LoaderStats, ModuleRegistry};
use parking_lot::RwLock;
use shared_bus::listener::panic_message;
use shared_bus::{CoreEvent, EventPublisher};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A resolved descriptor and where it came from.
#[derive(Clone)]
pub struct DiscoveredModule {
    pub descriptor: ModuleDescriptor,
    pub candidate: ModuleCandidate,
}

/// Output of [`ModuleLoader::discover`].
#[derive(Clone, Default)]
pub struct Discovery {
    /// Unique names in discovery order.
    pub modules: Vec<DiscoveredModule>,
    /// Names dropped because an earlier candidate already used them.
    pub duplicates: Vec<String>,
}

/// Counts for one `load_modules` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub discovered: usize,
    pub loaded: usize,
    pub failed: usize,
}

pub struct ModuleLoader {
    services: CoreServices,
    registry: Arc<ModuleRegistry>,
    sources: RwLock<Vec<Arc<dyn ModuleSource>>>,
    /// Source and candidate per module name, for reload.
    origins: RwLock<HashMap<String, (Arc<dyn ModuleSource>, ModuleCandidate)>>,
}

impl ModuleLoader {
    pub fn new(services: CoreServices) -> Self {
        Self {
            services,
            registry: Arc::new(ModuleRegistry::new()),
            sources: RwLock::new(Vec::new()),
            origins: RwLock::new(HashMap::new()),
        }
    }

    /// Append a module source. Sources are enumerated in the order added.
    pub fn add_source(&self, source: Arc<dyn ModuleSource>) {
        debug!("[Loader] Added {} module source", source.label());
        self.sources.write().push(source);
    }

    #[must_use]
    pub fn registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.registry)
    }

    // =========================================================================
    // LIFECYCLE STAGES
    // =========================================================================

    /// Enumerate and resolve candidates from every source.
    pub fn discover(&self) -> Discovery {
        let sources: Vec<Arc<dyn ModuleSource>> = self.sources.read().clone();
        let mut discovery = Discovery::default();
        let mut seen = HashSet::new();

        for source in sources {
            for candidate in source.enumerate() {
                let descriptor = match source.resolve(&candidate) {
                    Ok(descriptor) => descriptor,
                    Err(e) => {
                        debug!(
                            "[Loader] Skipping candidate '{}' from {}: {}",
                            candidate.name,
                            source.label(),
                            e
                        );
                        continue;
                    }
                };

                if !descriptor.name.is_empty() && !seen.insert(descriptor.name.clone()) {
                    warn!(
                        "[Loader] Duplicate module name '{}' from {} ({}), keeping the first",
                        descriptor.name,
                        source.label(),
                        candidate.origin
                    );
                    discovery.duplicates.push(descriptor.name);
                    continue;
                }

                discovery.modules.push(DiscoveredModule {
                    descriptor,
                    candidate,
                });
            }
        }

        discovery
    }

    /// Check a descriptor's contract against the disabled list.
    pub fn validate(&self, descriptor: &ModuleDescriptor) -> Result<(), ValidationError> {
        let disabled = self.services.config.get_string_list("modules.disabled");
        validate_contract(descriptor, &disabled)
    }

    /// Order `descriptors` for initialization. Already loaded modules satisfy
    /// dependencies.
    pub fn resolve_order(&self, descriptors: &[ModuleDescriptor]) -> Resolution {
        resolve_order(descriptors, &self.registry.loaded_set())
    }

    /// Initialize `ordered` in sequence. Returns how many reached `Loaded`.
    pub fn initialize(&self, ordered: &[ModuleDescriptor]) -> usize {
        ordered
            .iter()
            .filter(|descriptor| self.initialize_one(descriptor))
            .count()
    }

    fn initialize_one(&self, descriptor: &ModuleDescriptor) -> bool {
        let name = descriptor.name.as_str();

        // Descriptors handed straight to `initialize` have no record yet.
        if self.registry.insert_discovered(descriptor.clone()) {
            self.registry.note_discovered();
            self.registry.set_state(name, ModuleState::Validated, None);
        }

        if let Some(dependency) = self.first_unloaded_dependency(descriptor) {
            let reason = format!("Dependency '{dependency}' is not loaded");
            self.record_init_failure(name, reason);
            return false;
        }

        info!(
            "[Loader] Initializing module: {} v{}",
            name, descriptor.version
        );

        match self.run_init(descriptor) {
            Ok(()) => {
                self.registry.set_state(name, ModuleState::Loaded, None);
                info!("[Loader] Module loaded successfully: {}", name);
                self.publish(&CoreEvent::ModuleLoaded {
                    name: name.to_string(),
                    version: descriptor.version.clone(),
                });
                true
            }
            Err(reason) => {
                self.record_init_failure(name, reason);
                false
            }
        }
    }

    fn record_init_failure(&self, name: &str, reason: String) {
        error!("[Loader] Failed to initialize module '{}': {}", name, reason);
        self.registry
            .set_state(name, ModuleState::Failed, Some(reason.clone()));
        self.publish(&CoreEvent::ModuleFailed {
            name: name.to_string(),
            error: reason,
        });
    }

    fn first_unloaded_dependency<'d>(&self, descriptor: &'d ModuleDescriptor) -> Option<&'d str> {
        descriptor
            .dependencies
            .iter()
            .map(String::as_str)
            .find(|dependency| !self.registry.is_loaded(dependency))
    }

    /// Call the entry point with a fresh facade. Panics become errors.
    fn run_init(&self, descriptor: &ModuleDescriptor) -> Result<(), String> {
        let Some(entry) = descriptor.entry.as_ref() else {
            return Err("missing entry point".to_string());
        };

        let handle = CoreHandle::new(
            self.services.clone(),
            Arc::clone(&self.registry),
            descriptor.name.clone(),
            descriptor.config.clone(),
        );

        match panic::catch_unwind(AssertUnwindSafe(|| entry.init(&handle))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(panic) => Err(format!("init panicked: {}", panic_message(panic.as_ref()))),
        }
    }

    fn publish(&self, event: &CoreEvent) {
        if let Err(e) = self.services.bus.publish_event(event) {
            warn!("[Loader] Could not publish '{}': {}", event.name(), e);
        }
    }

    // =========================================================================
    // ORCHESTRATION
    // =========================================================================

    /// Discover, validate, resolve and initialize everything not yet known.
    ///
    /// Names that already have a record from an earlier pass are skipped.
    pub fn load_modules(&self) -> LoadSummary {
        if !self.services.config.get_bool("modules.auto_load", true) {
            info!("[Loader] Module auto-load is disabled");
            return LoadSummary::default();
        }

        info!(
            "[Loader] Loading modules from {} source(s)",
            self.sources.read().len()
        );

        let discovery = self.discover();
        let mut summary = LoadSummary::default();

        for _ in &discovery.duplicates {
            self.registry.note_discovered();
            self.registry.note_untracked_rejection();
            summary.discovered += 1;
            summary.failed += 1;
        }

        let batch: Vec<DiscoveredModule> = discovery
            .modules
            .into_iter()
            .filter(|found| {
                let known = self.registry.contains(&found.descriptor.name);
                if known {
                    debug!(
                        "[Loader] Module '{}' already known, skipping",
                        found.descriptor.name
                    );
                }
                !known
            })
            .collect();

        if batch.is_empty() {
            warn!("[Loader] No new modules found");
            return summary;
        }

        info!("[Loader] Discovered {} modules", batch.len());
        summary.discovered += batch.len();

        let mut valid = Vec::with_capacity(batch.len());
        for found in batch {
            self.registry.note_discovered();
            let descriptor = found.descriptor.clone();
            let name = descriptor.name.clone();

            match self.validate(&descriptor) {
                Ok(()) => {
                    self.registry.insert_discovered(descriptor.clone());
                    self.registry.set_state(&name, ModuleState::Validated, None);
                    self.origins
                        .write()
                        .insert(name, (found.source, found.candidate));
                    valid.push(descriptor);
                }
                Err(e) => {
                    summary.failed += 1;
                    if matches!(e, ValidationError::Disabled(_)) {
                        info!("[Loader] {}", e);
                    } else {
                        error!("[Loader] {}", e);
                    }
                    if name.is_empty() {
                        self.registry.note_untracked_rejection();
                    } else {
                        self.registry.insert_discovered(descriptor);
                        self.registry
                            .set_state(&name, ModuleState::Rejected, Some(e.to_string()));
                    }
                }
            }
        }

        let resolution = self.resolve_order(&valid);
        for (name, failure) in &resolution.failed {
            self.registry
                .set_state(name, ModuleState::Failed, Some(failure.to_string()));
        }
        summary.failed += resolution.failed.len();

        let by_name: HashMap<&str, &ModuleDescriptor> =
            valid.iter().map(|d| (d.name.as_str(), d)).collect();
        let ordered: Vec<ModuleDescriptor> = resolution
            .order
            .iter()
            .filter_map(|name| by_name.get(name.as_str()).map(|d| (*d).clone()))
            .collect();

        summary.loaded = self.initialize(&ordered);
        summary.failed += ordered.len() - summary.loaded;

        info!(
            "[Loader] Module loading complete: {} loaded, {} failed",
            summary.loaded, summary.failed
        );
        summary
    }

    /// Re-resolve a loaded module from its source and run its init again.
    ///
    /// Only available with `core.dev_mode`. On failure the previous record
    /// stays as it was.
    pub fn reload(&self, name: &str) -> Result<ModuleDescriptor, LoaderError> {
        if !self.services.config.get_bool("core.dev_mode", false) {
            warn!("[Loader] Module reload is only available in development mode");
            return Err(LoaderError::ReloadDisabled);
        }

        if !self.registry.is_loaded(name) {
            error!("[Loader] Module not loaded: {}", name);
            return Err(LoaderError::NotLoaded(name.to_string()));
        }

        let (source, candidate) = self
            .origins
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownOrigin {
                name: name.to_string(),
            })?;

        info!("[Loader] Reloading module: {}", name);
        source.invalidate(name);

        let fresh = source
            .resolve(&candidate)
            .map_err(|source| LoaderError::Source {
                name: name.to_string(),
                source,
            })?;

        if fresh.name != name {
            return Err(LoaderError::NameChanged {
                expected: name.to_string(),
                found: fresh.name,
            });
        }

        self.validate(&fresh)?;

        if let Some(dependency) = self.first_unloaded_dependency(&fresh) {
            return Err(LoaderError::DependencyNotLoaded {
                module: name.to_string(),
                dependency: dependency.to_string(),
            });
        }

        if let Err(reason) = self.run_init(&fresh) {
            error!("[Loader] Failed to reload module '{}': {}", name, reason);
            return Err(LoaderError::InitFailed {
                name: name.to_string(),
                reason,
            });
        }

        self.registry.replace_loaded(fresh.clone());
        info!("[Loader] Module reloaded: {} v{}", name, fresh.version);
        self.publish(&CoreEvent::ModuleReloaded {
            name: name.to_string(),
            version: fresh.version.clone(),
        });
        Ok(fresh)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Descriptor of a loaded module.
    #[must_use]
    pub fn get_module(&self, name: &str) -> Option<ModuleDescriptor> {
        self.registry.loaded_descriptor(name)
    }

    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.registry.is_loaded(name)
    }

    #[must_use]
    pub fn loaded_modules(&self) -> Vec<String> {
        self.registry.loaded_names()
    }

    /// Rejected and failed modules with their reasons.
    #[must_use]
    pub fn failed_modules(&self) -> BTreeMap<String, String> {
        self.registry.failed()
    }

    #[must_use]
    pub fn module_state(&self, name: &str) -> Option<ModuleState> {
        self.registry.state(name)
    }

    #[must_use]
    pub fn record(&self, name: &str) -> Option<ModuleRecord> {
        self.registry.record(name)
    }

    #[must_use]
    pub fn stats(&self) -> LoaderStats {
        self.registry.stats()
    }
}
