//! # Directory Module Source
//!
//! Reads `<root>/<dir>/module.json` manifests and an optional
//! `<root>/<dir>/config.json`. Code cannot be loaded from disk, so each
//! manifest names an entry point registered up front with
//! [`DirectorySource::with_entry`]; the manifest's `entry` field defaults to
//! the module name.
//!
//! ```text
//! modules/
//! ├── bucu-admin/
//! │   ├── module.json   {"name": "bucu-admin", "version": "1.0.0", "dependencies": ["bucu-sessions"]}
//! │   └── config.json   {"command_prefix": "/"}
//! └── bucu-sessions/
//!     └── module.json
//! ```
//!
//! Resolved descriptors are cached until [`ModuleSource::invalidate`].

use crate::domain::descriptor::{DynModule, ModuleDescriptor};
use crate::domain::errors::SourceError;
use crate::ports::source::{ModuleCandidate, ModuleSource};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MANIFEST_FILE: &str = "module.json";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Deserialize)]
struct ModuleManifest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    entry: Option<String>,
}

pub struct DirectorySource {
    root: PathBuf,
    entries: HashMap<String, DynModule>,
    /// Resolved descriptors keyed by candidate (directory) name.
    cache: Mutex<HashMap<String, ModuleDescriptor>>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Register the entry point manifests refer to as `key`.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, entry: DynModule) -> Self {
        self.entries.insert(key.into(), entry);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_manifest(&self, path: &Path) -> Result<ModuleManifest, SourceError> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SourceError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_config(path: &Path) -> Option<serde_json::Value> {
        let text = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value @ serde_json::Value::Object(_)) => Some(value),
            Ok(_) => {
                warn!("[Loader] Ignoring {}: not a JSON object", path.display());
                None
            }
            Err(e) => {
                warn!("[Loader] Ignoring {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl ModuleSource for DirectorySource {
    fn label(&self) -> &str {
        "directory"
    }

    fn enumerate(&self) -> Vec<ModuleCandidate> {
        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) => {
                debug!(
                    "[Loader] Module directory {} not readable: {}",
                    self.root.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut candidates: Vec<ModuleCandidate> = dir
            .filter_map(Result::ok)
            .filter(|entry| entry.path().join(MANIFEST_FILE).is_file())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                Some(ModuleCandidate::new(name, entry.path().display().to_string()))
            })
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        candidates
    }

    fn resolve(&self, candidate: &ModuleCandidate) -> Result<ModuleDescriptor, SourceError> {
        if let Some(cached) = self.cache.lock().get(&candidate.name) {
            return Ok(cached.clone());
        }

        let dir = self.root.join(&candidate.name);
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(SourceError::NotFound(candidate.name.clone()));
        }
        let manifest = self.read_manifest(&manifest_path)?;

        let entry_key = manifest
            .entry
            .clone()
            .unwrap_or_else(|| manifest.name.clone());
        let entry = self.entries.get(&entry_key).cloned();
        if entry.is_none() {
            debug!(
                "[Loader] No entry point registered for '{}' ({})",
                entry_key, candidate.origin
            );
        }

        let descriptor = ModuleDescriptor {
            name: manifest.name,
            version: manifest.version,
            description: manifest.description,
            dependencies: manifest.dependencies,
            entry,
            config: Self::read_config(&dir.join(CONFIG_FILE)),
        };

        self.cache
            .lock()
            .insert(candidate.name.clone(), descriptor.clone());
        Ok(descriptor)
    }

    fn invalidate(&self, name: &str) {
        self.cache
            .lock()
            .retain(|key, descriptor| key != name && descriptor.name != name);
    }
}
