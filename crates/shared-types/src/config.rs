//! # Configuration Lookup
//!
//! Services read their tunables through [`ConfigSource`] using dotted paths
//! (`rate_limit.default_limit`, `modules.disabled`, ...). Lookups are made at
//! call time, so runtime changes to the tree take effect on the next call.
//!
//! A lookup on a tree that has not been loaded yet simply misses, and every
//! typed helper falls back to the supplied default.

use crate::errors::ConfigError;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Dotted-path configuration lookup.
pub trait ConfigSource: Send + Sync {
    /// Look up the raw value at `path`, or `None` if any segment is missing.
    fn lookup(&self, path: &str) -> Option<Value>;

    fn get_bool(&self, path: &str, default: bool) -> bool {
        self.lookup(path)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Non-negative integer at `path`. Fractional numbers are truncated.
    fn get_u64(&self, path: &str, default: u64) -> u64 {
        match self.lookup(path) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(default),
            _ => default,
        }
    }

    fn get_string(&self, path: &str, default: &str) -> String {
        match self.lookup(path) {
            Some(Value::String(s)) => s,
            _ => default.to_string(),
        }
    }

    /// String array at `path`. Non-string elements are ignored.
    fn get_string_list(&self, path: &str) -> Vec<String> {
        match self.lookup(path) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Configuration source that knows nothing. Every helper returns its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConfig;

impl ConfigSource for NoConfig {
    fn lookup(&self, _path: &str) -> Option<Value> {
        None
    }
}

/// In-memory configuration tree backed by a JSON object.
#[derive(Debug, Default)]
pub struct ConfigTree {
    root: RwLock<Map<String, Value>>,
}

impl ConfigTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree from a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self {
                root: RwLock::new(map),
            }),
            _ => Err(ConfigError::NotAnObject),
        }
    }

    /// Load a tree from a JSON file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Configuration loaded");
        Self::from_value(value)
    }

    /// Set the value at `path`, creating intermediate objects as needed.
    ///
    /// A non-object value sitting on the way is replaced by an object.
    pub fn set(&self, path: &str, value: Value) -> Result<(), ConfigError> {
        let segments = split_path(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| ConfigError::InvalidPath(path.to_string()))?;

        let mut root = self.root.write();
        let mut current = &mut *root;
        for segment in parents {
            let slot = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }
        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Deep-merge `overlay` into the tree. Objects merge key by key; any other
    /// value in the overlay replaces what was there.
    pub fn merge(&self, overlay: Value) -> Result<(), ConfigError> {
        let Value::Object(overlay) = overlay else {
            return Err(ConfigError::NotAnObject);
        };
        let mut root = self.root.write();
        merge_maps(&mut root, overlay);
        Ok(())
    }

    /// Apply overrides from environment variables named
    /// `{prefix}__SECTION__KEY`. Returns the number of values applied.
    pub fn apply_env_overrides(&self, prefix: &str) -> usize {
        self.apply_overrides(std::env::vars(), prefix)
    }

    /// Apply `(name, value)` overrides using the environment naming scheme.
    ///
    /// Names are lower-cased and split on `__`; values are parsed as JSON when
    /// possible and kept as strings otherwise.
    pub fn apply_overrides<I>(&self, vars: I, prefix: &str) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        let mut applied = 0;

        for (name, raw) in vars {
            let Some(rest) = name.strip_prefix(&marker) else {
                continue;
            };
            let path = rest
                .split("__")
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(".");
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

            if self.set(&path, value).is_ok() {
                debug!(path = %path, "Configuration override applied");
                applied += 1;
            }
        }

        applied
    }

    /// Copy of the whole tree.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.root.read().clone())
    }
}

impl ConfigSource for ConfigTree {
    fn lookup(&self, path: &str) -> Option<Value> {
        let root = self.root.read();
        let mut segments = path.split('.');
        let mut current = root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

fn merge_maps(target: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
