//! # Core Configuration
//!
//! Built in three layers, later layers winning:
//!
//! 1. [`default_config`]: every tunable the services read.
//! 2. The JSON file named by `BUCU_CONFIG`, deep-merged.
//! 3. `BUCU__SECTION__KEY=value` environment overrides.
//!
//! The result is a single [`ConfigTree`] shared by all services. Values are
//! read at call time, so `ConfigTree::set` takes effect immediately.

use serde_json::{json, Value};
use shared_types::{ConfigError, ConfigTree};
use std::path::Path;
use tracing::info;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "BUCU_CONFIG";

/// Prefix for `BUCU__SECTION__KEY` overrides.
pub const ENV_PREFIX: &str = "BUCU";

/// Defaults for every key the core reads.
#[must_use]
pub fn default_config() -> Value {
    json!({
        "core": {
            "dev_mode": false
        },
        "rate_limit": {
            "enabled": true,
            "default_limit": shared_bus::DEFAULT_RATE_LIMIT,
            "window": shared_bus::DEFAULT_RATE_WINDOW_SECS,
            "events": {}
        },
        "modules": {
            "directory": "modules",
            "auto_load": true,
            "disabled": []
        },
        "player": {
            "default_permission": bc_02_permissions::DEFAULT_ROLE
        },
        "cache": {
            "cleanup_interval": 60
        }
    })
}

/// Build the tree from defaults, an optional file and override pairs.
pub fn build_config<I>(file: Option<&Path>, overrides: I) -> Result<ConfigTree, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let tree = ConfigTree::from_value(default_config())?;

    if let Some(path) = file {
        let loaded = ConfigTree::load_file(path)?;
        tree.merge(loaded.snapshot())?;
    }

    let applied = tree.apply_overrides(overrides, ENV_PREFIX);
    if applied > 0 {
        info!("[Config] Applied {} environment override(s)", applied);
    }
    Ok(tree)
}

/// Build the tree from the process environment.
pub fn load_config() -> Result<ConfigTree, ConfigError> {
    let file = std::env::var(CONFIG_PATH_VAR).ok();
    build_config(file.as_deref().map(Path::new), std::env::vars())
}
