//! Module loader error types.

use bc_01_state_store::StoreError;
use bc_02_permissions::PermissionError;
use shared_bus::BusError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure returned by a module's `init`.
///
/// Facade errors convert with `?`, so an init body can propagate them.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("{0}")]
    Init(String),

    #[error("Invalid module config: {0}")]
    Config(String),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}

impl ModuleError {
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init(message.into())
    }
}

/// Contract violations found by validation. The descriptor is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Module missing required field: name")]
    MissingName,

    #[error("Module '{0}' missing required field: version")]
    MissingVersion(String),

    #[error("Module '{0}' missing required field: init (entry point)")]
    MissingEntry(String),

    #[error("Module '{0}' is disabled")]
    Disabled(String),
}

/// Failure to turn a candidate into a descriptor.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Module '{0}' not found in source")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from explicit loader operations.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Module reload is only available in development mode")]
    ReloadDisabled,

    #[error("Module not loaded: {0}")]
    NotLoaded(String),

    #[error("Module '{name}' has no known source")]
    UnknownOrigin { name: String },

    #[error("Failed to resolve module '{name}': {source}")]
    Source {
        name: String,
        #[source]
        source: SourceError,
    },

    #[error("Module '{expected}' now resolves as '{found}'")]
    NameChanged { expected: String, found: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Module '{module}' requires '{dependency}', which is not loaded")]
    DependencyNotLoaded { module: String, dependency: String },

    #[error("Failed to initialize module '{name}': {reason}")]
    InitFailed { name: String, reason: String },
}
