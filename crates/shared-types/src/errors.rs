//! # Error Types
//!
//! Errors shared by the collaborator contracts.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or mutating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document root is not a JSON object.
    #[error("Configuration root must be an object")]
    NotAnObject,

    /// A dotted path was empty or contained an empty segment.
    #[error("Invalid configuration path: '{0}'")]
    InvalidPath(String),
}
