//! Permission errors. A rejected call leaves the role table unchanged.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Role must be a non-empty string")]
    EmptyRole,

    #[error("Role hierarchy must define at least one role")]
    EmptyHierarchy,
}
