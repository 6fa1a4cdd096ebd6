use thiserror::Error;

/// State store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Cache key must be a non-empty string")]
    EmptyKey,
}
