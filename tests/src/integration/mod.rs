//! Cross-service integration tests.

pub mod lifecycle;
pub mod properties;
pub mod runtime;
