//! Module source implementations.

pub mod directory;
pub mod static_source;
