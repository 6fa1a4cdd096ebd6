//! Domain layer: entries, counters and the store itself.

pub mod entities;
pub mod errors;
pub mod store;
