//! # Core Entities
//!
//! Identifier and payload aliases used across services.

/// Arbitrary structured data carried by events and cache entries.
pub type Payload = serde_json::Value;

/// Numeric identifier of a subject (a connected player) in the role table.
pub type SubjectId = u64;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;
