//! Ports: where modules come from.

pub mod source;
