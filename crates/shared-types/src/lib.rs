//! # Shared Types Crate
//!
//! Types shared by every Bucu Core service: payload and identifier aliases,
//! the configuration lookup contract, and the time source contract.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-service types are defined here.
//! - **Explicit collaborators**: services receive a [`ConfigSource`] and a
//!   [`TimeSource`] at construction instead of probing for globals. Absence is
//!   the [`NoConfig`] variant, never a runtime existence check.

pub mod config;
pub mod entities;
pub mod errors;
pub mod time;

pub use config::{ConfigSource, ConfigTree, NoConfig};
pub use entities::*;
pub use errors::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
