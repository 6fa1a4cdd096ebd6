//! # Core Container
//!
//! Builds the shared services once at startup and hands them out by `Arc`.
//!
//! ```text
//! ConfigTree ──┬──→ EventBus ──────────┐
//!              │        ↑ publishes    │
//!              ├──→ PermissionAuthority├──→ CoreServices ──→ ModuleLoader
//! TimeSource ──┴──→ StateStore ────────┘
//! ```

pub mod config;
pub mod services;

pub use config::{build_config, default_config, load_config};
pub use services::{CoreContainer, CoreStatus};
