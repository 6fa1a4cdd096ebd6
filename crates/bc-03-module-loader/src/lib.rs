//! # Module Loader
//!
//! Turns independently authored modules into a running set, in dependency
//! order, with per-module failure isolation.
//!
//! ## Module Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/  - StaticSource (compiled-in), DirectorySource       │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/source.rs - ModuleSource trait                           │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/descriptor.rs  - ModuleDescriptor, Module trait         │
//! │  domain/record.rs      - ModuleState lifecycle                  │
//! │  domain/resolver.rs    - topological sort, cycle detection      │
//! │  domain/validation.rs  - contract check                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `loader.rs` orchestrates the stages, `registry.rs` holds the records and
//! `context.rs` builds the facade each module's `init` receives.
//!
//! ## Lifecycle Events
//!
//! | Event | Payload |
//! |-------|---------|
//! | `module:loaded` | `{name, version}` |
//! | `module:failed` | `{name, error}` |
//! | `module:reloaded` | `{name, version}` |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod context;
pub mod domain;
pub mod loader;
pub mod ports;
pub mod registry;

pub use adapters::directory::DirectorySource;
pub use adapters::static_source::StaticSource;
pub use context::{CoreHandle, CoreServices, ModuleLog};
pub use domain::descriptor::{DynModule, FnModule, Module, ModuleDescriptor};
pub use domain::errors::{LoaderError, ModuleError, SourceError, ValidationError};
pub use domain::record::{ModuleRecord, ModuleState};
pub use domain::resolver::{resolve_order, Resolution, ResolveFailure};
pub use loader::{DiscoveredModule, Discovery, LoadSummary, ModuleLoader};
pub use ports::source::{ModuleCandidate, ModuleSource};
pub use registry::{LoaderStats, ModuleRegistry};
