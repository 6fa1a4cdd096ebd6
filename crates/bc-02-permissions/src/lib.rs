//! # Permission Authority
//!
//! Stores a role per subject and answers access questions by comparing role
//! levels in an ordered hierarchy.
//!
//! ## Evaluation
//!
//! ```text
//! effective(subject) = stored role | player.default_permission | "user"
//! has_permission(subject, required) = level(effective) >= level(required)
//! ```
//!
//! Unknown roles evaluate at level 0. Role changes are announced on the bus
//! as `permission:changed`.
//!
//! ## Default Hierarchy
//!
//! | Role | Level |
//! |------|-------|
//! | `user` | 0 |
//! | `moderator` | 1 |
//! | `admin` | 2 |
//! | `superadmin` | 3 |
//!
//! Overridable through `permissions.hierarchy` at construction or
//! [`PermissionAuthority::set_role_hierarchy`] at runtime.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;

pub use domain::authority::{PermissionAuthority, DEFAULT_ROLE};
pub use domain::errors::PermissionError;
pub use domain::hierarchy::{RoleHierarchy, RoleLevel};
pub use domain::stats::PermissionStats;
