//! # Bucu Core Test Suite
//!
//! Cross-service tests that need more than one crate.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/            # criterion benchmarks (bus, store, resolver)
//! └── src/integration/
//!     ├── properties.rs   # observable guarantees of each service
//!     ├── lifecycle.rs    # modules driving bus, store and permissions
//!     └── runtime.rs      # the assembled core with built-in modules
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bucu-tests
//! cargo test -p bucu-tests integration::lifecycle::
//! cargo bench -p bucu-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
