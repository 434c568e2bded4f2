//! # Permit Sync Testkit
//!
//! Test utilities for the permit sync crates.
//!
//! This crate provides:
//! - Named fixture permits and malformed records
//! - A seeded reference server
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use permit_sync_testkit::prelude::*;
//!
//! let server = seeded_server(&[permit_a(), permit_b()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
