//! # Permit Sync Server
//!
//! In-memory reference REST server for the permit collection.
//!
//! This crate provides:
//! - `GET`/`POST` on the collection and `GET`/`PUT`/`DELETE` on items
//! - `HEAD` as a health check
//! - Field-level validation errors, duplicate and size checks
//! - Outage simulation and raw (possibly malformed) seeding for tests
//!
//! # Status codes
//!
//! | Situation | Status |
//! |-----------|--------|
//! | created | 201 |
//! | deleted | 204 |
//! | invalid body or id mismatch | 400 |
//! | unknown permit or route | 404 |
//! | duplicate id | 409 |
//! | body too large | 413 |
//! | outage simulated | 503 |

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod config;
mod error;
mod handler;
mod server;
mod store;

pub use config::{ServerConfig, DEFAULT_MAX_BODY_BYTES};
pub use error::{ServerError, ServerResult};
pub use handler::{field_errors, HandlerContext, RequestHandler};
pub use server::PermitServer;
pub use store::PermitStore;
