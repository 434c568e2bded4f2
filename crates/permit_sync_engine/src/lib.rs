//! # Permit Sync Engine
//!
//! Keeps a local, observable list of permits consistent with a remote REST
//! collection.
//!
//! This crate provides:
//! - A reactive state cell holding the canonical permit list
//! - `fetch_all` / `create` / `update` / `delete` against the remote collection
//! - Optimistic create and update with snapshot rollback
//! - Confirm-then-remove deletes with per-item in-flight tracking
//! - Aggregated delete failure messages
//! - A transport abstraction with a REST implementation and a mock
//!
//! ## Key Invariants
//!
//! - The permit list is never partially applied: each change either fully
//!   lands or is fully reverted
//! - Invalid input never reaches the network
//! - Invalid server entries are never observable in the list
//! - Connectivity failures reach callers as one fixed message; validation
//!   failures keep their own

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod board;
mod cell;
mod config;
mod engine;
mod error;
mod http;
mod tracker;
mod transport;

pub use board::PermitBoard;
pub use cell::{StateCell, SubscriptionId};
pub use config::{RetryConfig, SyncConfig};
pub use engine::{FetchSummary, SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult, TransportError, TransportResult, SERVER_CONNECTION_ERROR};
pub use http::{HttpClient, LoopbackClient, LoopbackServer, RestTransport};
pub use tracker::{aggregate_failures, DeleteOutcome, OperationTracker};
pub use transport::{CollectionTransport, MockCall, MockTransport};
