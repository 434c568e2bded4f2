//! # Permit Sync Protocol
//!
//! Entity model, REST wire primitives and the validation gate shared by the
//! permit sync client and the reference server.
//!
//! This crate provides:
//! - `Permit` and the closed `PermitStatus` enumeration
//! - `HttpRequest` / `HttpResponse` wire primitives and collection paths
//! - The validation gate deciding whether caller-supplied or server-returned
//!   data is structurally trustworthy
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod permit;
pub mod validation;
mod wire;

pub use error::{ValidationError, ValidationResult};
pub use permit::{Permit, PermitStatus};
pub use validation::{
    assert_valid_input, assert_valid_single_response, check_permit, filter_valid_permits,
    is_valid_id, is_valid_permit, FieldIssue, FilteredPermits, REQUIRED_PERMIT_FIELDS,
};
pub use wire::{
    decode_path_segment, encode_path_segment, HttpRequest, HttpResponse, Method, CONTENT_TYPE_JSON,
    PERMITS_PATH,
};
