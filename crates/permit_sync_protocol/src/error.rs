//! Validation error types.

use thiserror::Error;

/// Result type for validation gate operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Data failed a structural check.
///
/// Messages are fixed and never echo the offending data back to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Caller-supplied permit is missing a required field.
    #[error("Invalid permit data provided")]
    InvalidInput,

    /// A single permit returned by the server is malformed.
    #[error("Invalid permit data received from server")]
    InvalidResponse,

    /// The server response root is not a JSON array.
    #[error("Invalid permit data received from server")]
    MalformedEnvelope,

    /// An empty or whitespace-only permit identifier.
    #[error("Invalid permit ID provided")]
    InvalidId,

    /// The identifier is already present in the local collection.
    #[error("A permit with this ID already exists")]
    DuplicateId,
}

impl ValidationError {
    /// Returns true if the error concerns data received from the server.
    pub fn is_server_data(&self) -> bool {
        matches!(
            self,
            ValidationError::InvalidResponse | ValidationError::MalformedEnvelope
        )
    }
}
