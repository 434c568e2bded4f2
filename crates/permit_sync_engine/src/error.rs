//! Error types for the sync engine.

use permit_sync_protocol::ValidationError;
use thiserror::Error;

/// Fixed message shown for every connectivity failure.
pub const SERVER_CONNECTION_ERROR: &str =
    "An error occurred trying to connect to the server. Please contact the server administrator.";

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Raw cause of a failed remote call.
///
/// These are logged but never shown to callers of the engine; see
/// [`SyncError::Connectivity`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request body could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// Not connected.
    #[error("not connected to server")]
    NotConnected,
}

impl TransportError {
    /// Creates a retryable transport error.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Transport { retryable, .. } => *retryable,
            TransportError::Timeout => true,
            TransportError::Status(status) => *status >= 500,
            _ => false,
        }
    }
}

/// Errors surfaced to callers of the engine.
///
/// Validation failures keep their own message so callers can tell
/// "fix your input" apart from "the backend is unreachable". Every
/// connectivity failure collapses into one fixed message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Input or server data failed a structural check.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Any HTTP, timeout or transport failure.
    #[error("{}", SERVER_CONNECTION_ERROR)]
    Connectivity,

    /// The engine was closed while the request was outstanding.
    #[error("sync engine closed")]
    Closed,
}

impl SyncError {
    /// Returns true for validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }

    /// Returns true for connectivity failures.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::Connectivity)
    }
}

impl From<TransportError> for SyncError {
    fn from(_: TransportError) -> Self {
        SyncError::Connectivity
    }
}
