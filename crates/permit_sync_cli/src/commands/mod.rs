//! CLI command implementations.

pub mod generate;
pub mod simulate;
pub mod validate;

use permit_sync_engine::SyncError;
use permit_sync_protocol::ValidationError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors a command can fail with.
#[derive(Error, Debug)]
pub enum CliError {
    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A file is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A payload failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A sync operation failed unexpectedly.
    #[error("{0}")]
    Sync(#[from] SyncError),

    /// A command line argument is unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
