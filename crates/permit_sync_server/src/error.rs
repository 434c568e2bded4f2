//! Error types for the reference server.

use permit_sync_protocol::HttpResponse;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors the server answers requests with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Body is not valid JSON.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Body is JSON but fails field validation.
    #[error("validation failed")]
    Validation {
        /// Field name to message.
        fields: BTreeMap<String, String>,
    },

    /// The path id and the body id differ.
    #[error("path id {path} does not match body id {body}")]
    IdMismatch {
        /// Id from the URL.
        path: String,
        /// Id from the body.
        body: String,
    },

    /// No such permit, or no such route.
    #[error("not found: {0}")]
    NotFound(String),

    /// A permit with the id already exists.
    #[error("permit already exists: {0}")]
    Duplicate(String),

    /// Body exceeds the configured limit.
    #[error("request body of {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge {
        /// Body size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Method not supported on the route.
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    /// Outage simulation is active.
    #[error("service unavailable")]
    Unavailable,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::InvalidBody(_)
            | ServerError::Validation { .. }
            | ServerError::IdMismatch { .. } => 400,
            ServerError::NotFound(_) => 404,
            ServerError::MethodNotAllowed(_) => 405,
            ServerError::Duplicate(_) => 409,
            ServerError::PayloadTooLarge { .. } => 413,
            ServerError::Internal(_) => 500,
            ServerError::Unavailable => 503,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }

    /// Renders the JSON error body.
    pub fn body(&self) -> Value {
        match self {
            ServerError::Validation { fields } => json!({
                "error": self.to_string(),
                "fields": fields,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }

    /// Renders the error as a response.
    pub fn to_response(&self) -> HttpResponse {
        let status = self.status();
        HttpResponse::json(status, &self.body()).unwrap_or_else(|_| HttpResponse::empty(status))
    }
}
