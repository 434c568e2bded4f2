//! Server configuration.

use permit_sync_protocol::PERMITS_PATH;

/// Default request body limit: 2 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Configuration for the reference server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path the collection is served under, with leading and trailing slash.
    pub collection_path: String,
    /// Largest accepted request body; larger bodies get `413`.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Creates a configuration serving the collection under `collection_path`.
    pub fn new(collection_path: impl Into<String>) -> Self {
        Self {
            collection_path: collection_path.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Sets the request body limit.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(PERMITS_PATH)
    }
}
