//! The reference permit server.

use crate::config::ServerConfig;
use crate::handler::{HandlerContext, RequestHandler};
use crate::store::PermitStore;
use permit_sync_protocol::{check_permit, HttpRequest, HttpResponse, Permit};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// An in-memory REST server for the permit collection.
///
/// Requests are handled synchronously; an HTTP front end or a loopback
/// client hands each request over to [`PermitServer::handle`].
///
/// # Example
///
/// ```
/// use permit_sync_protocol::{HttpRequest, Method};
/// use permit_sync_server::{PermitServer, ServerConfig};
///
/// let server = PermitServer::new(ServerConfig::default());
/// let response = server.handle(&HttpRequest::new(Method::Get, "/permits/"));
/// assert_eq!(response.status, 200);
/// ```
pub struct PermitServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl PermitServer {
    /// Creates a server with an empty collection.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(PermitStore::new()))
    }

    /// Creates a server over an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<PermitStore>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Handles one request. Errors are rendered as JSON error responses.
    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        match self.handler.handle(request) {
            Ok(response) => {
                debug!(method = %request.method, url = %request.url, status = response.status, "handled");
                response
            }
            Err(e) => {
                warn!(method = %request.method, url = %request.url, status = e.status(), error = %e, "request failed");
                e.to_response()
            }
        }
    }

    /// Adds permits to the collection, skipping ids already present.
    pub fn seed(&self, permits: &[Permit]) {
        for permit in permits {
            if let Err(e) = self.context.store.insert(permit) {
                warn!(id = %permit.id, error = %e, "seed skipped");
            }
        }
    }

    /// Appends records as-is, valid or not.
    pub fn seed_raw(&self, records: impl IntoIterator<Item = Value>) {
        for record in records {
            self.context.store.push_raw(record);
        }
    }

    /// Starts or ends a simulated outage. While unavailable every request
    /// gets `503`.
    pub fn set_available(&self, available: bool) {
        self.context.set_available(available);
    }

    /// Returns true unless an outage is being simulated.
    pub fn is_available(&self) -> bool {
        self.context.is_available()
    }

    /// Valid permits currently stored.
    pub fn permits(&self) -> Vec<Permit> {
        self.context
            .store
            .list()
            .iter()
            .filter_map(|record| check_permit(record).ok())
            .collect()
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<PermitStore> {
        &self.context.store
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> u64 {
        self.context.request_count()
    }
}

impl Default for PermitServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
