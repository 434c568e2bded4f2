//! Request handlers for the collection endpoints.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::PermitStore;
use permit_sync_protocol::{
    check_permit, decode_path_segment, HttpRequest, HttpResponse, Method, Permit, PermitStatus, REQUIRED_PERMIT_FIELDS,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// The collection (shared across all handlers).
    pub store: Arc<PermitStore>,
    available: AtomicBool,
    requests: AtomicU64,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, store: Arc<PermitStore>) -> Self {
        Self {
            config,
            store,
            available: AtomicBool::new(true),
            requests: AtomicU64::new(0),
        }
    }

    /// Returns true unless an outage is being simulated.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Starts or ends a simulated outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of requests received so far, including refused ones.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Collection,
    /// Decoded identifier.
    Item(String),
}

/// Handler for collection requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a request whose URL is a path.
    pub fn handle(&self, request: &HttpRequest) -> ServerResult<HttpResponse> {
        self.context.requests.fetch_add(1, Ordering::SeqCst);
        if !self.context.is_available() {
            return Err(ServerError::Unavailable);
        }

        if request.method == Method::Head {
            return Ok(HttpResponse::empty(200));
        }

        let route = self
            .route(&request.url)
            .ok_or_else(|| ServerError::NotFound(request.url.clone()))?;

        match (request.method, route) {
            (Method::Get, Route::Collection) => self.list(),
            (Method::Get, Route::Item(id)) => self.get(&id),
            (Method::Post, Route::Collection) => self.create(request),
            (Method::Put, Route::Item(id)) => self.update(&id, request),
            (Method::Delete, Route::Item(id)) => self.delete(&id),
            (method, _) => Err(ServerError::MethodNotAllowed(method.to_string())),
        }
    }

    fn route(&self, url: &str) -> Option<Route> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let base = &self.context.config.collection_path;
        let rest = path
            .strip_prefix(base.as_str())
            .or_else(|| (path == base.trim_end_matches('/')).then_some(""))?;

        match rest.trim_end_matches('/') {
            "" => Some(Route::Collection),
            id if !id.contains('/') => decode_path_segment(id).map(Route::Item),
            _ => None,
        }
    }

    fn list(&self) -> ServerResult<HttpResponse> {
        json_response(200, &Value::Array(self.context.store.list()))
    }

    fn get(&self, id: &str) -> ServerResult<HttpResponse> {
        let record = self
            .context
            .store
            .get(id)
            .ok_or_else(|| ServerError::NotFound(id.to_string()))?;
        json_response(200, &record)
    }

    fn create(&self, request: &HttpRequest) -> ServerResult<HttpResponse> {
        let permit = self.permit_body(request)?;
        let record = self.context.store.insert(&permit)?;
        debug!(id = %permit.id, "permit created");
        json_response(201, &record)
    }

    fn update(&self, id: &str, request: &HttpRequest) -> ServerResult<HttpResponse> {
        let permit = self.permit_body(request)?;
        if permit.id != id {
            return Err(ServerError::IdMismatch {
                path: id.to_string(),
                body: permit.id,
            });
        }
        let record = self.context.store.replace(&permit)?;
        debug!(id, "permit updated");
        json_response(200, &record)
    }

    fn delete(&self, id: &str) -> ServerResult<HttpResponse> {
        if !self.context.store.remove(id) {
            return Err(ServerError::NotFound(id.to_string()));
        }
        debug!(id, "permit deleted");
        Ok(HttpResponse::empty(204))
    }

    /// Size-checks, parses and validates a permit body.
    fn permit_body(&self, request: &HttpRequest) -> ServerResult<Permit> {
        let limit = self.context.config.max_body_bytes;
        let size = request.body_len();
        if size > limit {
            return Err(ServerError::PayloadTooLarge { size, limit });
        }

        let body = request.body.as_deref().unwrap_or_default();
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ServerError::InvalidBody(e.to_string()))?;

        let fields = field_errors(&value);
        if !fields.is_empty() {
            return Err(ServerError::Validation { fields });
        }
        check_permit(&value).map_err(|issue| ServerError::InvalidBody(issue.to_string()))
    }
}

/// Collects a message for every required field that fails validation.
pub fn field_errors(value: &Value) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    let Some(record) = value.as_object() else {
        errors.insert("body".to_string(), "must be a JSON object".to_string());
        return errors;
    };

    for field in REQUIRED_PERMIT_FIELDS {
        let message = match record.get(field) {
            None | Some(Value::Null) => Some("is required".to_string()),
            Some(Value::String(s)) if s.trim().is_empty() => Some("must not be blank".to_string()),
            Some(Value::String(s)) if field == "status" && s.parse::<PermitStatus>().is_err() => {
                let known: Vec<&str> = PermitStatus::ALL.iter().map(PermitStatus::as_str).collect();
                Some(format!("must be one of {}", known.join(", ")))
            }
            Some(Value::String(_)) => None,
            Some(_) => Some("must be a string".to_string()),
        };
        if let Some(message) = message {
            errors.insert(field.to_string(), message);
        }
    }
    errors
}

fn json_response(status: u16, value: &Value) -> ServerResult<HttpResponse> {
    HttpResponse::json(status, value).map_err(|e| ServerError::Internal(e.to_string()))
}
