//! HTTP transport implementation.
//!
//! This module provides the REST transport for the sync engine. The actual
//! HTTP client is abstracted via a trait so that any HTTP library (or an
//! in-process loopback for tests) can carry the requests.

use crate::config::SyncConfig;
use crate::error::{TransportError, TransportResult};
use crate::transport::CollectionTransport;
use async_trait::async_trait;
use parking_lot::RwLock;
use permit_sync_protocol::{HttpRequest, HttpResponse, Method, Permit};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. An `Err` means
/// no response was received at all; HTTP error statuses are returned as
/// ordinary responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// REST transport for the permit collection.
///
/// Maps the four collection verbs onto `GET`/`POST`/`PUT`/`DELETE` with JSON
/// bodies, enforces the configured timeout and treats every non-2xx status
/// as a failure.
pub struct RestTransport<C: HttpClient> {
    config: SyncConfig,
    client: C,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> RestTransport<C> {
    /// Creates a new REST transport.
    pub fn new(config: SyncConfig, client: C) -> Self {
        Self {
            config,
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the collection URL.
    pub fn collection_url(&self) -> String {
        self.config.collection_url()
    }

    /// Returns the last raw error, for diagnostics only.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Checks if the transport is connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    /// Closes the transport. Subsequent calls fail without reaching the client.
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn set_error(&self, err: impl Into<String>) {
        *self.last_error.write() = Some(err.into());
    }

    fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    async fn execute(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let method = request.method;
        debug!(%method, url = %request.url, "sending request");

        let response = match tokio::time::timeout(self.config.timeout, self.client.send(request))
            .await
        {
            Err(_) => {
                warn!(%method, "request timed out");
                self.set_error("request timed out");
                return Err(TransportError::Timeout);
            }
            Ok(Err(e)) => {
                warn!(%method, error = %e, "request failed");
                self.set_error(e.clone());
                return Err(TransportError::retryable(e));
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            warn!(%method, status = response.status, "unexpected status");
            self.set_error(format!("status {}", response.status));
            return Err(TransportError::Status(response.status));
        }

        self.clear_error();
        Ok(response)
    }

    fn json_request(&self, method: Method, url: String, permit: &Permit) -> TransportResult<HttpRequest> {
        HttpRequest::new(method, url)
            .with_json(permit)
            .map_err(|e| TransportError::Encode(e.to_string()))
    }
}

fn decode(response: &HttpResponse) -> TransportResult<Value> {
    serde_json::from_slice(&response.body).map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl<C: HttpClient> CollectionTransport for RestTransport<C> {
    async fn list(&self) -> TransportResult<Value> {
        let request = HttpRequest::new(Method::Get, self.config.collection_url());
        let response = self.execute(request).await?;
        decode(&response)
    }

    async fn create(&self, permit: &Permit) -> TransportResult<Value> {
        let request = self.json_request(Method::Post, self.config.collection_url(), permit)?;
        let response = self.execute(request).await?;
        decode(&response)
    }

    async fn update(&self, permit: &Permit) -> TransportResult<Value> {
        let request = self.json_request(Method::Put, self.config.item_url(&permit.id), permit)?;
        let response = self.execute(request).await?;
        decode(&response)
    }

    async fn delete(&self, id: &str) -> TransportResult<()> {
        let request = HttpRequest::new(Method::Delete, self.config.item_url(id));
        self.execute(request).await.map(|_| ())
    }
}

/// Trait for servers that can handle loopback requests.
///
/// Implemented for any `Fn(&HttpRequest) -> HttpResponse`, so a closure
/// wrapping a server handle is enough.
pub trait LoopbackServer {
    /// Handles a request whose URL has been reduced to its path.
    fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

impl<F> LoopbackServer for F
where
    F: Fn(&HttpRequest) -> HttpResponse,
{
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        self(request)
    }
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
    healthy: AtomicBool,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self {
            server,
            healthy: AtomicBool::new(true),
        }
    }

    /// Simulates losing (or regaining) the network.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

/// Reduces an absolute URL to its path.
fn url_path(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => url,
    }
}

#[async_trait]
impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, String> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        request.url = url_path(&request.url).to_string();
        Ok(self.server.handle(&request))
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use permit_sync_protocol::PermitStatus;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct TestClient {
        response: Mutex<Option<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
        delay: Option<Duration>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        fn respond(self, response: HttpResponse) -> Self {
            *self.response.lock() = Some(response);
            self
        }
    }

    #[async_trait]
    impl HttpClient for TestClient {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            self.requests.lock().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.response
                .lock()
                .clone()
                .ok_or_else(|| "no response set".into())
        }
    }

    fn permit() -> Permit {
        Permit::with_id("42", "Substation", "Metro", "Electrical", PermitStatus::Submitted)
    }

    fn config() -> SyncConfig {
        SyncConfig::new("https://permits.example.gov")
    }

    #[tokio::test]
    async fn list_decodes_body() {
        let client = TestClient::new().respond(HttpResponse::json(200, &json!([])).unwrap());
        let transport = RestTransport::new(config(), client);

        assert_eq!(transport.list().await.unwrap(), json!([]));
        let requests = transport.client.requests.lock();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "https://permits.example.gov/permits/");
        assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn update_targets_item_url() {
        let client = TestClient::new().respond(HttpResponse::json(200, &permit()).unwrap());
        let transport = RestTransport::new(config(), client);

        transport.update(&permit()).await.unwrap();
        let requests = transport.client.requests.lock();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].url, "https://permits.example.gov/permits/42");
        assert!(requests[0].body.is_some());
    }

    #[tokio::test]
    async fn delete_accepts_empty_no_content() {
        let client = TestClient::new().respond(HttpResponse::empty(204));
        let transport = RestTransport::new(config(), client);
        assert!(transport.delete("42").await.is_ok());
    }

    #[tokio::test]
    async fn error_status_is_failure() {
        let client = TestClient::new().respond(HttpResponse::empty(500));
        let transport = RestTransport::new(config(), client);

        assert_eq!(transport.list().await, Err(TransportError::Status(500)));
        assert_eq!(transport.last_error(), Some("status 500".into()));
    }

    #[tokio::test]
    async fn undecodable_body_is_failure() {
        let client = TestClient::new().respond(HttpResponse {
            status: 200,
            body: b"<html>".to_vec(),
        });
        let transport = RestTransport::new(config(), client);
        assert!(matches!(
            transport.list().await,
            Err(TransportError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn no_response_is_transport_error() {
        let transport = RestTransport::new(config(), TestClient::new());
        let err = transport.delete("1").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(transport.last_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_server_times_out() {
        let mut client = TestClient::new().respond(HttpResponse::empty(204));
        client.delay = Some(Duration::from_secs(60));
        let transport =
            RestTransport::new(config().with_timeout(Duration::from_secs(1)), client);

        assert_eq!(transport.delete("1").await, Err(TransportError::Timeout));
    }

    #[tokio::test]
    async fn closed_transport_does_not_send() {
        let transport = RestTransport::new(config(), TestClient::new());
        transport.close();

        assert!(!transport.is_connected());
        assert_eq!(transport.list().await, Err(TransportError::NotConnected));
        assert!(transport.client.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn loopback_strips_origin() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let client = LoopbackClient::new(move |request: &HttpRequest| {
            sink.lock().push(request.url.clone());
            HttpResponse::empty(204)
        });
        let transport = RestTransport::new(config(), client);

        transport.delete("7").await.unwrap();
        assert_eq!(*seen.lock(), vec!["/permits/7".to_string()]);
    }

    #[tokio::test]
    async fn unhealthy_loopback_refuses() {
        let client = LoopbackClient::new(|_: &HttpRequest| HttpResponse::empty(200));
        client.set_healthy(false);
        let transport = RestTransport::new(config(), client);
        assert!(!transport.is_connected());
        assert_eq!(transport.list().await, Err(TransportError::NotConnected));
    }

    #[test]
    fn url_path_extraction() {
        assert_eq!(url_path("http://host:8080/permits/1"), "/permits/1");
        assert_eq!(url_path("https://host"), "/");
        assert_eq!(url_path("/permits/"), "/permits/");
    }
}
