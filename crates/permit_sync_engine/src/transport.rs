//! Transport layer abstraction for the remote permit collection.

use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use permit_sync_protocol::Permit;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A collection transport talks to the remote permit collection.
///
/// Implementations return the raw JSON payloads; validation is the engine's
/// job. Any non-success outcome is reported as a [`TransportError`].
#[async_trait]
pub trait CollectionTransport: Send + Sync {
    /// Reads the whole collection (`GET /collection`).
    async fn list(&self) -> TransportResult<Value>;

    /// Creates a permit (`POST /collection`) and returns the created entity.
    async fn create(&self, permit: &Permit) -> TransportResult<Value>;

    /// Replaces a permit (`PUT /collection/{id}`) and returns the updated entity.
    async fn update(&self, permit: &Permit) -> TransportResult<Value>;

    /// Removes a permit (`DELETE /collection/{id}`).
    async fn delete(&self, id: &str) -> TransportResult<()>;
}

/// A request observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `list()`.
    List,
    /// `create()` with the permit id.
    Create(String),
    /// `update()` with the permit id.
    Update(String),
    /// `delete()` with the id.
    Delete(String),
}

/// A mock transport for testing.
///
/// Create and update echo the submitted permit back unless a response or a
/// failure is queued. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    disconnected: bool,
    calls: Vec<MockCall>,
    list_response: Option<Value>,
    list_failures: VecDeque<TransportError>,
    create_responses: VecDeque<TransportResult<Value>>,
    update_responses: VecDeque<TransportResult<Value>>,
    delete_failures: VecDeque<TransportError>,
    failing_ids: HashMap<String, TransportError>,
    delete_gate: Option<Arc<Semaphore>>,
    write_gate: Option<Arc<Semaphore>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the payload returned by every successful `list()`.
    pub fn set_list_response(&self, payload: Value) {
        self.inner.lock().list_response = Some(payload);
    }

    /// Causes the next `list()` to fail.
    pub fn fail_next_list(&self, error: TransportError) {
        self.inner.lock().list_failures.push_back(error);
    }

    /// Queues the outcome of the next `create()`.
    pub fn queue_create(&self, outcome: TransportResult<Value>) {
        self.inner.lock().create_responses.push_back(outcome);
    }

    /// Queues the outcome of the next `update()`.
    pub fn queue_update(&self, outcome: TransportResult<Value>) {
        self.inner.lock().update_responses.push_back(outcome);
    }

    /// Causes the next `delete()` to fail.
    pub fn fail_next_delete(&self, error: TransportError) {
        self.inner.lock().delete_failures.push_back(error);
    }

    /// Causes every `delete()` of `id` to fail until [`Self::recover_delete_of`].
    pub fn fail_delete_of(&self, id: impl Into<String>, error: TransportError) {
        self.inner.lock().failing_ids.insert(id.into(), error);
    }

    /// Lets deletes of `id` succeed again.
    pub fn recover_delete_of(&self, id: &str) {
        self.inner.lock().failing_ids.remove(id);
    }

    /// Holds every subsequent `delete()` until released.
    pub fn hold_deletes(&self) {
        self.inner.lock().delete_gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets `count` held deletes settle.
    pub fn release_deletes(&self, count: usize) {
        if let Some(gate) = &self.inner.lock().delete_gate {
            gate.add_permits(count);
        }
    }

    /// Holds every subsequent `create()` and `update()` until released.
    pub fn hold_writes(&self) {
        self.inner.lock().write_gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets `count` held creates or updates settle.
    pub fn release_writes(&self, count: usize) {
        if let Some(gate) = &self.inner.lock().write_gate {
            gate.add_permits(count);
        }
    }

    /// Sets the connected state. A disconnected mock fails every call.
    pub fn set_connected(&self, connected: bool) {
        self.inner.lock().disconnected = !connected;
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }

    fn record(&self, call: MockCall) -> TransportResult<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(call);
        if inner.disconnected {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }
}

async fn pass_gate(gate: Option<Arc<Semaphore>>) -> TransportResult<()> {
    if let Some(gate) = gate {
        gate.acquire()
            .await
            .map_err(|e| TransportError::fatal(e.to_string()))?
            .forget();
    }
    Ok(())
}

#[async_trait]
impl CollectionTransport for MockTransport {
    async fn list(&self) -> TransportResult<Value> {
        self.record(MockCall::List)?;
        let mut inner = self.inner.lock();
        if let Some(error) = inner.list_failures.pop_front() {
            return Err(error);
        }
        Ok(inner
            .list_response
            .clone()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }

    async fn create(&self, permit: &Permit) -> TransportResult<Value> {
        self.record(MockCall::Create(permit.id.clone()))?;
        let (queued, gate) = {
            let mut inner = self.inner.lock();
            (inner.create_responses.pop_front(), inner.write_gate.clone())
        };
        pass_gate(gate).await?;
        match queued {
            Some(outcome) => outcome,
            None => serde_json::to_value(permit).map_err(|e| TransportError::Encode(e.to_string())),
        }
    }

    async fn update(&self, permit: &Permit) -> TransportResult<Value> {
        self.record(MockCall::Update(permit.id.clone()))?;
        let (queued, gate) = {
            let mut inner = self.inner.lock();
            (inner.update_responses.pop_front(), inner.write_gate.clone())
        };
        pass_gate(gate).await?;
        match queued {
            Some(outcome) => outcome,
            None => serde_json::to_value(permit).map_err(|e| TransportError::Encode(e.to_string())),
        }
    }

    async fn delete(&self, id: &str) -> TransportResult<()> {
        self.record(MockCall::Delete(id.to_string()))?;

        let (outcome, gate) = {
            let mut inner = self.inner.lock();
            let outcome = match inner.delete_failures.pop_front() {
                Some(error) => Err(error),
                None => match inner.failing_ids.get(id) {
                    Some(error) => Err(error.clone()),
                    None => Ok(()),
                },
            };
            (outcome, inner.delete_gate.clone())
        };

        pass_gate(gate).await?;
        outcome
    }
}
