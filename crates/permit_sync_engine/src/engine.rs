//! Synchronization engine.
//!
//! Owns the canonical list of permits and keeps it consistent with the remote
//! collection:
//!
//! - `fetch_all` replaces the list wholesale with the validated payload
//! - `create` / `update` apply optimistically and restore a backup snapshot on
//!   any failure
//! - `delete` mutates only after the server confirms
//!
//! Every mutation is a single reassignment of the state cell, so subscribers
//! never observe a partially applied change.

use crate::cell::{StateCell, SubscriptionId};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult, TransportError, TransportResult};
use crate::transport::CollectionTransport;
use parking_lot::RwLock;
use permit_sync_protocol::{
    assert_valid_input, assert_valid_single_response, filter_valid_permits, is_valid_id, Permit,
    ValidationError,
};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Successful fetches.
    pub fetches: u64,
    /// Confirmed creates.
    pub creates: u64,
    /// Confirmed updates.
    pub updates: u64,
    /// Confirmed deletes.
    pub deletes: u64,
    /// Failed deletes.
    pub failed_deletes: u64,
    /// Optimistic mutations that were rolled back.
    pub rollbacks: u64,
    /// Payload entries dropped by validation or de-duplication.
    pub dropped_entries: u64,
    /// Fetch retries.
    pub retries: u64,
    /// Last raw error, for diagnostics only.
    pub last_error: Option<String>,
    /// Time of the last successful fetch.
    pub last_fetch_time: Option<Instant>,
}

/// Result of a successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    /// Permits now in the canonical list.
    pub kept: usize,
    /// Payload entries that were discarded.
    pub dropped: usize,
    /// Entries in the payload.
    pub total: usize,
}

/// Why an optimistic mutation is being rolled back.
enum MutationFailure {
    Transport(TransportError),
    Response(ValidationError),
}

impl fmt::Display for MutationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationFailure::Transport(e) => e.fmt(f),
            MutationFailure::Response(e) => write!(f, "invalid response: {e:?}"),
        }
    }
}

/// The sync engine keeps a local permit list consistent with the server.
pub struct SyncEngine<T: CollectionTransport> {
    config: SyncConfig,
    transport: T,
    permits: StateCell<Vec<Permit>>,
    stats: RwLock<SyncStats>,
    closed: AtomicBool,
}

impl<T: CollectionTransport> SyncEngine<T> {
    /// Creates a new sync engine with an empty permit list.
    pub fn new(config: SyncConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            permits: StateCell::new(Vec::new()),
            stats: RwLock::new(SyncStats::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a copy of the canonical permit list.
    pub fn permits(&self) -> Vec<Permit> {
        self.permits.get()
    }

    /// Looks up a permit by identifier.
    pub fn permit(&self, id: &str) -> Option<Permit> {
        self.permits
            .with(|permits| permits.iter().find(|p| p.id == id).cloned())
    }

    /// Number of permits in the canonical list.
    pub fn len(&self) -> usize {
        self.permits.with(Vec::len)
    }

    /// Returns true if the canonical list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a listener notified whenever the list is reassigned.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Vec<Permit>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.permits.subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.permits.unsubscribe(id)
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Tears the engine down.
    ///
    /// Requests still outstanding will settle without touching the list and
    /// report [`SyncError::Closed`]; new requests are refused.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`Self::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> SyncResult<()> {
        if self.is_closed() {
            Err(SyncError::Closed)
        } else {
            Ok(())
        }
    }

    fn record_error(&self, error: &impl fmt::Display) {
        self.stats.write().last_error = Some(error.to_string());
    }

    /// Reads the whole collection and replaces the canonical list.
    ///
    /// On a connectivity failure the list is left untouched. A payload whose
    /// root is not an array fails with a validation error; invalid entries
    /// inside an array are dropped.
    pub async fn fetch_all(&self) -> SyncResult<FetchSummary> {
        self.check_open()?;

        let payload = match self.list_with_retry().await {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "fetch permits failed");
                self.record_error(&e);
                return Err(e.into());
            }
        };
        self.check_open()?;

        let filtered = filter_valid_permits(&payload).inspect_err(|e| self.record_error(e))?;
        let total = filtered.total;
        let (permits, duplicates) = dedupe_by_id(filtered.permits);
        let dropped = filtered.dropped.len() + duplicates;
        let kept = permits.len();

        self.permits.set(permits);

        {
            let mut stats = self.stats.write();
            stats.fetches += 1;
            stats.dropped_entries += dropped as u64;
            stats.last_fetch_time = Some(Instant::now());
            stats.last_error = None;
        }
        info!(kept, dropped, total, "permits fetched");

        Ok(FetchSummary {
            kept,
            dropped,
            total,
        })
    }

    async fn list_with_retry(&self) -> TransportResult<Value> {
        let retry = &self.config.retry;
        let mut attempt = 0u32;

        loop {
            if attempt > 0 {
                tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
                self.stats.write().retries += 1;
            }

            match self.transport.list().await {
                Ok(payload) => return Ok(payload),
                Err(e) if e.is_retryable() && attempt + 1 < retry.max_attempts => {
                    debug!(attempt, error = %e, "retrying fetch");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Creates a permit.
    ///
    /// Invalid input is rejected before any request is issued. Otherwise the
    /// permit is appended immediately and removed again if the server does
    /// not confirm it.
    pub async fn create(&self, permit: Permit) -> SyncResult<Permit> {
        assert_valid_input(&permit)?;
        if self.permit(&permit.id).is_some() {
            return Err(ValidationError::DuplicateId.into());
        }
        self.check_open()?;

        let backup = self.permits.get();
        let optimistic = permit.clone();
        self.permits.update(move |permits| {
            let mut next = permits.clone();
            next.push(optimistic);
            next
        });

        let outcome = self.transport.create(&permit).await;
        if self.is_closed() {
            self.abandon(backup, &permit.id);
            return Err(SyncError::Closed);
        }

        match confirm(outcome, &permit.id) {
            Ok(confirmed) => {
                self.reconcile(&permit, &confirmed);
                self.stats.write().creates += 1;
                debug!(id = %permit.id, "permit created");
                Ok(confirmed)
            }
            Err(failure) => {
                error!(id = %permit.id, error = %failure, "create permit failed, rolling back");
                self.rollback(backup, &failure);
                Err(SyncError::Connectivity)
            }
        }
    }

    /// Updates a permit.
    ///
    /// Same shape as [`Self::create`], except that the optimistic change
    /// replaces the entry with the same identifier.
    pub async fn update(&self, permit: Permit) -> SyncResult<Permit> {
        assert_valid_input(&permit)?;
        self.check_open()?;

        let backup = self.permits.get();
        let optimistic = permit.clone();
        self.permits.update(move |permits| replace_by_id(permits, &optimistic));

        let outcome = self.transport.update(&permit).await;
        if self.is_closed() {
            self.abandon(backup, &permit.id);
            return Err(SyncError::Closed);
        }

        match confirm(outcome, &permit.id) {
            Ok(confirmed) => {
                self.reconcile(&permit, &confirmed);
                self.stats.write().updates += 1;
                debug!(id = %permit.id, "permit updated");
                Ok(confirmed)
            }
            Err(failure) => {
                error!(id = %permit.id, error = %failure, "update permit failed, rolling back");
                self.rollback(backup, &failure);
                Err(SyncError::Connectivity)
            }
        }
    }

    /// Deletes a permit.
    ///
    /// There is no optimistic change: the permit leaves the list only once
    /// the server confirms, and a failure leaves the list untouched.
    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        if !is_valid_id(id) {
            return Err(ValidationError::InvalidId.into());
        }
        self.check_open()?;

        let outcome = self.transport.delete(id).await;
        self.check_open()?;

        match outcome {
            Ok(()) => {
                self.permits.update(|permits| {
                    permits.iter().filter(|p| p.id != id).cloned().collect()
                });
                self.stats.write().deletes += 1;
                debug!(id, "permit deleted");
                Ok(())
            }
            Err(e) => {
                error!(id, error = %e, "delete permit failed");
                let mut stats = self.stats.write();
                stats.failed_deletes += 1;
                stats.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Swaps the optimistic entry for the server-confirmed one.
    fn reconcile(&self, submitted: &Permit, confirmed: &Permit) {
        if submitted != confirmed {
            self.permits
                .update(|permits| replace_by_id(permits, confirmed));
        }
    }

    /// Undoes the optimistic change of a request that settled after close.
    fn abandon(&self, backup: Vec<Permit>, id: &str) {
        self.permits.set(backup);
        debug!(id, "engine closed, optimistic change reverted");
    }

    fn rollback(&self, backup: Vec<Permit>, failure: &MutationFailure) {
        self.permits.set(backup);
        let mut stats = self.stats.write();
        stats.rollbacks += 1;
        stats.last_error = Some(failure.to_string());
    }
}

/// Validates a create/update response and checks it describes `expected_id`.
fn confirm(outcome: TransportResult<Value>, expected_id: &str) -> Result<Permit, MutationFailure> {
    let value = outcome.map_err(MutationFailure::Transport)?;
    let confirmed = assert_valid_single_response(&value).map_err(MutationFailure::Response)?;
    if confirmed.id != expected_id {
        warn!(expected = expected_id, returned = %confirmed.id, "server confirmed a different id");
        return Err(MutationFailure::Response(ValidationError::InvalidResponse));
    }
    Ok(confirmed)
}

fn replace_by_id(permits: &[Permit], replacement: &Permit) -> Vec<Permit> {
    permits
        .iter()
        .map(|p| {
            if p.id == replacement.id {
                replacement.clone()
            } else {
                p.clone()
            }
        })
        .collect()
}

/// Keeps the first occurrence of each identifier.
fn dedupe_by_id(permits: Vec<Permit>) -> (Vec<Permit>, usize) {
    let mut seen = HashSet::with_capacity(permits.len());
    let before = permits.len();
    let unique: Vec<Permit> = permits
        .into_iter()
        .filter(|p| {
            let fresh = seen.insert(p.id.clone());
            if !fresh {
                warn!(id = %p.id, "duplicate permit id filtered out");
            }
            fresh
        })
        .collect();
    let duplicates = before - unique.len();
    (unique, duplicates)
}
