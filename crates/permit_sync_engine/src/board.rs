//! The permit board: what a list view binds to.
//!
//! Wraps a shared [`SyncEngine`] with a loading flag for fetches and an
//! [`OperationTracker`] for deletes, and exposes one current error string.

use crate::cell::SubscriptionId;
use crate::engine::{FetchSummary, SyncEngine};
use crate::error::{SyncError, SyncResult};
use crate::tracker::{DeleteOutcome, OperationTracker};
use crate::transport::CollectionTransport;
use parking_lot::Mutex;
use permit_sync_protocol::{Permit, ValidationError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// List-view state over a sync engine.
pub struct PermitBoard<T: CollectionTransport> {
    engine: Arc<SyncEngine<T>>,
    tracker: Mutex<OperationTracker>,
    loading: AtomicBool,
}

impl<T: CollectionTransport> PermitBoard<T> {
    /// Creates a board over a shared engine.
    pub fn new(engine: Arc<SyncEngine<T>>) -> Self {
        Self {
            engine,
            tracker: Mutex::new(OperationTracker::new()),
            loading: AtomicBool::new(false),
        }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<SyncEngine<T>> {
        &self.engine
    }

    /// Current permits.
    pub fn permits(&self) -> Vec<Permit> {
        self.engine.permits()
    }

    /// Registers a listener on the permit list.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Vec<Permit>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.engine.subscribe(listener)
    }

    /// True while a refresh is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// True while a delete of `id` is outstanding.
    pub fn is_deleting(&self, id: &str) -> bool {
        self.tracker.lock().is_deleting(id)
    }

    /// Identifiers with an outstanding delete.
    pub fn in_flight(&self) -> Vec<String> {
        self.tracker.lock().in_flight()
    }

    /// The aggregated delete failure message.
    pub fn failure_message(&self) -> String {
        self.tracker.lock().failure_message()
    }

    /// The error currently on display, empty when there is none.
    pub fn error_message(&self) -> String {
        self.tracker.lock().error_message()
    }

    /// Re-reads the collection.
    ///
    /// Success clears all error display. Failure shows the fetch error in
    /// place of any delete failures; outstanding deletes keep being tracked.
    pub async fn refresh(&self) -> SyncResult<FetchSummary> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.engine.fetch_all().await;
        self.loading.store(false, Ordering::SeqCst);

        match &result {
            Ok(_) => self.tracker.lock().record_fetch_success(),
            Err(SyncError::Closed) => {}
            Err(e) => self.tracker.lock().record_fetch_error(e.to_string()),
        }
        result
    }

    /// Deletes a permit, tracking it while the request is outstanding.
    ///
    /// A second delete of an identifier that is already deleting is ignored.
    /// Connectivity failures are recorded under the permit's display name
    /// (or its identifier, if the permit is no longer listed) and reported as
    /// [`DeleteOutcome::Failed`].
    pub async fn delete(&self, id: &str) -> SyncResult<DeleteOutcome> {
        if id.trim().is_empty() {
            return Err(ValidationError::InvalidId.into());
        }
        if !self.tracker.lock().begin_delete(id) {
            debug!(id, "delete already in flight, ignoring");
            return Ok(DeleteOutcome::AlreadyInFlight);
        }

        let name = self
            .engine
            .permit(id)
            .map_or_else(|| id.to_string(), |p| p.display_name().to_string());
        let result = self.engine.delete(id).await;

        let mut tracker = self.tracker.lock();
        match result {
            Ok(()) => {
                tracker.finish_delete(id, &name, true);
                Ok(DeleteOutcome::Deleted)
            }
            Err(SyncError::Connectivity) => {
                tracker.finish_delete(id, &name, false);
                warn!(id, failures = tracker.failures().len(), "delete failed");
                Ok(DeleteOutcome::Failed)
            }
            Err(e) => {
                tracker.abandon_delete(id);
                Err(e)
            }
        }
    }

    /// Creates a permit through the engine.
    pub async fn create(&self, permit: Permit) -> SyncResult<Permit> {
        self.engine.create(permit).await
    }

    /// Updates a permit through the engine.
    pub async fn update(&self, permit: Permit) -> SyncResult<Permit> {
        self.engine.update(permit).await
    }

    /// Tears the board down. Outstanding requests no longer change anything.
    pub fn close(&self) {
        self.engine.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::error::TransportError;
    use crate::transport::{MockCall, MockTransport};
    use permit_sync_protocol::PermitStatus;
    use serde_json::json;

    fn permit(id: &str, name: &str) -> Permit {
        Permit::with_id(id, name, "Applicant", "Building", PermitStatus::Submitted)
    }

    async fn board() -> (PermitBoard<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        transport.set_list_response(json!([permit("1", "A"), permit("2", "B")]));
        let engine = Arc::new(SyncEngine::new(SyncConfig::default(), transport.clone()));
        let board = PermitBoard::new(engine);
        board.refresh().await.unwrap();
        (board, transport)
    }

    #[tokio::test]
    async fn delete_failures_aggregate_and_recover() {
        let (board, transport) = board().await;
        transport.fail_delete_of("1", TransportError::Status(500));
        transport.fail_delete_of("2", TransportError::Status(500));

        assert_eq!(board.delete("1").await, Ok(DeleteOutcome::Failed));
        assert_eq!(
            board.error_message(),
            "Could not delete \"A\". Please try again."
        );

        assert_eq!(board.delete("2").await, Ok(DeleteOutcome::Failed));
        assert_eq!(
            board.error_message(),
            "Could not delete 2 permits: A, B. Please try again."
        );
        assert_eq!(board.permits().len(), 2);

        transport.recover_delete_of("1");
        assert_eq!(board.delete("1").await, Ok(DeleteOutcome::Deleted));
        assert_eq!(board.permits(), vec![permit("2", "B")]);
        assert_eq!(
            board.error_message(),
            "Could not delete \"B\". Please try again."
        );
    }

    #[tokio::test]
    async fn fetch_error_replaces_delete_message() {
        let (board, transport) = board().await;
        transport.fail_delete_of("1", TransportError::Timeout);
        board.delete("1").await.unwrap();

        transport.fail_next_list(TransportError::Status(502));
        assert!(board.refresh().await.is_err());
        assert_eq!(board.error_message(), SyncError::Connectivity.to_string());
        assert_eq!(board.failure_message(), "");

        board.refresh().await.unwrap();
        assert_eq!(board.error_message(), "");
    }

    #[tokio::test]
    async fn in_flight_while_outstanding() {
        let (board, transport) = board().await;
        transport.hold_deletes();

        let deleting = board.delete("1");
        let observe = async {
            tokio::task::yield_now().await;
            let during = (board.is_deleting("1"), board.in_flight());
            transport.release_deletes(1);
            during
        };
        let (outcome, (deleting_now, in_flight)) = tokio::join!(deleting, observe);

        assert!(deleting_now);
        assert_eq!(in_flight, vec!["1".to_string()]);
        assert_eq!(outcome, Ok(DeleteOutcome::Deleted));
        assert!(!board.is_deleting("1"));
    }

    #[tokio::test]
    async fn overlapping_delete_is_ignored() {
        let (board, transport) = board().await;
        transport.hold_deletes();

        let first = board.delete("1");
        let second = async {
            tokio::task::yield_now().await;
            let outcome = board.delete("1").await;
            transport.release_deletes(1);
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first, Ok(DeleteOutcome::Deleted));
        assert_eq!(second, Ok(DeleteOutcome::AlreadyInFlight));
        let deletes = transport
            .calls()
            .into_iter()
            .filter(|call| matches!(call, MockCall::Delete(_)))
            .count();
        assert_eq!(deletes, 1);
    }

    #[tokio::test]
    async fn blank_id_is_rejected() {
        let (board, _) = board().await;
        assert_eq!(
            board.delete(" ").await,
            Err(SyncError::Validation(ValidationError::InvalidId))
        );
        assert!(board.in_flight().is_empty());
    }

    #[tokio::test]
    async fn unknown_permit_reported_by_id() {
        let (board, transport) = board().await;
        transport.fail_next_delete(TransportError::Status(404));

        board.delete("ghost").await.unwrap();
        assert_eq!(
            board.error_message(),
            "Could not delete \"ghost\". Please try again."
        );
    }

    #[tokio::test]
    async fn close_mid_delete_keeps_earlier_failure() {
        let (board, transport) = board().await;
        transport.fail_next_delete(TransportError::Status(500));
        assert_eq!(board.delete("1").await, Ok(DeleteOutcome::Failed));
        transport.hold_deletes();

        let retry = board.delete("1");
        let teardown = async {
            tokio::task::yield_now().await;
            board.close();
            transport.release_deletes(1);
        };
        let (outcome, ()) = tokio::join!(retry, teardown);

        assert_eq!(outcome, Err(SyncError::Closed));
        assert!(!board.is_deleting("1"));
        assert_eq!(
            board.error_message(),
            "Could not delete \"A\". Please try again."
        );
    }

    #[tokio::test]
    async fn loading_flag_resets() {
        let (board, transport) = board().await;
        assert!(!board.is_loading());
        transport.fail_next_list(TransportError::Timeout);
        let _ = board.refresh().await;
        assert!(!board.is_loading());
    }

    #[tokio::test]
    async fn malformed_fetch_shows_validation_message() {
        let (board, transport) = board().await;
        transport.set_list_response(json!({"data": []}));

        assert!(board.refresh().await.unwrap_err().is_validation());
        assert_eq!(
            board.error_message(),
            "Invalid permit data received from server"
        );
        assert_eq!(board.permits().len(), 2);
    }
}
