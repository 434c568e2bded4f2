//! Delete operation tracking.
//!
//! Keeps the set of identifiers with an outstanding delete request and the
//! display names of permits whose most recent delete failed, and derives the
//! single error message shown above the permit list.

use std::collections::HashSet;

/// How a tracked delete settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The server confirmed the delete.
    Deleted,
    /// The delete failed; the permit is still present.
    Failed,
    /// A delete for the same identifier was already outstanding, so nothing
    /// was sent.
    AlreadyInFlight,
}

/// Per-item bookkeeping for deletes, plus the fetch-level error.
#[derive(Debug, Default)]
pub struct OperationTracker {
    in_flight: HashSet<String>,
    failures: Vec<String>,
    fetch_error: Option<String>,
}

impl OperationTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as deleting. Returns false if it already was.
    pub fn begin_delete(&mut self, id: &str) -> bool {
        self.in_flight.insert(id.to_string())
    }

    /// Settles the delete of `id`.
    ///
    /// The identifier always leaves the in-flight set. On success the name
    /// leaves the failure record. On failure it joins it unless already there,
    /// and the delete failures become the error on display.
    pub fn finish_delete(&mut self, id: &str, name: &str, succeeded: bool) {
        self.in_flight.remove(id);
        if succeeded {
            self.failures.retain(|recorded| recorded != name);
            return;
        }
        if !self.failures.iter().any(|recorded| recorded == name) {
            self.failures.push(name.to_string());
        }
        self.fetch_error = None;
    }

    /// Drops `id` from the in-flight set without touching the failure record.
    pub fn abandon_delete(&mut self, id: &str) {
        self.in_flight.remove(id);
    }

    /// Shows a fetch-level error. It supersedes and clears the delete failures.
    pub fn record_fetch_error(&mut self, message: impl Into<String>) {
        self.failures.clear();
        self.fetch_error = Some(message.into());
    }

    /// Clears all error display after a successful fetch.
    pub fn record_fetch_success(&mut self) {
        self.failures.clear();
        self.fetch_error = None;
    }

    /// Returns true while a delete of `id` is outstanding.
    pub fn is_deleting(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    /// Identifiers with an outstanding delete, sorted.
    pub fn in_flight(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.in_flight.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Names in the failure record, in the order they were recorded.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// The aggregated delete failure message, empty when there is none.
    pub fn failure_message(&self) -> String {
        aggregate_failures(&self.failures)
    }

    /// The message to display: the fetch error if one is showing, otherwise
    /// the aggregated delete failures.
    pub fn error_message(&self) -> String {
        match &self.fetch_error {
            Some(message) => message.clone(),
            None => self.failure_message(),
        }
    }
}

/// Builds the user-facing sentence for a list of failed deletes.
pub fn aggregate_failures(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [name] => format!("Could not delete \"{name}\". Please try again."),
        _ => format!(
            "Could not delete {} permits: {}. Please try again.",
            names.len(),
            names.join(", ")
        ),
    }
}
