//! Reactive state cell.
//!
//! A value plus a list of change listeners. Every reassignment notifies all
//! listeners synchronously, after the new value has been stored, so a
//! listener never observes a half-applied change.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by [`StateCell::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An observable value.
pub struct StateCell<T> {
    value: RwLock<T>,
    listeners: RwLock<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T: Clone> StateCell<T> {
    /// Creates a cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Runs `f` against the current value without copying it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replaces the value and notifies listeners.
    pub fn set(&self, value: T) {
        let snapshot = {
            let mut guard = self.value.write();
            *guard = value;
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Derives a new value from the current one and stores it.
    ///
    /// The read and the write happen under one lock, so concurrent updates
    /// are never lost.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let snapshot = {
            let mut guard = self.value.write();
            let next = f(&guard);
            *guard = next;
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Registers a listener called after every reassignment.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn notify(&self, value: &T) {
        // Listeners may read the cell or (un)subscribe; call them unlocked.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell")
            .field("value", &*self.value.read())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
