//! Toggle Synchronizer
//!
//! Flips a todo's completion flag on the service and reconciles the local
//! collection with the outcome. Per invocation:
//!
//! `Idle -> InFlight -> {Reconciled | Failed} -> Idle`
//!
//! - the in-flight indicator is raised before the request goes out and
//!   lowered on every exit path (including a dropped future)
//! - a second toggle for an id that is already in flight is rejected
//! - every request is bounded by a timeout and by the shutdown token
//! - failures are reported once through the `ErrorNotifier` and never
//!   returned as errors

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::commands::{toggle_request, TodoEndpoint};
use crate::config::{ClientConfig, ReconcilePolicy, DEFAULT_REQUEST_TIMEOUT};
use crate::context::{InFlightIndicator, InFlightWatch};
use crate::error::SyncFailure;
use crate::models::{TodoId, TodoItem};
use crate::notify::{ErrorNotifier, FailureNotice};
use crate::store::{TodoCollection, TodoStore};

/// Result of one toggle invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The service accepted the update and the local entry now holds `is_completed`
    Reconciled { id: TodoId, is_completed: bool },
    /// The service accepted the update but the id is not in the local collection
    Missing(TodoId),
    /// The update failed; local state reflects the last confirmed value
    Failed(SyncFailure),
    /// A toggle for this id was already in flight; nothing was sent
    Rejected(TodoId),
}

impl ToggleOutcome {
    pub fn is_reconciled(&self) -> bool {
        matches!(self, ToggleOutcome::Reconciled { .. })
    }
}

// ========================
// Guards
// ========================

/// Holds an id in the pending set until dropped
struct PendingGuard<'a> {
    pending: &'a Mutex<HashSet<TodoId>>,
    id: TodoId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Restores the pre-toggle entry unless disarmed
struct Rollback<'a> {
    store: &'a TodoStore,
    written: Arc<TodoItem>,
    previous: Option<Arc<TodoItem>>,
}

impl Rollback<'_> {
    fn disarm(mut self) {
        self.previous = None;
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if !self.store.restore_item(&self.written, previous) {
                log::warn!("todo {} changed during toggle, keeping newer value", self.written.id);
            }
        }
    }
}

// ========================
// Synchronizer
// ========================

pub struct ToggleSynchronizer {
    endpoint: Arc<dyn TodoEndpoint>,
    notifier: Arc<dyn ErrorNotifier>,
    indicator: InFlightIndicator,
    pending: Mutex<HashSet<TodoId>>,
    timeout: Duration,
    policy: ReconcilePolicy,
    shutdown: CancellationToken,
}

impl ToggleSynchronizer {
    pub fn new(endpoint: Arc<dyn TodoEndpoint>, notifier: Arc<dyn ErrorNotifier>) -> Self {
        Self {
            endpoint,
            notifier,
            indicator: InFlightIndicator::new(),
            pending: Mutex::new(HashSet::new()),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            policy: ReconcilePolicy::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(
        endpoint: Arc<dyn TodoEndpoint>,
        notifier: Arc<dyn ErrorNotifier>,
        config: &ClientConfig,
    ) -> Self {
        Self::new(endpoint, notifier)
            .with_timeout(config.request_timeout)
            .with_policy(config.policy)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Read-only view of the in-flight indicator
    pub fn in_flight(&self) -> InFlightWatch {
        self.indicator.watch()
    }

    pub fn is_in_flight(&self) -> bool {
        self.indicator.is_active()
    }

    /// Whether a toggle for `id` is currently outstanding
    pub fn is_pending(&self, id: &TodoId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Cancel every outstanding request; later toggles fail immediately
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Toggle `item` against a collection snapshot.
    ///
    /// Returns the reconciled collection (unchanged on failure, rejection or
    /// unknown id) together with the outcome.
    pub async fn toggle(
        &self,
        item: &TodoItem,
        collection: &TodoCollection,
    ) -> (TodoCollection, ToggleOutcome) {
        let Some(_pending) = self.claim(&item.id) else {
            return (collection.clone(), ToggleOutcome::Rejected(item.id.clone()));
        };
        let _ticket = self.indicator.begin();
        let is_completed = !item.is_completed;

        if let Err(failure) = self.send(item).await {
            return (collection.clone(), ToggleOutcome::Failed(failure));
        }

        match collection.with_completion(item, is_completed) {
            Some(next) => {
                log::info!("todo {} completed={}", item.id, is_completed);
                (next, ToggleOutcome::Reconciled { id: item.id.clone(), is_completed })
            }
            None => {
                log::warn!("todo {} updated remotely but is not in the local list", item.id);
                (collection.clone(), ToggleOutcome::Missing(item.id.clone()))
            }
        }
    }

    /// Toggle `item` and reconcile into the session store.
    ///
    /// The change is applied to the store's current snapshot, so concurrent
    /// toggles on different ids all land whatever order they finish in.
    /// Under `ReconcilePolicy::Optimistic` the flip is visible while the
    /// request is in flight and is rolled back if it fails.
    pub async fn toggle_in(&self, item: &TodoItem, store: &TodoStore) -> ToggleOutcome {
        let Some(_pending) = self.claim(&item.id) else {
            return ToggleOutcome::Rejected(item.id.clone());
        };
        let _ticket = self.indicator.begin();
        let is_completed = !item.is_completed;
        let flipped = Arc::new(item.with_completion(is_completed));

        let rollback = match self.policy {
            ReconcilePolicy::Optimistic => store.update_item(flipped.clone()).map(|previous| Rollback {
                store,
                written: flipped.clone(),
                previous: Some(previous),
            }),
            ReconcilePolicy::Confirmed => None,
        };

        // Dropping `rollback` on the error path restores the old entry
        if let Err(failure) = self.send(item).await {
            return ToggleOutcome::Failed(failure);
        }

        let applied = match rollback {
            Some(rollback) => {
                rollback.disarm();
                true
            }
            None => store.update_item(flipped).is_some(),
        };

        if applied {
            log::info!("todo {} completed={}", item.id, is_completed);
            ToggleOutcome::Reconciled { id: item.id.clone(), is_completed }
        } else {
            log::warn!("todo {} updated remotely but is not in the local list", item.id);
            ToggleOutcome::Missing(item.id.clone())
        }
    }

    fn claim(&self, id: &TodoId) -> Option<PendingGuard<'_>> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(id.clone()) {
            log::warn!("todo {} already has a toggle in flight, rejecting", id);
            return None;
        }
        Some(PendingGuard {
            pending: &self.pending,
            id: id.clone(),
        })
    }

    /// Issue the update and report a failure once
    async fn send(&self, item: &TodoItem) -> Result<(), SyncFailure> {
        let request = toggle_request(item);

        let result = tokio::select! {
            _ = self.shutdown.cancelled() => Err(SyncFailure::Cancelled),
            response = tokio::time::timeout(self.timeout, self.endpoint.update_todo(&request)) => {
                response.unwrap_or(Err(SyncFailure::Timeout(self.timeout)))
            }
        };

        if let Err(failure) = &result {
            self.notifier.notify(&FailureNotice {
                id: item.id.clone(),
                failure: failure.clone(),
            });
        }
        result
    }
}
