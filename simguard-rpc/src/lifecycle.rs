//! Request lifecycle store.
//!
//! Sole writer of the persisted request sequence. Every operation is a
//! read-modify-write of the whole document under [`REQUESTS_KEY`]. Cycles are
//! serialized inside this process; a second process sharing the same document
//! (the console) races with last-write-wins.

use crate::error::StorageError;
use crate::storage::{DocumentStore, REQUESTS_KEY};
use crate::types::{RequestId, RequestState, RequestStatus, StoredRequest};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Result of a user-decision transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    NotFound,
    /// The entry exists but its current state does not allow the move.
    Refused(RequestState),
}

pub struct RequestStore {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
}

impl RequestStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// All stored requests, oldest first.
    pub async fn all(&self) -> Result<Vec<StoredRequest>, StorageError> {
        match self.store.get(REQUESTS_KEY).await? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(&self, id: RequestId) -> Result<Option<StoredRequest>, StorageError> {
        Ok(self.all().await?.into_iter().find(|r| r.id == id))
    }

    async fn save(&self, requests: &[StoredRequest]) -> Result<(), StorageError> {
        self.store
            .set(REQUESTS_KEY, serde_json::to_value(requests)?)
            .await
    }

    pub async fn add(&self, entry: StoredRequest) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut requests = self.all().await?;
        debug!(id = %entry.id, kind = ?entry.kind, "request added");
        requests.push(entry);
        self.save(&requests).await
    }

    /// Replaces the status of `id`. Missing ids are a no-op, and a confirmed
    /// or rejected entry keeps the user's decision.
    async fn set_status(&self, id: RequestId, status: RequestStatus) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut requests = self.all().await?;
        let Some(entry) = requests.iter_mut().find(|r| r.id == id) else {
            debug!(%id, state = ?status.state(), "transition for unknown request ignored");
            return Ok(());
        };
        let current = entry.state();
        if current.is_user_decision() {
            debug!(%id, decided = ?current, late = ?status.state(), "late result after user decision ignored");
            return Ok(());
        }
        entry.status = status;
        self.save(&requests).await
    }

    pub async fn transition_to_success(
        &self,
        id: RequestId,
        simulation: serde_json::Value,
    ) -> Result<(), StorageError> {
        self.set_status(id, RequestStatus::Success { simulation }).await
    }

    pub async fn transition_to_revert(
        &self,
        id: RequestId,
        error: impl Into<String>,
    ) -> Result<(), StorageError> {
        self.set_status(id, RequestStatus::Revert { error: error.into() })
            .await
    }

    pub async fn transition_to_error(
        &self,
        id: RequestId,
        error: impl Into<String>,
    ) -> Result<(), StorageError> {
        self.set_status(id, RequestStatus::Error { error: error.into() })
            .await
    }

    async fn decide(
        &self,
        id: RequestId,
        status: RequestStatus,
        allowed: fn(RequestState) -> bool,
    ) -> Result<TransitionOutcome, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut requests = self.all().await?;
        let Some(entry) = requests.iter_mut().find(|r| r.id == id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        let current = entry.state();
        if !allowed(current) {
            return Ok(TransitionOutcome::Refused(current));
        }
        info!(%id, from = ?current, to = ?status.state(), "user decision recorded");
        entry.status = status;
        self.save(&requests).await?;
        Ok(TransitionOutcome::Applied)
    }

    /// User approved the request after reviewing its result.
    pub async fn confirm(&self, id: RequestId) -> Result<TransitionOutcome, StorageError> {
        self.decide(id, RequestStatus::Confirmed, |s| {
            matches!(
                s,
                RequestState::Success | RequestState::Revert | RequestState::Error
            )
        })
        .await
    }

    /// User refused the request. Allowed while still simulating, which is how
    /// a veto from the simulation service is recorded.
    pub async fn reject(&self, id: RequestId) -> Result<TransitionOutcome, StorageError> {
        self.decide(id, RequestStatus::Rejected, |s| !s.is_user_decision())
            .await
    }

    /// Returns whether an entry was removed.
    pub async fn remove(&self, id: RequestId) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut requests = self.all().await?;
        let before = requests.len();
        requests.retain(|r| r.id != id);
        if requests.len() == before {
            return Ok(false);
        }
        self.save(&requests).await?;
        Ok(true)
    }

    /// Drops every Confirmed or Rejected entry and returns how many went.
    pub async fn clear_terminal_user_decisions(&self) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut requests = self.all().await?;
        let before = requests.len();
        requests.retain(|r| !r.state().is_user_decision());
        let removed = before - requests.len();
        if removed > 0 {
            self.save(&requests).await?;
            info!(removed, "cleared decided requests");
        }
        Ok(removed)
    }

    /// Entries the review UI should still show.
    pub async fn list_needs_action(&self) -> Result<Vec<StoredRequest>, StorageError> {
        let mut requests = self.all().await?;
        requests.retain(|r| needs_action(r.state()));
        Ok(requests)
    }
}

/// True iff an entry in `state` still requires the user's attention.
pub fn needs_action(state: RequestState) -> bool {
    state.needs_action()
}

// ── Tests ────────────────────────────────────────────────────────
