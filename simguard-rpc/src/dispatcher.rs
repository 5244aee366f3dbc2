//! Simulation request dispatcher.
//!
//! Registers each intercepted request in the lifecycle store, runs it through
//! the simulation service, folds the outcome back into the store and tells the
//! proxy whether the original call may proceed. Only a veto blocks; every
//! internal failure fails open.

use crate::backend::SimulationBackend;
use crate::lifecycle::RequestStore;
use crate::types::{Decision, SimulationOutcome, SimulationRequest, StoredRequest};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct Dispatcher {
    requests: Arc<RequestStore>,
    backend: Arc<dyn SimulationBackend>,
}

impl Dispatcher {
    pub fn new(requests: Arc<RequestStore>, backend: Arc<dyn SimulationBackend>) -> Self {
        Self { requests, backend }
    }

    pub fn requests(&self) -> &Arc<RequestStore> {
        &self.requests
    }

    /// Never fails; problems degrade to a forwarded call.
    pub async fn dispatch(&self, request: SimulationRequest) -> Decision {
        let id = Uuid::new_v4();
        let kind = request.kind();
        info!(%id, ?kind, chain_id = request.chain_id(), "dispatching simulation");

        // Both start before either is awaited; the terminal write waits for both.
        let entry = StoredRequest::simulating(id, request.clone());
        let (added, outcome) = tokio::join!(
            self.requests.add(entry),
            self.backend.simulate(&request)
        );

        if let Err(e) = added {
            warn!(%id, error = %e, "could not record request, letting call through");
            return Decision::Error;
        }

        let (decision, written) = match outcome {
            Ok(SimulationOutcome::Success { simulation }) => {
                info!(%id, "simulation succeeded");
                (
                    Decision::Continue,
                    self.requests.transition_to_success(id, simulation).await,
                )
            }
            Ok(SimulationOutcome::Revert { error }) => {
                info!(%id, %error, "simulation reverted");
                (
                    Decision::Continue,
                    self.requests.transition_to_revert(id, error).await,
                )
            }
            Ok(SimulationOutcome::Error { error }) => {
                warn!(%id, %error, "simulation service reported an error");
                (
                    Decision::Continue,
                    self.requests.transition_to_error(id, error).await,
                )
            }
            Ok(SimulationOutcome::Veto) => {
                info!(%id, "request vetoed by user");
                if let Err(e) = self.requests.reject(id).await {
                    warn!(%id, error = %e, "could not record rejection");
                }
                return Decision::Reject;
            }
            Err(e) => {
                warn!(%id, error = %e, "simulation call failed");
                (
                    Decision::Continue,
                    self.requests.transition_to_error(id, e.to_string()).await,
                )
            }
        };

        match written {
            Ok(()) => decision,
            Err(e) => {
                warn!(%id, error = %e, "could not record simulation result");
                Decision::Error
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
