//! Shared types: JSON-RPC envelopes, simulation requests/outcomes,
//! and the persisted request lifecycle record.

use alloy_primitives::ChainId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned to an intercepted call at dispatch time.
pub type RequestId = Uuid;

fn jsonrpc_version() -> String {
    "2.0".into()
}

/// Standard JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// Standard JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: serde_json::Value, code: i64, message: String) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    pub fn error_with_data(
        id: serde_json::Value,
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError { code, message, data }),
            id,
        }
    }
}

/// Which call shape produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Transaction,
    Signature,
}

/// Canonical request submitted to the simulation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SimulationRequest {
    #[serde(rename_all = "camelCase")]
    Transaction {
        chain_id: ChainId,
        transaction: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    Signature {
        chain_id: ChainId,
        domain: serde_json::Value,
        message: serde_json::Value,
        primary_type: String,
    },
}

impl SimulationRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Transaction { .. } => RequestKind::Transaction,
            Self::Signature { .. } => RequestKind::Signature,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            Self::Transaction { chain_id, .. } | Self::Signature { chain_id, .. } => *chain_id,
        }
    }
}

/// Everything the simulation service can answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SimulationOutcome {
    /// Simulated effects are available for review.
    Success { simulation: serde_json::Value },
    /// The transaction would revert on-chain.
    Revert { error: String },
    /// The service could not simulate the request.
    Error { error: String },
    /// The user refused the request; the intercepted call must not proceed.
    Veto,
}

/// What the interception proxy does with the original call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Reject,
    Error,
}

/// Flat view of a request's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Simulating,
    Success,
    Revert,
    Error,
    Confirmed,
    Rejected,
}

impl RequestState {
    /// True while the entry still wants the user's attention.
    pub fn needs_action(self) -> bool {
        matches!(
            self,
            Self::Success | Self::Error | Self::Simulating | Self::Revert
        )
    }

    /// Confirmed and Rejected are the user's final word on an entry.
    pub fn is_user_decision(self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected)
    }
}

/// Lifecycle state together with the data only that state may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RequestStatus {
    Simulating,
    Success { simulation: serde_json::Value },
    Revert { error: String },
    Error { error: String },
    Confirmed,
    Rejected,
}

impl RequestStatus {
    pub fn state(&self) -> RequestState {
        match self {
            Self::Simulating => RequestState::Simulating,
            Self::Success { .. } => RequestState::Success,
            Self::Revert { .. } => RequestState::Revert,
            Self::Error { .. } => RequestState::Error,
            Self::Confirmed => RequestState::Confirmed,
            Self::Rejected => RequestState::Rejected,
        }
    }
}

/// Persisted record of one intercepted call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    pub created_at: DateTime<Utc>,
    pub request: SimulationRequest,
    pub status: RequestStatus,
}

impl StoredRequest {
    /// A fresh entry for a request whose simulation has just been started.
    pub fn simulating(id: RequestId, request: SimulationRequest) -> Self {
        Self {
            id,
            kind: request.kind(),
            created_at: Utc::now(),
            request,
            status: RequestStatus::Simulating,
        }
    }

    pub fn state(&self) -> RequestState {
        self.status.state()
    }

    pub fn simulation_result(&self) -> Option<&serde_json::Value> {
        match &self.status {
            RequestStatus::Success { simulation } => Some(simulation),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            RequestStatus::Revert { error } | RequestStatus::Error { error } => Some(error),
            _ => None,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
