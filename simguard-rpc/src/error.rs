//! Error types shared across the proxy.

use thiserror::Error;

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 "disconnected": no provider is bound.
pub const DISCONNECTED_CODE: i64 = 4900;

/// JSON-RPC internal error.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Errors surfaced by a [`crate::provider::Provider`] call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Structured JSON-RPC error, either from the wallet/upstream or a rejection
    /// raised by the interception proxy.
    #[error("{message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("provider does not expose `{0}`")]
    UnsupportedMember(String),

    #[error("malformed provider call: {0}")]
    InvalidArguments(String),
}

impl ProviderError {
    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::Rpc {
            code: USER_REJECTED_CODE,
            message: message.into(),
            data: None,
        }
    }

    /// JSON-RPC error code to report for this error.
    pub fn code(&self) -> i64 {
        match self {
            Self::Rpc { code, .. } => *code,
            Self::Transport(_) => INTERNAL_ERROR_CODE,
            Self::UnsupportedMember(_) => -32601,
            Self::InvalidArguments(_) => -32602,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == USER_REJECTED_CODE
    }
}

/// Errors from the durable document store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored document is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from the remote simulation service.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("simulation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("simulation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
