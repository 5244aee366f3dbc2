//! Client for the remote simulation service.

use crate::error::BackendError;
use crate::types::{SimulationOutcome, SimulationRequest};
use alloy_primitives::ChainId;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

#[async_trait]
pub trait SimulationBackend: Send + Sync {
    async fn simulate_transaction(
        &self,
        chain_id: ChainId,
        transaction: &Value,
    ) -> Result<SimulationOutcome, BackendError>;

    async fn simulate_signature(
        &self,
        chain_id: ChainId,
        domain: &Value,
        message: &Value,
        primary_type: &str,
    ) -> Result<SimulationOutcome, BackendError>;

    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationOutcome, BackendError> {
        match request {
            SimulationRequest::Transaction {
                chain_id,
                transaction,
            } => self.simulate_transaction(*chain_id, transaction).await,
            SimulationRequest::Signature {
                chain_id,
                domain,
                message,
                primary_type,
            } => {
                self.simulate_signature(*chain_id, domain, message, primary_type)
                    .await
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBody<'a> {
    chain_id: ChainId,
    transaction: &'a Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignatureBody<'a> {
    chain_id: ChainId,
    domain: &'a Value,
    message: &'a Value,
    primary_type: &'a str,
}

/// HTTP simulation service client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    /// `timeout` bounds every call; `None` waits for as long as the service takes.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let base_url: String = base_url.into();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<SimulationOutcome, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<SimulationOutcome>().await?)
    }
}

#[async_trait]
impl SimulationBackend for HttpBackend {
    async fn simulate_transaction(
        &self,
        chain_id: ChainId,
        transaction: &Value,
    ) -> Result<SimulationOutcome, BackendError> {
        info!(chain_id, "submitting transaction simulation");
        self.post(
            "/v1/simulate/transaction",
            &TransactionBody {
                chain_id,
                transaction,
            },
        )
        .await
    }

    async fn simulate_signature(
        &self,
        chain_id: ChainId,
        domain: &Value,
        message: &Value,
        primary_type: &str,
    ) -> Result<SimulationOutcome, BackendError> {
        info!(chain_id, primary_type, "submitting signature simulation");
        self.post(
            "/v1/simulate/signature",
            &SignatureBody {
                chain_id,
                domain,
                message,
                primary_type,
            },
        )
        .await
    }
}

// ── Tests ────────────────────────────────────────────────────────
