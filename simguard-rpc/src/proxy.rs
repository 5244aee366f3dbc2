//! Interception proxy around a wallet provider.
//!
//! Passes everything through to the wrapped provider except signing requests
//! made through the call members (`request`, `send`, `sendAsync`):
//! `eth_sendTransaction` and `eth_signTypedData_v3`/`_v4` are simulated first
//! and blocked only when the simulation service reports a veto.

use crate::dispatcher::Dispatcher;
use crate::error::ProviderError;
use crate::provider::{request_args, Provider, CALL_MEMBERS, REQUEST};
use crate::settings::Settings;
use crate::types::{Decision, SimulationRequest};
use alloy_primitives::{ChainId, U64};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Stable rejection texts. Page scripts match on these; do not reword.
pub const TX_REJECTED_MESSAGE: &str = "SimGuard Tx Signature: User denied transaction signature.";
pub const SIGNATURE_REJECTED_MESSAGE: &str =
    "SimGuard Message Signature: User denied message signature.";

/// Signing methods that are simulated before they reach the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMethod {
    SendTransaction,
    SignTypedDataV3,
    SignTypedDataV4,
}

impl SigningMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "eth_sendTransaction" => Some(Self::SendTransaction),
            "eth_signTypedData_v3" => Some(Self::SignTypedDataV3),
            "eth_signTypedData_v4" => Some(Self::SignTypedDataV4),
            _ => None,
        }
    }

    /// Positional params the call must carry to be simulated.
    fn expected_params(self) -> usize {
        match self {
            Self::SendTransaction => 1,
            Self::SignTypedDataV3 | Self::SignTypedDataV4 => 2,
        }
    }

    pub fn rejection_message(self) -> &'static str {
        match self {
            Self::SendTransaction => TX_REJECTED_MESSAGE,
            Self::SignTypedDataV3 | Self::SignTypedDataV4 => SIGNATURE_REJECTED_MESSAGE,
        }
    }
}

/// EIP-712 payload fields the simulation service needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedData {
    domain: Value,
    message: Value,
    primary_type: String,
}

/// Parse an `eth_chainId` answer: hex or decimal string, or a bare number.
pub fn parse_chain_id(value: &Value) -> Option<ChainId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse::<U64>().ok().map(|id| id.to::<u64>()),
        _ => None,
    }
}

pub struct InterceptingProvider {
    /// Captured once; internal queries go straight here, never through the proxy.
    inner: Arc<dyn Provider>,
    dispatcher: Arc<Dispatcher>,
    settings: watch::Receiver<Settings>,
}

impl InterceptingProvider {
    pub fn new(
        inner: Arc<dyn Provider>,
        dispatcher: Arc<Dispatcher>,
        settings: watch::Receiver<Settings>,
    ) -> Self {
        Self {
            inner,
            dispatcher,
            settings,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &Arc<dyn Provider> {
        &self.inner
    }

    fn disabled(&self) -> bool {
        self.settings.borrow().disable
    }

    async fn intercept(&self, member: &str, args: Vec<Value>) -> Result<Value, ProviderError> {
        let call = args.first();
        let Some(method) = call
            .and_then(|c| c.get("method"))
            .and_then(Value::as_str)
            .and_then(SigningMethod::parse)
        else {
            return self.inner.call(member, args).await;
        };

        let params: &[Value] = call
            .and_then(|c| c.get("params"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if params.len() != method.expected_params() {
            warn!(
                ?method,
                expected = method.expected_params(),
                got = params.len(),
                "unexpected params shape, forwarding unsimulated"
            );
            return self.inner.call(member, args).await;
        }

        let Some(request) = self.simulation_request(method, params).await else {
            return self.inner.call(member, args).await;
        };

        match self.dispatcher.dispatch(request).await {
            Decision::Reject => {
                info!(?method, "blocking call after user rejection");
                Err(ProviderError::user_rejected(method.rejection_message()))
            }
            Decision::Continue | Decision::Error => self.inner.call(member, args).await,
        }
    }

    /// `None` means the call cannot be simulated and should pass through.
    async fn simulation_request(
        &self,
        method: SigningMethod,
        params: &[Value],
    ) -> Option<SimulationRequest> {
        match method {
            SigningMethod::SendTransaction => {
                let chain_id = self.chain_id().await?;
                Some(SimulationRequest::Transaction {
                    chain_id,
                    transaction: params[0].clone(),
                })
            }
            SigningMethod::SignTypedDataV3 | SigningMethod::SignTypedDataV4 => {
                let parsed = match &params[1] {
                    Value::String(raw) => serde_json::from_str::<TypedData>(raw),
                    other => TypedData::deserialize(other),
                };
                let typed = match parsed {
                    Ok(typed) => typed,
                    Err(e) => {
                        warn!(?method, error = %e, "typed data not parseable, forwarding unsimulated");
                        return None;
                    }
                };
                let chain_id = self.chain_id().await?;
                Some(SimulationRequest::Signature {
                    chain_id,
                    domain: typed.domain,
                    message: typed.message,
                    primary_type: typed.primary_type,
                })
            }
        }
    }

    async fn chain_id(&self) -> Option<ChainId> {
        match self
            .inner
            .call(REQUEST, request_args("eth_chainId", json!([])))
            .await
        {
            Ok(value) => {
                let parsed = parse_chain_id(&value);
                if parsed.is_none() {
                    warn!(%value, "unparseable chain id, forwarding unsimulated");
                }
                parsed
            }
            Err(e) => {
                warn!(error = %e, "chain id query failed, forwarding unsimulated");
                None
            }
        }
    }
}

#[async_trait]
impl Provider for InterceptingProvider {
    async fn call(&self, member: &str, args: Vec<Value>) -> Result<Value, ProviderError> {
        if self.disabled() || !CALL_MEMBERS.contains(&member) {
            return self.inner.call(member, args).await;
        }
        self.intercept(member, args).await
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.inner.property(name)
    }
}

// ── Tests ────────────────────────────────────────────────────────
