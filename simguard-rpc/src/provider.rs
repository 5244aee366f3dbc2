//! Wallet provider capability (EIP-1193 shaped) and the upstream HTTP provider.

use crate::error::ProviderError;
use crate::types::{JsonRpcRequest, JsonRpcResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Primary request entry point.
pub const REQUEST: &str = "request";
/// Legacy alias kept for older integrations.
pub const SEND: &str = "send";
/// Legacy alias kept for older integrations.
pub const SEND_ASYNC: &str = "sendAsync";

/// Call names that can carry a signing request.
pub const CALL_MEMBERS: &[&str] = &[REQUEST, SEND, SEND_ASYNC];

/// Anything page code can call into like an injected wallet provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Invoke `member` with positional `args`. For the request members,
    /// `args[0]` is `{ "method": ..., "params": [...] }`.
    async fn call(&self, member: &str, args: Vec<Value>) -> Result<Value, ProviderError>;

    /// Read a non-callable property such as `isMetaMask` or `chainId`.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Build the single-argument form used by `request`.
pub fn request_args(method: &str, params: Value) -> Vec<Value> {
    vec![json!({ "method": method, "params": params })]
}

/// Split provider call arguments into a JSON-RPC method and params.
///
/// Accepts the object form `[{method, params}]` and the legacy positional
/// form `send(method, params)`.
pub fn split_request(args: &[Value]) -> Result<(String, Value), ProviderError> {
    match args.first() {
        Some(Value::Object(obj)) => {
            let method = obj
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| ProviderError::InvalidArguments("missing `method`".into()))?;
            let params = obj.get("params").cloned().unwrap_or_else(|| json!([]));
            Ok((method.to_string(), params))
        }
        Some(Value::String(method)) => {
            let params = args.get(1).cloned().unwrap_or_else(|| json!([]));
            Ok((method.clone(), params))
        }
        _ => Err(ProviderError::InvalidArguments(
            "expected a request object or method name".into(),
        )),
    }
}

/// Provider backed by an upstream Ethereum JSON-RPC endpoint.
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Forward one request to the upstream RPC.
    async fn forward(&self, method: String, params: Value) -> Result<Value, ProviderError> {
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            method,
            params,
            id: json!(self.next_id.fetch_add(1, Ordering::Relaxed)),
        };
        debug!(method = %req.method, url = %self.url, "forwarding upstream");

        let resp = self
            .client
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("Upstream connection error: {e}")))?;
        let body = resp
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| ProviderError::Transport(format!("Upstream parse error: {e}")))?;

        match body.error {
            Some(err) => Err(ProviderError::Rpc {
                code: err.code,
                message: err.message,
                data: err.data,
            }),
            None => Ok(body.result.unwrap_or(Value::Null)),
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn call(&self, member: &str, args: Vec<Value>) -> Result<Value, ProviderError> {
        if !CALL_MEMBERS.contains(&member) {
            return Err(ProviderError::UnsupportedMember(member.to_string()));
        }
        let (method, params) = split_request(&args)?;
        self.forward(method, params).await
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "url" => Some(json!(self.url)),
            _ => None,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
