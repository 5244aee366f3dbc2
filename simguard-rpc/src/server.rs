//! JSON-RPC endpoint that dapps talk to instead of the wallet directly.
//!
//! `POST /` reads the provider binding and sends the request through the
//! interception proxy. `PUT /provider` swaps the underlying provider the way a
//! late-loading wallet script replaces the injected object.

use crate::binding::ProviderBinding;
use crate::error::{ProviderError, DISCONNECTED_CODE};
use crate::provider::{HttpProvider, Provider, REQUEST};
use crate::types::{JsonRpcRequest, JsonRpcResponse};
use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct BindProviderRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider_bound: bool,
}

/// Handle an incoming JSON-RPC request.
pub async fn handle_rpc(binding: &ProviderBinding, req: JsonRpcRequest) -> JsonRpcResponse {
    info!(method = %req.method, "RPC request received");

    let Some(provider) = binding.get() else {
        return JsonRpcResponse::error(
            req.id,
            DISCONNECTED_CODE,
            "No wallet provider is bound".into(),
        );
    };

    let params = match req.params {
        Value::Null => json!([]),
        params => params,
    };
    let args = vec![json!({ "method": req.method, "params": params })];

    match provider.call(REQUEST, args).await {
        Ok(result) => JsonRpcResponse::success(req.id, result),
        Err(e) => {
            let code = e.code();
            let data = match &e {
                ProviderError::Rpc { data, .. } => data.clone(),
                _ => None,
            };
            JsonRpcResponse::error_with_data(req.id, code, e.to_string(), data)
        }
    }
}

async fn rpc(
    State(binding): State<Arc<ProviderBinding>>,
    Json(req): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    Json(handle_rpc(&binding, req).await)
}

async fn bind_provider(
    State(binding): State<Arc<ProviderBinding>>,
    Json(body): Json<BindProviderRequest>,
) -> StatusCode {
    info!(url = %body.url, "binding new upstream provider");
    binding.set(Arc::new(HttpProvider::new(body.url)));
    StatusCode::NO_CONTENT
}

async fn health(State(binding): State<Arc<ProviderBinding>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        provider_bound: binding.get().is_some(),
    })
}

/// Build the axum router with CORS and request tracing enabled.
pub fn build_router(binding: Arc<ProviderBinding>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    Router::new()
        .route("/", post(rpc))
        .route("/provider", put(bind_provider))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(binding)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::lifecycle::RequestStore;
    use crate::proxy::TX_REJECTED_MESSAGE;
    use crate::settings::{fixed_settings, Settings};
    use crate::storage::MemoryStore;
    use crate::testing::{RecordingProvider, ScriptedBackend};
    use crate::types::SimulationOutcome;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn bound_binding(outcome: SimulationOutcome) -> Arc<ProviderBinding> {
        let requests = Arc::new(RequestStore::new(Arc::new(MemoryStore::new())));
        let dispatcher = Arc::new(Dispatcher::new(
            requests,
            Arc::new(ScriptedBackend::outcome(outcome)),
        ));
        let binding = Arc::new(ProviderBinding::new(
            dispatcher,
            fixed_settings(Settings::default()),
        ));
        binding.set(Arc::new(RecordingProvider::answering(json!("0x1234"))));
        binding
    }

    async fn post_rpc(router: Router, body: Value) -> JsonRpcResponse {
        let resp = router
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_read_call_is_forwarded() {
        let router = build_router(bound_binding(SimulationOutcome::Veto));
        let resp = post_rpc(
            router,
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_blockNumber"}),
        )
        .await;

        assert_eq!(resp.id, json!(7));
        assert_eq!(resp.result, Some(json!("0x1234")));
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn test_vetoed_transaction_returns_4001() {
        let router = build_router(bound_binding(SimulationOutcome::Veto));
        let resp = post_rpc(
            router,
            json!({
                "jsonrpc": "2.0",
                "id": "abc",
                "method": "eth_sendTransaction",
                "params": [{"to": "0xdrainer"}]
            }),
        )
        .await;

        let err = resp.error.unwrap();
        assert_eq!(err.code, 4001);
        assert_eq!(err.message, TX_REJECTED_MESSAGE);
        assert!(resp.result.is_none());
    }

    #[tokio::test]
    async fn test_unbound_provider_reports_disconnected() {
        let requests = Arc::new(RequestStore::new(Arc::new(MemoryStore::new())));
        let dispatcher = Arc::new(Dispatcher::new(
            requests,
            Arc::new(ScriptedBackend::outcome(SimulationOutcome::Veto)),
        ));
        let binding = Arc::new(ProviderBinding::new(
            dispatcher,
            fixed_settings(Settings::default()),
        ));

        let resp = post_rpc(
            build_router(binding),
            json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId"}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, DISCONNECTED_CODE);
    }

    #[tokio::test]
    async fn test_put_provider_replaces_binding() {
        let binding = bound_binding(SimulationOutcome::Veto);
        let before = binding.get().unwrap();

        let resp = build_router(binding.clone())
            .oneshot(
                Request::put("/provider")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"url": "http://127.0.0.1:8545"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let after = binding.get().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(
            after.property("url"),
            Some(json!("http://127.0.0.1:8545"))
        );
    }
}
