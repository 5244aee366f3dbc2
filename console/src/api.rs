//! HTTP API for the SimGuard Console.
//!
//! Lets the review UI list intercepted requests, see which still need
//! attention, record the user's confirm/reject decision, prune decided
//! entries, and flip the interception switch.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use simguard_rpc::error::StorageError;
use simguard_rpc::lifecycle::{RequestStore, TransitionOutcome};
use simguard_rpc::settings::{Settings, SettingsStore};
use simguard_rpc::types::{RequestId, RequestState, StoredRequest};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub requests: Arc<RequestStore>,
    pub settings: Arc<SettingsStore>,
}

// ── Response Types ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct RequestsResponse {
    pub requests: Vec<StoredRequest>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct DecisionResponse {
    pub id: RequestId,
    pub state: RequestState,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub needs_action: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request {0} not found")]
    NotFound(RequestId),

    #[error("request {id} is {state:?} and cannot become {target:?}")]
    Conflict {
        id: RequestId,
        state: RequestState,
        target: RequestState,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Storage(e) => {
                warn!(error = %e, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

fn listing(requests: Vec<StoredRequest>) -> Json<RequestsResponse> {
    let count = requests.len();
    Json(RequestsResponse { requests, count })
}

// ── Handlers ────────────────────────────────────────────────────

/// GET /requests: every stored request, oldest first.
async fn list_requests(
    State(state): State<AppState>,
) -> Result<Json<RequestsResponse>, ApiError> {
    Ok(listing(state.requests.all().await?))
}

/// GET /requests/pending: requests still waiting on the user.
async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<RequestsResponse>, ApiError> {
    Ok(listing(state.requests.list_needs_action().await?))
}

fn decision(
    id: RequestId,
    target: RequestState,
    outcome: TransitionOutcome,
) -> Result<Json<DecisionResponse>, ApiError> {
    match outcome {
        TransitionOutcome::Applied => {
            info!(%id, state = ?target, "decision recorded from console");
            Ok(Json(DecisionResponse { id, state: target }))
        }
        TransitionOutcome::NotFound => Err(ApiError::NotFound(id)),
        TransitionOutcome::Refused(state) => Err(ApiError::Conflict { id, state, target }),
    }
}

/// POST /requests/:id/confirm
async fn confirm_request(
    Path(id): Path<RequestId>,
    State(state): State<AppState>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let outcome = state.requests.confirm(id).await?;
    decision(id, RequestState::Confirmed, outcome)
}

/// POST /requests/:id/reject
async fn reject_request(
    Path(id): Path<RequestId>,
    State(state): State<AppState>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let outcome = state.requests.reject(id).await?;
    decision(id, RequestState::Rejected, outcome)
}

/// DELETE /requests/:id
async fn remove_request(
    Path(id): Path<RequestId>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    if state.requests.remove(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id))
    }
}

/// POST /requests/clear: drop confirmed and rejected entries.
async fn clear_decided(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let removed = state.requests.clear_terminal_user_decisions().await?;
    Ok(Json(ClearResponse { removed }))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, ApiError> {
    Ok(Json(state.settings.load().await?))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    info!(disable = settings.disable, "settings updated from console");
    state.settings.save(&settings).await?;
    Ok(Json(settings))
}

/// GET /health: health check endpoint.
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok".into(),
        needs_action: state.requests.list_needs_action().await?.len(),
    }))
}

// ── Router ──────────────────────────────────────────────────────

/// Build the axum router with CORS enabled.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/requests", get(list_requests))
        .route("/requests/pending", get(list_pending))
        .route("/requests/clear", post(clear_decided))
        .route("/requests/:id", delete(remove_request))
        .route("/requests/:id/confirm", post(confirm_request))
        .route("/requests/:id/reject", post(reject_request))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use simguard_rpc::storage::{DocumentStore, MemoryStore};
    use simguard_rpc::types::{RequestStatus, SimulationRequest};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app_state() -> AppState {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        AppState {
            requests: Arc::new(RequestStore::new(Arc::clone(&store))),
            settings: Arc::new(SettingsStore::new(store)),
        }
    }

    async fn seed(state: &AppState, status: RequestStatus) -> RequestId {
        let mut entry = StoredRequest::simulating(
            Uuid::new_v4(),
            SimulationRequest::Transaction {
                chain_id: 1,
                transaction: json!({"to": "0xdex"}),
            },
        );
        entry.status = status;
        let id = entry.id;
        state.requests.add(entry).await.unwrap();
        id
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let resp = build_router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_pending_lists_only_open_requests() {
        let state = app_state();
        let open = seed(&state, RequestStatus::Simulating).await;
        seed(&state, RequestStatus::Confirmed).await;

        let (status, body) = send(&state, Method::GET, "/requests/pending", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["requests"][0]["id"], open.to_string());

        let (_, all) = send(&state, Method::GET, "/requests", None).await;
        assert_eq!(all["count"], 2);
    }

    #[tokio::test]
    async fn test_confirm_after_success() {
        let state = app_state();
        let id = seed(
            &state,
            RequestStatus::Success {
                simulation: json!({"ok": true}),
            },
        )
        .await;

        let (status, body) = send(&state, Method::POST, &format!("/requests/{id}/confirm"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "confirmed");

        let stored = state.requests.get(id).await.unwrap().unwrap();
        assert_eq!(stored.state(), RequestState::Confirmed);
    }

    #[tokio::test]
    async fn test_confirm_while_simulating_conflicts() {
        let state = app_state();
        let id = seed(&state, RequestStatus::Simulating).await;

        let (status, body) = send(&state, Method::POST, &format!("/requests/{id}/confirm"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("Simulating"));
    }

    #[tokio::test]
    async fn test_unknown_request_is_404() {
        let state = app_state();
        let missing = Uuid::new_v4();

        let (status, _) = send(&state, Method::POST, &format!("/requests/{missing}/reject"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, Method::DELETE, &format!("/requests/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clear_then_delete() {
        let state = app_state();
        seed(&state, RequestStatus::Rejected).await;
        seed(&state, RequestStatus::Confirmed).await;
        let kept = seed(
            &state,
            RequestStatus::Error {
                error: "boom".into(),
            },
        )
        .await;

        let (status, body) = send(&state, Method::POST, "/requests/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 2);

        let (status, _) = send(&state, Method::DELETE, &format!("/requests/{kept}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.requests.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let state = app_state();

        let (_, body) = send(&state, Method::GET, "/settings", None).await;
        assert_eq!(body, json!({"disable": false}));

        let (status, _) = send(&state, Method::PUT, "/settings", Some(json!({"disable": true}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.settings.load().await.unwrap().disable);
    }

    #[tokio::test]
    async fn test_health_counts_open_requests() {
        let state = app_state();
        seed(&state, RequestStatus::Simulating).await;
        seed(&state, RequestStatus::Rejected).await;

        let (status, body) = send(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["needs_action"], 1);
    }
}
