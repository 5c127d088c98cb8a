//! HTTP server for GitLab webhooks.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::auth::GitlabTokens;
use crate::error::LinkerError;
use crate::events::GitEvent;
use crate::linker::{LinkResult, Linker};

/// Path GitLab delivers webhooks to.
pub const WEBHOOK_PATH: &str = "/gitlab";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Accepted `X-Gitlab-Token` values.
    pub gitlab_tokens: Arc<GitlabTokens>,
    /// Linking pipeline.
    pub linker: Linker,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(gitlab_tokens: GitlabTokens, linker: Linker) -> Self {
        Self {
            gitlab_tokens: Arc::new(gitlab_tokens),
            linker,
        }
    }
}

/// Build the HTTP router for the linker service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(gitlab_webhook_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "gitlab-linker",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handle incoming GitLab webhooks.
///
/// This handler:
/// 1. Checks the `X-Gitlab-Token` header (if tokens are configured)
/// 2. Normalizes the payload into artifacts
/// 3. Links referenced tickets and reports the created links
///
/// Tracker failures never change the status code; the response only lists
/// links that were actually created.
pub async fn gitlab_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Vec<LinkResult>>, StatusCode> {
    state.gitlab_tokens.authorize_headers(&headers).map_err(|e| {
        warn!("Rejected webhook with missing or invalid token");
        e.status_code()
    })?;

    let event = parse_event(&body).map_err(|e| {
        warn!(error = %e, "Failed to parse webhook payload");
        e.status_code()
    })?;

    let Some(event) = event else {
        debug!("Ignoring unhandled webhook event");
        return Ok(Json(Vec::new()));
    };

    let kind = event.kind();
    let artifacts = event.into_artifacts();
    info!(kind = %kind, artifacts = artifacts.len(), "Received GitLab event");

    let results = state.linker.process(&artifacts).await;
    info!(kind = %kind, links = results.len(), "Processed GitLab event");

    Ok(Json(results))
}

/// Decode and classify a raw webhook body.
fn parse_event(body: &[u8]) -> Result<Option<GitEvent>, LinkerError> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| LinkerError::MalformedEvent(e.to_string()))?;
    debug!(payload = %payload, "Received webhook payload");
    GitEvent::from_value(payload)
}
