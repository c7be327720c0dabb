//! HTTP server for the task webhook.

use std::time::Duration;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{NotificationPayload, TaskRequest};
use crate::notify::send_completion;
use crate::reconciler::Reconciler;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Config,
    /// Repository reconciler.
    pub reconciler: Reconciler,
}

/// Build the HTTP router for the deployer service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api-endpoint", post(task_handler))
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/dummy", post(dummy))
        .with_state(state)
}

/// Service banner.
async fn home() -> Json<Value> {
    Json(json!({ "message": "Task deployer is running" }))
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Liveness stub used by external probes.
async fn dummy() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Handle an inbound task request.
///
/// Runs the reconciliation, then fires the completion notification if an
/// evaluation URL was supplied. A failed notification is logged and never
/// changes the response to the original caller.
async fn task_handler(
    State(state): State<AppState>,
    Json(request): Json<TaskRequest>,
) -> Json<Value> {
    info!(
        task = %request.task,
        round = request.round,
        email = %request.email,
        attachments = request.attachments.len(),
        "Received task request"
    );

    match state.reconciler.reconcile(&request).await {
        Ok(outcome) => {
            info!(
                repo = %outcome.repo_url,
                pages = %outcome.pages_url,
                is_new = outcome.is_new,
                "Reconciliation complete"
            );

            if let Some(url) = request.evaluation_url.as_deref().filter(|u| !u.is_empty()) {
                let payload = NotificationPayload {
                    email: request.email.clone(),
                    task: request.task.clone(),
                    round: request.round,
                    nonce: request.nonce.clone(),
                    repo_url: outcome.repo_url.clone(),
                    commit_sha: outcome.commit_sha.clone(),
                    pages_url: outcome.pages_url.clone(),
                };
                let timeout = Duration::from_secs(state.config.notify_timeout_secs);
                if let Err(e) = send_completion(url, &payload, timeout).await {
                    warn!(evaluation_url = %url, error = %e, "Completion notification failed");
                }
            }

            Json(json!({
                "status": "success",
                "repo": outcome.repo_url,
                "pages": outcome.pages_url,
            }))
        }
        Err(e) => {
            error!(task = %request.task, error = %e, "Reconciliation failed");
            Json(json!({
                "status": "error",
                "reason": e.to_string(),
            }))
        }
    }
}
