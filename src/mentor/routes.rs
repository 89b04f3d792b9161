//! REST endpoints for chat, reset, status and health.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, warn};

use super::manager::MentorManager;

const DEFAULT_USER_ID: &str = "default";

/// Shared state for mentor routes.
#[derive(Clone)]
pub struct MentorRouteState {
    pub manager: Arc<MentorManager>,
}

/// Body of `POST /api/chat`. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Message,
    Error,
}

/// Envelope returned by `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub text: String,
}

impl ChatReply {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Message,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Error,
            text: text.into(),
        }
    }
}

/// POST /api/chat
///
/// Runs one conversation turn. Turn failures are already folded into the
/// fallback reply, so this only errors on an unreadable body, which is a
/// 400 rather than a 500.
async fn chat(
    State(state): State<MentorRouteState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected chat request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ChatReply::error(format!("Invalid request: {}", rejection.body_text()))),
            )
                .into_response();
        }
    };

    let user_id = request
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    let message = request.message.unwrap_or_default();

    let reply = state.manager.handle_message(&user_id, &message).await;
    Json(ChatReply::message(reply)).into_response()
}

/// GET /api/reset/{user_id}
async fn reset(
    State(state): State<MentorRouteState>,
    UrlPath(user_id): UrlPath<String>,
) -> Response {
    match state.manager.reset(&user_id).await {
        Ok(_) => Json(serde_json::json!({"status": "reset"})).into_response(),
        Err(e) => {
            error!(session_id = %user_id, error = %e, "Reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply::error("Could not reset the conversation")),
            )
                .into_response()
        }
    }
}

/// GET /api/status/{user_id}
///
/// Returns phase, profile and counters. Unknown ids get a fresh session.
async fn status(
    State(state): State<MentorRouteState>,
    UrlPath(user_id): UrlPath<String>,
) -> Response {
    match state.manager.status(&user_id).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => {
            error!(session_id = %user_id, error = %e, "Status lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply::error("Could not load the conversation")),
            )
                .into_response()
        }
    }
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy"}))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ChatReply::error("Internal server error")),
    )
        .into_response()
}

/// Build the mentor REST routes.
pub fn mentor_routes(state: MentorRouteState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/reset/{user_id}", get(reset))
        .route("/api/status/{user_id}", get(status))
        .route("/health", get(health))
        .with_state(state)
}

/// Full application: mentor routes, optional static frontend, CORS and
/// panic recovery.
pub fn build_app(manager: Arc<MentorManager>, static_dir: Option<&Path>) -> Router {
    let mut app = mentor_routes(MentorRouteState { manager });
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }
    app.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(CorsLayer::permissive()),
    )
}
