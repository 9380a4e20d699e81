//! REST endpoints for the turn API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::checklist::ChecklistType;
use crate::error::Error;
use crate::orchestrator::CheckOverride;
use crate::session::CoachService;

/// Shared state for the coach routes.
#[derive(Clone)]
pub struct CoachRouteState {
    pub service: Arc<CoachService>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub checklist_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub action: CheckOverride,
    #[serde(default)]
    pub reason: Option<String>,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Checklist errors are the caller's fault here; everything else is ours.
fn service_error(e: Error) -> Response {
    match e {
        Error::Checklist(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        other => {
            tracing::error!(error = %other, "Request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

/// POST /api/sessions
///
/// Starts a session and returns the opening question. An unknown checklist
/// type falls back to the default one.
async fn start_session(
    State(state): State<CoachRouteState>,
    body: Option<Json<StartSessionRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let checklist_type = req
        .checklist_type
        .as_deref()
        .map(ChecklistType::parse_or_default);
    match state
        .service
        .start_session(req.session_id, checklist_type)
        .await
    {
        Ok(reply) => (StatusCode::CREATED, Json(reply)).into_response(),
        Err(e) => service_error(e),
    }
}

/// POST /api/sessions/{id}/turns
async fn post_turn(
    State(state): State<CoachRouteState>,
    Path(session_id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Response {
    match state.service.handle_turn(&session_id, &req.text).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => service_error(e),
    }
}

/// GET /api/sessions/{id}
async fn get_session(
    State(state): State<CoachRouteState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.service.status(&session_id).await {
        Ok(Some(status)) => Json(status).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "session not found"),
        Err(e) => service_error(e),
    }
}

/// POST /api/sessions/{id}/checks/{check_id}/override
async fn override_check(
    State(state): State<CoachRouteState>,
    Path((session_id, check_id)): Path<(String, String)>,
    Json(req): Json<OverrideRequest>,
) -> Response {
    let reason = req.reason.as_deref().unwrap_or("operator override");
    match state
        .service
        .override_check(&session_id, &check_id, req.action, reason)
        .await
    {
        Ok(Some(status)) => Json(status).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "session not found"),
        Err(e) => service_error(e),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the coach REST routes.
pub fn coach_routes(state: CoachRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/turns", post(post_turn))
        .route(
            "/api/sessions/{id}/checks/{check_id}/override",
            post(override_check),
        )
        .with_state(state)
}
