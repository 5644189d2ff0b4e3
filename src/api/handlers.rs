//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{CredentialRequest, CredentialStatusResponse, ErrorResponse, QueuedResponse};
use super::AppState;
use crate::credential::CredentialError;
use crate::runtime::{SessionError, SseEvent};
use crate::state_machine::{Event, SessionView};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        .route("/api/session/start", post(start_session))
        .route("/api/session/stop", post(stop_session))
        .route("/api/session/reset", post(reset_session))
        // Credential
        .route(
            "/api/credential",
            get(get_credential).post(submit_credential),
        )
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.snapshot())
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe first so no change slips between the snapshot and the stream
    let broadcast_rx = state.session.subscribe();
    let init_event = SseEvent::Init {
        session: state.session.snapshot(),
    };

    sse_stream(init_event, broadcast_rx)
}

async fn start_session(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::Start).await
}

async fn stop_session(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::Stop).await
}

async fn reset_session(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    queue(&state, Event::Reset).await
}

async fn queue(state: &AppState, event: Event) -> Result<Json<QueuedResponse>, AppError> {
    state.session.send_event(event).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

// ============================================================
// Credential
// ============================================================

async fn get_credential(State(state): State<AppState>) -> Json<CredentialStatusResponse> {
    Json(CredentialStatusResponse::new(
        state.session.credential_source(),
    ))
}

async fn submit_credential(
    State(state): State<AppState>,
    Json(req): Json<CredentialRequest>,
) -> Result<Json<CredentialStatusResponse>, AppError> {
    let source = state
        .session
        .submit_credential(&req.api_key, req.remember)
        .await?;
    Ok(Json(CredentialStatusResponse::new(Some(source))))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("lotto-fortune ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Credential(e @ CredentialError::TooShort { .. }) => {
                AppError::BadRequest(e.to_string())
            }
            e => {
                tracing::error!(error = %e, "Request failed");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
