//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    AttachmentPayload, CreateSessionResponse, ErrorResponse, SettingsRequest, SettingsResponse,
    SuccessResponse, TurnRequest, TurnResponse,
};
use super::AppState;
use crate::companion::Personality;
use crate::runtime::{RuntimeError, SseEvent};
use crate::state_machine::{Attachment, Event};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

/// Largest accepted turn body; attachments arrive base64-encoded inside it
const MAX_TURN_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        // Chat turns
        .route(
            "/api/sessions/:id/turn",
            post(send_turn).layer(DefaultBodyLimit::max(MAX_TURN_BODY_BYTES)),
        )
        .route("/api/sessions/:id/settings", post(update_settings))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let (session_id, message) = state.runtime.create_session().await;
    Json(CreateSessionResponse {
        session_id,
        message,
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.runtime.snapshot(&id).await?;
    Ok(Json(snapshot))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.runtime.close_session(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Subscribe before the snapshot so nothing falls between them
    let broadcast_rx = state.runtime.subscribe(&id).await?;
    let snapshot = state.runtime.snapshot(&id).await?;

    let init_event = SseEvent::Init {
        session: serde_json::to_value(&snapshot).unwrap_or(Value::Null),
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

// ============================================================
// Chat Turns
// ============================================================

async fn send_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Result<Json<TurnResponse>, AppError> {
    let Json(req) = payload?;
    if req.attachments.len() > 1 {
        tracing::debug!(
            session_id = %id,
            count = req.attachments.len(),
            "Only the first attachment is used"
        );
    }
    let attachment = req
        .attachments
        .into_iter()
        .next()
        .map(decode_attachment)
        .transpose()?;

    let outcome = state
        .runtime
        .send_event(
            &id,
            Event::UserTurn {
                text: req.text,
                attachment,
            },
        )
        .await?;

    Ok(Json(TurnResponse {
        message: outcome.message,
        step: outcome.step,
    }))
}

fn decode_attachment(payload: AttachmentPayload) -> Result<Attachment, AppError> {
    let data = STANDARD.decode(payload.data.as_bytes()).map_err(|e| {
        AppError::BadRequest(format!("Attachment {} is not valid base64: {e}", payload.name))
    })?;
    Ok(Attachment {
        name: payload.name,
        media_type: payload.media_type,
        data,
    })
}

async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    let personality: Personality = req
        .companion_personality
        .parse()
        .map_err(|e: crate::companion::UnknownPersonality| AppError::BadRequest(e.to_string()))?;

    let outcome = state
        .runtime
        .send_event(
            &id,
            Event::SettingsUpdated {
                companion_name: req.companion_name,
                personality,
                active_service: req.active_service,
            },
        )
        .await?;

    Ok(Json(SettingsResponse {
        message: outcome.message,
    }))
}

async fn get_version() -> &'static str {
    concat!("mindmate ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!(
                "Request body exceeds {} MiB",
                MAX_TURN_BODY_BYTES / (1024 * 1024)
            ))
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    }
}

impl From<RuntimeError> for AppError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::SessionNotFound(_) => AppError::NotFound(err.to_string()),
            RuntimeError::SessionClosed(_) | RuntimeError::Rejected(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
