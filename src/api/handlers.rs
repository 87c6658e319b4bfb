//! HTTP request handlers

use super::types::{
    ChatRequest, ChatResponse, CreateSessionResponse, ErrorResponse, MessagesResponse, SuccessResponse,
};
use super::AppState;
use crate::turn::ChatError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(delete_session))
        // Conversation
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/messages", get(get_messages))
        .route("/api/sessions/:id/clear", post(clear_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session_id = uuid::Uuid::new_v4().to_string();
    state.sessions.session(&session_id).await;
    let sessions = state.sessions.len().await;
    tracing::info!(session_id = %session_id, sessions, "Session created");
    Json(CreateSessionResponse { session_id })
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Json<SuccessResponse> {
    let existed = state.sessions.remove(&id).await;
    tracing::info!(session_id = %id, existed, "Session deleted");
    Json(SuccessResponse { success: true })
}

// ============================================================
// Conversation
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    // Rejected requests must not allocate a session
    state.resolver.validate(&req.message)?;
    let session = state.sessions.session(&id).await;
    // Held for the whole turn so a session's turns never interleave
    let mut conversation = session.lock().await;

    let reply = state.resolver.resolve(&mut conversation, &req.message).await?;

    tracing::info!(session_id = %id, messages = conversation.len(), "Chat turn completed");
    Ok(Json(ChatResponse {
        response: reply.reply,
        timestamp: reply.timestamp.to_rfc3339(),
    }))
}

async fn get_messages(State(state): State<AppState>, Path(id): Path<String>) -> Json<MessagesResponse> {
    let Some(session) = state.sessions.get(&id).await else {
        return Json(MessagesResponse { messages: Vec::new() });
    };
    let conversation = session.lock().await;
    Json(MessagesResponse {
        messages: conversation.snapshot().to_vec(),
    })
}

async fn clear_session(State(state): State<AppState>, Path(id): Path<String>) -> Json<SuccessResponse> {
    if let Some(session) = state.sessions.get(&id).await {
        let mut conversation = session.lock().await;
        if !conversation.is_empty() {
            tracing::info!(session_id = %id, cleared = conversation.len(), "Cleared conversation");
        }
        conversation.clear();
    }
    Json(SuccessResponse { success: true })
}

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    BadGateway(String),
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(_) => AppError::BadRequest(err.to_string()),
            ChatError::Upstream(_) => AppError::BadGateway(err.to_string()),
            ChatError::Configuration(_) | ChatError::DepthExceeded { .. } | ChatError::Unexpected(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
