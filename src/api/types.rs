//! API request and response types

use crate::llm::LlmMessage;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Reply to a chat message
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// ISO-8601 local time the reply was produced
    pub timestamp: String,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Transcript of a session
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<LlmMessage>,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
