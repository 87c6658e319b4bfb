//! Errors surfaced to the caller of a turn

use crate::llm::LlmError;
use thiserror::Error;

/// Loop-level failures. Tool failures never show up here; they are handed
/// back to the model as `{"error": ...}` results.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Validation(String),
    #[error("LLM API error: {0}")]
    Upstream(LlmError),
    #[error("model kept requesting tools after {rounds} rounds")]
    DepthExceeded { rounds: u32 },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        if err.is_configuration() {
            ChatError::Configuration(format!("Anthropic rejected the API key ({err})"))
        } else {
            ChatError::Upstream(err)
        }
    }
}
