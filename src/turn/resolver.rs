//! Drives a single user turn to completion

use super::state::{after_response, TurnState};
use super::ChatError;
use crate::conversation::Conversation;
use crate::llm::{ContentBlock, LlmMessage, LlmRequest, LlmResponse, LlmService, ToolDefinition};
use crate::tools::{is_error_payload, ToolRegistry};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;

/// Limits applied to every turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnConfig {
    pub max_tokens: u32,
    /// Tool rounds allowed before the turn fails
    pub max_tool_rounds: u32,
    /// Transcript length kept after each completed exchange
    pub history_limit: usize,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            max_tool_rounds: 8,
            history_limit: 20,
        }
    }
}

/// Final answer of a turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub timestamp: DateTime<Local>,
}

/// Resolves user messages against the model and the tool registry
pub struct TurnResolver {
    llm: Option<Arc<dyn LlmService>>,
    tools: Arc<ToolRegistry>,
    definitions: Vec<ToolDefinition>,
    config: TurnConfig,
}

impl TurnResolver {
    pub fn new(llm: Option<Arc<dyn LlmService>>, tools: Arc<ToolRegistry>, config: TurnConfig) -> Self {
        let definitions = tools.definitions();
        Self {
            llm,
            tools,
            definitions,
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Check a turn's preconditions without touching any conversation
    pub fn validate(&self, text: &str) -> Result<(), ChatError> {
        self.preconditions(text).map(|_| ())
    }

    fn preconditions<'a>(&self, text: &'a str) -> Result<(&Arc<dyn LlmService>, &'a str), ChatError> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            ChatError::Configuration("Anthropic API key is not configured (set ANTHROPIC_API_KEY)".to_string())
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::Validation("message must not be empty".to_string()));
        }
        Ok((llm, text))
    }

    /// Run one user turn against `conversation`.
    ///
    /// Nothing is touched when a precondition fails. On a later failure the
    /// messages already appended stay in place; truncation only happens once
    /// the turn completes.
    pub async fn resolve(&self, conversation: &mut Conversation, text: &str) -> Result<ChatReply, ChatError> {
        let (llm, text) = self.preconditions(text)?;

        conversation.append(LlmMessage::user(text));

        // TODO: accept a cancellation token and check it between tool rounds
        let mut state = TurnState::start();
        loop {
            tracing::debug!(state = state.name(), messages = conversation.len(), "Turn step");
            state = match state {
                TurnState::AwaitingModel { round } => {
                    let request = LlmRequest {
                        messages: conversation.replay_window().to_vec(),
                        tools: self.definitions.clone(),
                        max_tokens: Some(self.config.max_tokens),
                    };
                    match llm.complete(&request).await {
                        Ok(response) => after_response(round, self.config.max_tool_rounds, response),
                        Err(e) => TurnState::Failed(e.into()),
                    }
                }
                TurnState::HandlingTools { round, response } => match self.run_tools(conversation, response).await {
                    Ok(()) => TurnState::AwaitingModel { round: round + 1 },
                    Err(e) => TurnState::Failed(e),
                },
                TurnState::Done { reply } => {
                    // The API rejects empty text blocks on replay
                    if reply.is_empty() {
                        tracing::warn!(messages = conversation.len(), "Model returned no text");
                    } else {
                        conversation.append(LlmMessage::assistant_text(reply.clone()));
                    }
                    conversation.truncate_keep_last(self.config.history_limit);
                    return Ok(ChatReply {
                        reply,
                        timestamp: Local::now(),
                    });
                }
                TurnState::Failed(error) => {
                    tracing::warn!(error = %error, messages = conversation.len(), "Turn failed");
                    return Err(error);
                }
            };
        }
    }

    /// Execute every tool-use block in emitted order, then record the
    /// assistant message and the correlated results.
    async fn run_tools(&self, conversation: &mut Conversation, response: LlmResponse) -> Result<(), ChatError> {
        let mut results = Vec::new();
        for (id, name, input) in response.tool_uses() {
            tracing::info!(tool = %name, tool_use_id = %id, "Executing tool");
            let output = self.tools.invoke(name, input.clone()).await;
            let is_error = is_error_payload(&output);
            let content = serde_json::to_string(&output)
                .map_err(|e| ChatError::Unexpected(format!("failed to serialize tool result: {e}")))?;
            results.push(ContentBlock::tool_result(id, content, is_error));
        }

        conversation.append(LlmMessage::assistant(response.content));
        conversation.append(LlmMessage::tool_results(results));
        Ok(())
    }
}
