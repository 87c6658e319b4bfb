//! Turn states and the pure stop decision

use super::ChatError;
use crate::llm::LlmResponse;

/// Where a turn currently stands
#[derive(Debug, Clone)]
pub enum TurnState {
    /// Waiting on the model; `round` counts completed tool rounds
    AwaitingModel { round: u32 },
    /// The model asked for tools in `response`
    HandlingTools { round: u32, response: LlmResponse },
    /// The model answered in plain text
    Done { reply: String },
    Failed(ChatError),
}

impl TurnState {
    pub fn start() -> Self {
        TurnState::AwaitingModel { round: 0 }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            TurnState::AwaitingModel { .. } => "awaiting_model",
            TurnState::HandlingTools { .. } => "handling_tools",
            TurnState::Done { .. } => "done",
            TurnState::Failed(_) => "failed",
        }
    }
}

/// Decide what follows a model response.
///
/// A response that stops for `tool_use` and carries at least one tool-use
/// block goes to tool handling, unless `max_tool_rounds` rounds have already
/// run. Anything else finishes the turn with the response's text.
pub fn after_response(round: u32, max_tool_rounds: u32, response: LlmResponse) -> TurnState {
    if !response.requests_tools() {
        return TurnState::Done {
            reply: response.text(),
        };
    }

    if round >= max_tool_rounds {
        return TurnState::Failed(ChatError::DepthExceeded { rounds: round });
    }

    TurnState::HandlingTools { round, response }
}
