//! Mock implementations for testing
//!
//! These mocks let the turn loop run without network access.

use crate::llm::{ContentBlock, LlmError, LlmRequest, LlmResponse, LlmService, StopReason, Usage};
use crate::tools::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock LLM
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// Plain text answer ending the turn
pub fn text_response(text: &str) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: Some(StopReason::EndTurn),
        usage: Usage::default(),
    }
}

/// Response asking for one or more tools, in the given order
pub fn tool_use_response(calls: &[(&str, &str, Value)]) -> LlmResponse {
    LlmResponse {
        content: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::tool_use(*id, *name, input.clone()))
            .collect(),
        stop_reason: Some(StopReason::ToolUse),
        usage: Usage::default(),
    }
}

// ============================================================================
// Stub tool
// ============================================================================

/// Tool returning a fixed output and recording its inputs
pub struct StubTool {
    name: String,
    output: Value,
    inputs: Mutex<Vec<Value>>,
}

impl StubTool {
    pub fn new(name: impl Into<String>, output: Value) -> Self {
        Self {
            name: name.into(),
            output,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded_inputs(&self) -> Vec<Value> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("Stub {}", self.name)
    }

    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn run(&self, input: Value) -> Value {
        self.inputs.lock().unwrap().push(input);
        self.output.clone()
    }
}
