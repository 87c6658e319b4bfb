//! Property-based tests for the turn loop
//!
//! These tests verify the loop's invariants across arbitrary model scripts:
//! - Every tool-use id is answered exactly once, in order, before the next call
//! - A turn with `n` tool rounds grows the transcript by `2n + 2`
//! - The stop decision never runs tools past the configured depth

use super::state::{after_response, TurnState};
use super::testing::{text_response, tool_use_response, MockLlmService, StubTool};
use super::{ChatError, TurnConfig, TurnResolver};
use crate::conversation::Conversation;
use crate::llm::{ContentBlock, LlmResponse, LlmService, MessageRole, StopReason, Usage};
use crate::tools::ToolRegistry;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Strategies
// ============================================================================

/// Number of tool-use blocks per round, one entry per round
fn arb_script() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(1usize..4, 0..5)
}

fn arb_stop_reason() -> impl Strategy<Value = StopReason> {
    prop_oneof![
        Just(StopReason::EndTurn),
        Just(StopReason::ToolUse),
        Just(StopReason::MaxTokens),
        Just(StopReason::StopSequence),
    ]
}

fn arb_response() -> impl Strategy<Value = LlmResponse> {
    (arb_stop_reason(), 0usize..3, proptest::option::of("[a-zA-Z ]{1,20}")).prop_map(
        |(stop, tool_blocks, text)| {
            let mut content: Vec<ContentBlock> = text.into_iter().map(ContentBlock::text).collect();
            for i in 0..tool_blocks {
                content.push(ContentBlock::tool_use(
                    format!("t{i}"),
                    "get_weather",
                    json!({"city": "Tokyo"}),
                ));
            }
            LlmResponse {
                content,
                stop_reason: Some(stop),
                usage: Usage::default(),
            }
        },
    )
}

// ============================================================================
// Helpers
// ============================================================================

fn run_script(script: &[usize]) -> (Conversation, Arc<MockLlmService>, Arc<StubTool>) {
    let llm = Arc::new(MockLlmService::new());
    for (round, count) in script.iter().enumerate() {
        let ids: Vec<String> = (0..*count).map(|i| format!("r{round}-t{i}")).collect();
        let calls: Vec<(&str, &str, serde_json::Value)> = ids
            .iter()
            .map(|id| (id.as_str(), "get_weather", json!({"city": id})))
            .collect();
        llm.queue_response(tool_use_response(&calls));
    }
    llm.queue_response(text_response("done"));

    let stub = Arc::new(StubTool::new("get_weather", json!({"temperature": 20})));
    let mut registry = ToolRegistry::new();
    registry.register(stub.clone()).unwrap();

    let service: Arc<dyn LlmService> = llm.clone();
    let resolver = TurnResolver::new(Some(service), Arc::new(registry), TurnConfig::default());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut conv = Conversation::new();
    runtime
        .block_on(resolver.resolve(&mut conv, "What's the weather?"))
        .unwrap();

    (conv, llm, stub)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_tool_uses_always_answered_before_next_call(script in arb_script()) {
        let (_, llm, _) = run_script(&script);
        let requests = llm.recorded_requests();
        prop_assert_eq!(requests.len(), script.len() + 1);

        for request in &requests {
            let messages = &request.messages;
            // Last message sent is never an unanswered tool request
            let last = messages.last().unwrap();
            prop_assert!(last.role != MessageRole::Assistant);

            for (i, msg) in messages.iter().enumerate() {
                let ids: Vec<&str> = msg.content.iter().filter_map(|b| match b {
                    ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                    _ => None,
                }).collect();
                if ids.is_empty() {
                    continue;
                }
                let answered: Vec<&str> = messages[i + 1].content.iter().filter_map(|b| match b {
                    ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                    _ => None,
                }).collect();
                prop_assert_eq!(ids, answered);
            }
        }
    }

    #[test]
    fn prop_transcript_growth_matches_rounds(script in arb_script()) {
        let (conv, _, stub) = run_script(&script);
        prop_assert_eq!(conv.len(), 2 * script.len() + 2);
        prop_assert_eq!(stub.recorded_inputs().len(), script.iter().sum::<usize>());
        prop_assert_eq!(conv.snapshot()[0].role, MessageRole::User);
        prop_assert_eq!(conv.snapshot().last().unwrap().role, MessageRole::Assistant);
    }

    #[test]
    fn prop_stop_decision(round in 0u32..10, max in 0u32..10, response in arb_response()) {
        let requests_tools = response.requests_tools();
        let text = response.text();
        match after_response(round, max, response) {
            TurnState::Done { reply } => {
                prop_assert!(!requests_tools);
                prop_assert_eq!(reply, text);
            }
            TurnState::HandlingTools { round: r, .. } => {
                prop_assert!(requests_tools);
                prop_assert!(r < max);
                prop_assert_eq!(r, round);
            }
            TurnState::Failed(ChatError::DepthExceeded { rounds }) => {
                prop_assert!(requests_tools);
                prop_assert!(round >= max);
                prop_assert_eq!(rounds, round);
            }
            other => prop_assert!(false, "unexpected state {:?}", other),
        }
    }
}
