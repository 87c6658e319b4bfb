//! Tools the model can call during a turn
//!
//! Tools are stateless singletons. Handlers never fail: recoverable problems
//! come back as an `{"error": ...}` payload the model can talk about.

mod weather;

pub use weather::{WeatherConfig, WeatherTool};

use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// Build the `{"error": message}` payload tools return on failure
pub fn error_payload(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// Whether a tool result is an error payload
pub fn is_error_payload(value: &Value) -> bool {
    value.get("error").is_some_and(Value::is_string)
}

/// Trait for tools that can be executed on behalf of the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for LLM
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool; returns a JSON result or an error payload
    async fn run(&self, input: Value) -> Value;
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("tool already registered: {0}")]
pub struct DuplicateTool(pub String);

/// Collection of tools declared to the model
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard registry for the chat service
    pub fn standard(weather: WeatherConfig) -> Result<Self, DuplicateTool> {
        let mut registry = Self::new();
        registry.register(Arc::new(WeatherTool::new(weather)))?;
        Ok(registry)
    }

    /// Add a tool; names must be unique
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), DuplicateTool> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Get all tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name
    pub async fn invoke(&self, name: &str, input: Value) -> Value {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.run(input).await,
            None => {
                tracing::warn!(tool = %name, "Model requested unknown tool");
                error_payload(format!("unknown tool: {name}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> String {
            "Echo the input back".to_string()
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn run(&self, input: Value) -> Value {
            input
        }
    }

    #[test]
    fn test_standard_registry_declares_weather() {
        let registry = ToolRegistry::standard(WeatherConfig::default()).unwrap();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "get_weather");
        assert_eq!(defs[0].input_schema["required"], json!(["city"]));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let err = registry.register(Arc::new(EchoTool)).unwrap_err();
        assert_eq!(err, DuplicateTool("echo".to_string()));
        assert_eq!(registry.definitions().len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_dispatches_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool)).unwrap();
        let out = registry.invoke("echo", json!({"x": 1})).await;
        assert_eq!(out, json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_error_payload() {
        let registry = ToolRegistry::new();
        let out = registry.invoke("teleport", json!({})).await;
        assert_eq!(out, json!({"error": "unknown tool: teleport"}));
        assert!(is_error_payload(&out));
    }

    #[test]
    fn test_error_payload_detection() {
        assert!(is_error_payload(&error_payload("boom")));
        assert!(!is_error_payload(&json!({"city": "Tokyo"})));
        assert!(!is_error_payload(&json!("error")));
    }
}
