//! The contract between the orchestrator and the external agent loop.
//!
//! A turn is one full exchange: the loop receives a prompt plus the tool
//! set, and produces an ordered asynchronous sequence of [RawEvent]s. Tool
//! invocations selected by the model are dispatched back through the
//! [ToolExecutor] handle and must return a single text result before the
//! loop resumes.

use crate::events::RawEvent;
use deckhand_core::Result;
use deckhand_core::config::DEFAULT_MODEL_ID;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;

/// Boxed raw-event stream produced by an agent loop for one turn.
pub type RawEventStream = Pin<Box<dyn Stream<Item = RawEvent> + Send>>;

/// Model selection carried in the turn payload.
///
/// Only `model_id` is recognized; the payload may carry other fields and
/// they are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_id", alias = "modelId")]
    pub model_id: String,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { model_id: default_model_id() }
    }
}

/// Input for one turn: a prompt plus optional model configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub prompt: String,

    #[serde(default)]
    pub model: ModelConfig,
}

impl TurnRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), model: ModelConfig::default() }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model.model_id = model_id.into();
        self
    }
}

/// Dispatch handle the orchestrator hands to the loop.
///
/// Implementations execute one tool to completion and return its textual
/// result; failures are encoded in the result text, never raised.
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute the named tool with the given arguments.
    async fn execute(&self, tool_use_id: &str, name: &str, arguments: &serde_json::Value) -> String;

    /// Names of the tools available to the model.
    fn tool_names(&self) -> Vec<String>;
}

/// The external agent loop, treated as a black box.
#[async_trait::async_trait]
pub trait AgentLoop: Send + Sync {
    /// Drive one turn, producing the ordered raw event sequence.
    ///
    /// The stream terminates when the turn is complete; tool calls are
    /// routed through `tools` and block the loop until they return.
    async fn stream_turn(
        &self, request: TurnRequest, tools: Arc<dyn ToolExecutor>, cancel: CancelToken,
    ) -> Result<RawEventStream>;
}

/// Token for cancelling an in-flight turn.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<std::sync::atomic::AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self { cancelled: Arc::new(std::sync::atomic::AtomicBool::new(false)) }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_request_defaults() {
        let request = TurnRequest::new("make three slides");
        assert_eq!(request.prompt, "make three slides");
        assert_eq!(request.model.model_id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn test_turn_request_model_override() {
        let request = TurnRequest::new("hi").with_model_id("anthropic.claude-3-haiku-20240307-v1:0");
        assert_eq!(request.model.model_id, "anthropic.claude-3-haiku-20240307-v1:0");
    }

    #[test]
    fn test_payload_model_id_alias() {
        let request: TurnRequest =
            serde_json::from_str(r#"{"prompt": "p", "model": {"modelId": "custom-model"}}"#).unwrap();
        assert_eq!(request.model.model_id, "custom-model");
    }

    #[test]
    fn test_payload_unknown_fields_ignored() {
        let request: TurnRequest = serde_json::from_str(
            r#"{"prompt": "p", "model": {"modelId": "m", "temperature": 0.7}, "session": "abc"}"#,
        )
        .unwrap();
        assert_eq!(request.prompt, "p");
        assert_eq!(request.model.model_id, "m");
    }

    #[test]
    fn test_payload_missing_model_uses_default() {
        let request: TurnRequest = serde_json::from_str(r#"{"prompt": "p"}"#).unwrap();
        assert_eq!(request.model.model_id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn test_cancel_token() {
        let cancel = CancelToken::new();
        assert!(!cancel.is_cancelled());
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }
}
