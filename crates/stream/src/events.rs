//! Normalized events exposed to renderers.

use serde::{Deserialize, Serialize};

/// Best-effort view of a tool invocation's streamed arguments.
///
/// Streaming argument JSON is usually invalid mid-stream, so the input is
/// carried as an explicit three-state value instead of an error path:
/// announced with no arguments yet, fully parsed, or the raw buffer when
/// the fragments never assembled into valid JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ToolUseInput {
    /// The tool was announced; no argument fragments have parsed yet
    Pending,
    /// The accumulated fragments parsed as a complete JSON value
    Parsed(serde_json::Value),
    /// The raw buffer, surfaced when the fragments never parsed
    Partial(String),
}

impl ToolUseInput {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ToolUseInput::Parsed(_))
    }

    /// The parsed value, if this input reached that state.
    pub fn as_parsed(&self) -> Option<&serde_json::Value> {
        match self {
            ToolUseInput::Parsed(value) => Some(value),
            _ => None,
        }
    }
}

/// The five stable event variants renderers consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Assistant text fragment, forwarded verbatim
    Text { data: String },

    /// Extended-thinking fragment, forwarded verbatim
    Reasoning { data: String },

    /// The in-flight tool invocation and the current view of its input
    CurrentToolUse {
        tool_name: String,
        tool_input: ToolUseInput,
    },

    /// Incremental payload emitted by a running tool, passed through
    ToolStream { data: serde_json::Value },

    /// Final textual output of a tool invocation
    ToolResult { data: String },
}
