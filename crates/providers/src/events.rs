//! Raw events emitted by the agent loop for one turn.
//!
//! The loop is a black box; these tagged variants are its entire output
//! surface. They are turn-scoped and carry no cross-turn identity.

use serde::{Deserialize, Serialize};

/// One unit of the agent loop's ordered event feed.
///
/// Discriminated by the embedded `kind` tag so scripted fixtures and wire
/// captures deserialize without a type hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawEvent {
    /// Fragment of assistant text
    TextDelta { text: String },

    /// Fragment of extended-thinking output
    ReasoningDelta { text: String },

    /// The model selected a tool; arguments follow as input deltas
    ToolUseStart { tool_use_id: String, name: String },

    /// Fragment of the serialized tool arguments
    ToolInputDelta { tool_use_id: String, fragment: String },

    /// Incremental, non-final payload emitted while a tool runs
    ToolStream {
        tool_use_id: String,
        payload: serde_json::Value,
    },

    /// Final textual output of a completed tool invocation
    ToolResult { tool_use_id: String, content: String },

    /// Turn lifecycle marker, never surfaced to renderers
    TurnStart,

    /// Turn lifecycle marker, never surfaced to renderers
    TurnEnd,
}

impl RawEvent {
    /// Tool-call id carried by this event, if any.
    pub fn tool_use_id(&self) -> Option<&str> {
        match self {
            RawEvent::ToolUseStart { tool_use_id, .. }
            | RawEvent::ToolInputDelta { tool_use_id, .. }
            | RawEvent::ToolStream { tool_use_id, .. }
            | RawEvent::ToolResult { tool_use_id, .. } => Some(tool_use_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_event_serde_tags() {
        let event = RawEvent::TextDelta { text: "hello".to_string() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""kind":"text_delta""#));

        let back: RawEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_tool_use_start_deserializes() {
        let json = r#"{"kind":"tool_use_start","tool_use_id":"t1","name":"shell"}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            RawEvent::ToolUseStart { tool_use_id: "t1".to_string(), name: "shell".to_string() }
        );
    }

    #[test]
    fn test_tool_use_id_accessor() {
        let start = RawEvent::ToolUseStart { tool_use_id: "t1".to_string(), name: "shell".to_string() };
        assert_eq!(start.tool_use_id(), Some("t1"));

        let text = RawEvent::TextDelta { text: "x".to_string() };
        assert_eq!(text.tool_use_id(), None);

        let marker = RawEvent::TurnEnd;
        assert_eq!(marker.tool_use_id(), None);
    }

    #[test]
    fn test_lifecycle_markers_roundtrip() {
        for event in [RawEvent::TurnStart, RawEvent::TurnEnd] {
            let json = serde_json::to_string(&event).unwrap();
            let back: RawEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }
}
