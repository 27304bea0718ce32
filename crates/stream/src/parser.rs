//! Per-turn reduction of raw agent-loop events into normalized events.

use crate::events::{StreamEvent, ToolUseInput};
use deckhand_providers::RawEvent;

/// Stateful reducer for one turn of raw events.
///
/// At most one tool invocation accumulates argument fragments at a time;
/// the loop never interleaves two unfinished invocations. Text and
/// reasoning deltas are forwarded immediately with no buffering, so
/// normalized events leave in the exact order their raw triggers arrived.
///
/// Argument JSON streams incrementally and is invalid for most prefixes.
/// The policy here: a delta whose accumulated buffer does not yet parse
/// emits nothing (partial JSON is never rendered mid-stream); if the
/// buffer still has not parsed when the tool result arrives, the raw
/// buffer is surfaced once as [ToolUseInput::Partial] so the arguments
/// are not silently lost.
///
/// Call [EventParser::reset] before each new user turn.
#[derive(Debug, Default)]
pub struct EventParser {
    current_tool_use_id: Option<String>,
    current_tool_name: Option<String>,
    input_buffer: String,
    input_parsed: bool,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all per-turn state. Must be called between turns.
    pub fn reset(&mut self) {
        self.current_tool_use_id = None;
        self.current_tool_name = None;
        self.input_buffer.clear();
        self.input_parsed = false;
    }

    /// Reduce one raw event into zero or more normalized events.
    ///
    /// Total over every [RawEvent] variant; never panics on malformed
    /// argument fragments or out-of-order tool events.
    pub fn parse(&mut self, event: RawEvent) -> Vec<StreamEvent> {
        match event {
            RawEvent::TextDelta { text } => vec![StreamEvent::Text { data: text }],

            RawEvent::ReasoningDelta { text } => vec![StreamEvent::Reasoning { data: text }],

            RawEvent::ToolUseStart { tool_use_id, name } => {
                if self.current_tool_use_id.is_some() {
                    tracing::debug!(
                        previous = ?self.current_tool_use_id,
                        incoming = %tool_use_id,
                        "tool use started while another was in flight; dropping stale state"
                    );
                }
                self.current_tool_use_id = Some(tool_use_id);
                self.current_tool_name = Some(name.clone());
                self.input_buffer.clear();
                self.input_parsed = false;

                vec![StreamEvent::CurrentToolUse { tool_name: name, tool_input: ToolUseInput::Pending }]
            }

            RawEvent::ToolInputDelta { tool_use_id, fragment } => {
                let Some(current_id) = self.current_tool_use_id.as_deref() else {
                    tracing::debug!(%tool_use_id, "input delta with no tool use in flight; dropped");
                    return Vec::new();
                };
                if current_id != tool_use_id {
                    tracing::debug!(%tool_use_id, %current_id, "input delta for a different tool use; dropped");
                    return Vec::new();
                }

                self.input_buffer.push_str(&fragment);

                match serde_json::from_str::<serde_json::Value>(&self.input_buffer) {
                    Ok(value) => {
                        self.input_parsed = true;
                        let tool_name = self.current_tool_name.clone().unwrap_or_default();
                        vec![StreamEvent::CurrentToolUse {
                            tool_name,
                            tool_input: ToolUseInput::Parsed(value),
                        }]
                    }
                    // Incomplete JSON mid-stream is the common case, not an error.
                    Err(_) => Vec::new(),
                }
            }

            RawEvent::ToolStream { payload, .. } => vec![StreamEvent::ToolStream { data: payload }],

            RawEvent::ToolResult { tool_use_id, content } => {
                let mut out = Vec::with_capacity(2);

                let matches_current = self.current_tool_use_id.as_deref() == Some(tool_use_id.as_str());
                if matches_current && !self.input_parsed && !self.input_buffer.trim().is_empty() {
                    let tool_name = self.current_tool_name.clone().unwrap_or_default();
                    out.push(StreamEvent::CurrentToolUse {
                        tool_name,
                        tool_input: ToolUseInput::Partial(std::mem::take(&mut self.input_buffer)),
                    });
                }

                // Unmatched results are still forwarded; renderers must not
                // assume strict pairing.
                out.push(StreamEvent::ToolResult { data: content });

                self.current_tool_use_id = None;
                self.current_tool_name = None;
                self.input_buffer.clear();
                self.input_parsed = false;

                out
            }

            RawEvent::TurnStart | RawEvent::TurnEnd => Vec::new(),
        }
    }
}
