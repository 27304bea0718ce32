//! Deterministic, TOML-scripted agent loop for tests and offline runs.
//!
//! A script declares the event feed for each turn; tool invocations are
//! dispatched through the real [ToolExecutor] so the full pipeline (input
//! streaming, execution, result feed-back) is exercised without a model.
//!
//! Script format:
//!
//! ```toml
//! [[turns]]
//! events = [
//!     { kind = "text", text = "Building the deck now." },
//!     { kind = "tool_use", name = "shell", args = { command = "echo hi" }, chunks = 3 },
//!     { kind = "text", text = "Done." },
//! ]
//! ```

use crate::events::RawEvent;
use crate::turn::{AgentLoop, CancelToken, RawEventStream, ToolExecutor, TurnRequest};
use deckhand_core::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One declared event in a scripted turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedEvent {
    /// Assistant text, emitted as a single delta
    Text { text: String },

    /// Extended-thinking text, emitted as a single delta
    Reasoning { text: String },

    /// A tool invocation: announced, argument-streamed in `chunks`
    /// fragments, executed through the executor, result fed back
    ToolUse {
        name: String,
        #[serde(default = "empty_args")]
        args: serde_json::Value,
        #[serde(default = "default_chunks")]
        chunks: usize,
    },
}

fn empty_args() -> serde_json::Value {
    serde_json::json!({})
}

fn default_chunks() -> usize {
    1
}

/// The events of one scripted turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptedTurn {
    pub events: Vec<ScriptedEvent>,
}

#[derive(Debug, Deserialize)]
struct Script {
    turns: Vec<ScriptedTurn>,
}

/// Agent loop that replays a declared script, one turn per call.
pub struct ScriptedLoop {
    turns: Vec<ScriptedTurn>,
    current: AtomicUsize,
}

impl ScriptedLoop {
    /// Parse a script from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let script: Script = toml::from_str(toml_str)
            .map_err(|e| deckhand_core::Error::Loop(format!("invalid turn script: {}", e)))?;
        Ok(Self { turns: script.turns, current: AtomicUsize::new(0) })
    }

    /// Parse a script from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build a loop directly from turns (test convenience).
    pub fn from_turns(turns: Vec<ScriptedTurn>) -> Self {
        Self { turns, current: AtomicUsize::new(0) }
    }

    fn next_turn(&self) -> ScriptedTurn {
        let index = self.current.fetch_add(1, Ordering::SeqCst);
        match self.turns.get(index) {
            Some(turn) => turn.clone(),
            None => {
                tracing::warn!(index, total = self.turns.len(), "scripted loop exhausted");
                ScriptedTurn::default()
            }
        }
    }
}

/// Split serialized arguments into `chunks` fragments on char boundaries.
fn split_fragments(serialized: &str, chunks: usize) -> Vec<String> {
    let chunks = chunks.max(1);
    let chars: Vec<char> = serialized.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }

    let per_chunk = chars.len().div_ceil(chunks);
    chars
        .chunks(per_chunk)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

#[async_trait::async_trait]
impl AgentLoop for ScriptedLoop {
    async fn stream_turn(
        &self, _request: TurnRequest, tools: Arc<dyn ToolExecutor>, cancel: CancelToken,
    ) -> Result<RawEventStream> {
        let turn = self.next_turn();

        let stream = async_stream::stream! {
            yield RawEvent::TurnStart;

            for (index, event) in turn.events.into_iter().enumerate() {
                if cancel.is_cancelled() {
                    break;
                }

                match event {
                    ScriptedEvent::Text { text } => {
                        yield RawEvent::TextDelta { text };
                    }
                    ScriptedEvent::Reasoning { text } => {
                        yield RawEvent::ReasoningDelta { text };
                    }
                    ScriptedEvent::ToolUse { name, args, chunks } => {
                        let tool_use_id = format!("scripted-{}", index);
                        yield RawEvent::ToolUseStart {
                            tool_use_id: tool_use_id.clone(),
                            name: name.clone(),
                        };

                        let serialized = args.to_string();
                        for fragment in split_fragments(&serialized, chunks) {
                            yield RawEvent::ToolInputDelta {
                                tool_use_id: tool_use_id.clone(),
                                fragment,
                            };
                        }

                        let content = tools.execute(&tool_use_id, &name, &args).await;
                        yield RawEvent::ToolResult { tool_use_id, content };
                    }
                }
            }

            yield RawEvent::TurnEnd;
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    struct EchoExecutor;

    #[async_trait::async_trait]
    impl ToolExecutor for EchoExecutor {
        async fn execute(&self, _tool_use_id: &str, name: &str, arguments: &serde_json::Value) -> String {
            format!("{}:{}", name, arguments)
        }

        fn tool_names(&self) -> Vec<String> {
            vec!["echo".to_string()]
        }
    }

    const SCRIPT: &str = r#"
[[turns]]
events = [
    { kind = "text", text = "Hello" },
    { kind = "tool_use", name = "echo", args = { value = 1 }, chunks = 2 },
    { kind = "text", text = "Bye" },
]

[[turns]]
events = [{ kind = "reasoning", text = "thinking" }]
"#;

    #[test]
    fn test_script_parsing() {
        let scripted = ScriptedLoop::from_toml_str(SCRIPT).unwrap();
        assert_eq!(scripted.turns.len(), 2);
        assert_eq!(scripted.turns[0].events.len(), 3);
    }

    #[test]
    fn test_invalid_script_rejected() {
        let result = ScriptedLoop::from_toml_str("turns = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_split_fragments_rejoins() {
        let serialized = r#"{"command":"echo hello"}"#;
        let fragments = split_fragments(serialized, 3);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments.concat(), serialized);
    }

    #[test]
    fn test_split_fragments_single_chunk() {
        let fragments = split_fragments("{}", 1);
        assert_eq!(fragments, vec!["{}".to_string()]);
    }

    #[test]
    fn test_split_fragments_more_chunks_than_chars() {
        let fragments = split_fragments("{}", 10);
        assert_eq!(fragments.concat(), "{}");
    }

    #[tokio::test]
    async fn test_scripted_turn_event_order() {
        let scripted = ScriptedLoop::from_toml_str(SCRIPT).unwrap();
        let stream = scripted
            .stream_turn(TurnRequest::new("p"), Arc::new(EchoExecutor), CancelToken::new())
            .await
            .unwrap();
        let events: Vec<RawEvent> = stream.collect().await;

        assert!(matches!(events.first(), Some(RawEvent::TurnStart)));
        assert!(matches!(events.last(), Some(RawEvent::TurnEnd)));

        let fragments: String = events
            .iter()
            .filter_map(|e| match e {
                RawEvent::ToolInputDelta { fragment, .. } => Some(fragment.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(fragments, r#"{"value":1}"#);

        let result = events.iter().find_map(|e| match e {
            RawEvent::ToolResult { content, .. } => Some(content.clone()),
            _ => None,
        });
        assert_eq!(result.as_deref(), Some(r#"echo:{"value":1}"#));
    }

    #[tokio::test]
    async fn test_exhausted_script_yields_empty_turn() {
        let scripted = ScriptedLoop::from_turns(vec![]);
        let stream = scripted
            .stream_turn(TurnRequest::new("p"), Arc::new(EchoExecutor), CancelToken::new())
            .await
            .unwrap();
        let events: Vec<RawEvent> = stream.collect().await;
        assert_eq!(events, vec![RawEvent::TurnStart, RawEvent::TurnEnd]);
    }
}
