use std::sync::Arc;

use deckhand_core::Result;
use deckhand_providers::{AgentLoop, CancelToken, ToolExecutor, TurnRequest};
use deckhand_stream::{EventParser, StreamEvent};
use deckhand_tools::ToolRegistry;
use futures::StreamExt;
use tokio::sync::mpsc;

/// Drives turns against an agent loop and a fixed tool registry.
///
/// Each turn is strictly sequential: raw events are parsed in arrival
/// order and normalized events are forwarded in that same order. Tool
/// calls issued by the loop block the turn until they return.
pub struct TurnDriver {
    agent_loop: Arc<dyn AgentLoop>,
    tools: Arc<ToolRegistry>,
}

/// A running turn: the normalized event stream plus its cancel handle.
///
/// Dropping the receiver cancels the turn; the parser state is simply
/// discarded since it holds no external resources.
pub struct TurnHandle {
    pub events: mpsc::Receiver<StreamEvent>,
    cancel: CancelToken,
}

impl TurnHandle {
    /// Request cancellation of the in-flight turn. A tool call that has
    /// already started is not preempted; its own timeout is the bound.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl TurnDriver {
    pub fn new(agent_loop: Arc<dyn AgentLoop>, tools: Arc<ToolRegistry>) -> Self {
        Self { agent_loop, tools }
    }

    /// Names of the tools exposed to the loop.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.list()
    }

    /// Run one turn, returning the normalized event stream.
    ///
    /// A fresh parser is used per turn, so no tool-call state ever leaks
    /// across turns.
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnHandle> {
        let cancel = CancelToken::new();
        let executor: Arc<dyn ToolExecutor> = self.tools.clone();

        tracing::debug!(prompt_len = request.prompt.len(), model = %request.model.model_id, "starting turn");
        let mut raw = self
            .agent_loop
            .stream_turn(request, executor, cancel.clone())
            .await?;

        let (tx, rx) = mpsc::channel(64);
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            let mut parser = EventParser::new();
            parser.reset();

            while let Some(event) = raw.next().await {
                if task_cancel.is_cancelled() {
                    tracing::debug!("turn cancelled; discarding parser state");
                    break;
                }

                for normalized in parser.parse(event) {
                    if tx.send(normalized).await.is_err() {
                        // Receiver dropped; stop driving the loop.
                        task_cancel.cancel();
                        return;
                    }
                }
            }
        });

        Ok(TurnHandle { events: rx, cancel })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_providers::ScriptedLoop;
    use deckhand_stream::ToolUseInput;
    use deckhand_tools::ShellTool;

    fn driver_with_script(script: &str) -> TurnDriver {
        let agent_loop = Arc::new(ScriptedLoop::from_toml_str(script).unwrap());
        let mut tools = ToolRegistry::new();
        tools.register(ShellTool::new()).unwrap();
        TurnDriver::new(agent_loop, Arc::new(tools))
    }

    async fn collect(handle: &mut TurnHandle) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.events.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_full_turn_pipeline() {
        let script = r#"
[[turns]]
events = [
    { kind = "text", text = "Running a command. " },
    { kind = "tool_use", name = "shell", args = { command = "echo hello" }, chunks = 4 },
    { kind = "text", text = "All done." },
]
"#;
        let driver = driver_with_script(script);
        let mut handle = driver.run_turn(TurnRequest::new("make slides")).await.unwrap();
        let events = collect(&mut handle).await;

        assert_eq!(events[0], StreamEvent::Text { data: "Running a command. ".to_string() });
        assert!(matches!(
            &events[1],
            StreamEvent::CurrentToolUse { tool_name, tool_input: ToolUseInput::Pending } if tool_name == "shell"
        ));

        // The fragments assemble into valid JSON exactly once.
        let parsed: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::CurrentToolUse { tool_input: ToolUseInput::Parsed(_), .. }))
            .collect();
        assert_eq!(parsed.len(), 1);

        // The shell tool actually ran.
        assert!(events.iter().any(|e| matches!(
            e,
            StreamEvent::ToolResult { data } if data == "hello"
        )));

        assert_eq!(events.last(), Some(&StreamEvent::Text { data: "All done.".to_string() }));
    }

    #[tokio::test]
    async fn test_turns_are_isolated() {
        let script = r#"
[[turns]]
events = [{ kind = "tool_use", name = "shell", args = { command = "echo one" } }]

[[turns]]
events = [{ kind = "text", text = "second turn" }]
"#;
        let driver = driver_with_script(script);

        let mut first = driver.run_turn(TurnRequest::new("a")).await.unwrap();
        let first_events = collect(&mut first).await;
        assert!(first_events.iter().any(|e| matches!(e, StreamEvent::ToolResult { .. })));

        let mut second = driver.run_turn(TurnRequest::new("b")).await.unwrap();
        let second_events = collect(&mut second).await;
        assert_eq!(second_events, vec![StreamEvent::Text { data: "second turn".to_string() }]);
    }

    #[tokio::test]
    async fn test_unregistered_tool_surfaces_textual_error() {
        let script = r#"
[[turns]]
events = [{ kind = "tool_use", name = "teleport", args = {} }]
"#;
        let driver = driver_with_script(script);
        let mut handle = driver.run_turn(TurnRequest::new("go")).await.unwrap();
        let events = collect(&mut handle).await;

        let result = events.iter().find_map(|e| match e {
            StreamEvent::ToolResult { data } => Some(data.clone()),
            _ => None,
        });
        assert!(result.unwrap().contains("no tool named 'teleport'"));
    }

    #[tokio::test]
    async fn test_tool_names_exposed() {
        let driver = driver_with_script("[[turns]]\nevents = []\n");
        assert_eq!(driver.tool_names(), vec!["shell".to_string()]);
    }
}
