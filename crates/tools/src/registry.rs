use std::collections::HashMap;
use std::sync::Arc;

use deckhand_core::Result;
use deckhand_providers::ToolExecutor;
use serde_json::Value;

use crate::tool::{Tool, ToolSpec};

/// Registry holding all tools exposed to the agent for a session.
///
/// Populated once at startup, then shared read-only behind an `Arc`; the
/// turn model never issues two tool calls concurrently, so no interior
/// locking is needed.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Creates a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new tool.
    ///
    /// Returns an error if a tool with the same name already exists.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        let name = tool.name().to_string();

        if self.tools.contains_key(&name) {
            return Err(deckhand_core::Error::Validation(format!(
                "Tool '{}' already registered",
                name
            )));
        }

        self.order.push(name.clone());
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    /// Checks if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of all registered tools, in registration order
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// All tool specs, in registration order (for the agent-loop tool list)
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order.iter().filter_map(|name| self.tools.get(name)).map(|t| t.spec()).collect()
    }

    /// Number of registered tools
    pub fn count(&self) -> usize {
        self.tools.len()
    }
}

#[async_trait::async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, tool_use_id: &str, name: &str, arguments: &Value) -> String {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(%tool_use_id, %name, "model requested an unregistered tool");
            return format!(
                "Tool error: no tool named '{}' is registered. Available tools: {}",
                name,
                self.order.join(", ")
            );
        };

        tracing::debug!(%tool_use_id, %name, "executing tool");
        let result = tool.execute(arguments).await;
        if let Some(error) = &result.error {
            tracing::debug!(%tool_use_id, %name, %error, "tool returned an error result");
        }
        result.into_text()
    }

    fn tool_names(&self) -> Vec<String> {
        self.list()
    }
}
