use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The core trait every tool adapter implements.
///
/// `execute` is async because the storage and search adapters are network
/// calls, but the turn model stays synchronous: the orchestrator awaits
/// each invocation to completion before the loop resumes. Failures are
/// encoded in the returned [ToolResult]; this method never errors.
#[async_trait::async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// Unique name of this tool
    fn name(&self) -> &str;

    /// What this tool does, shown to the model
    fn description(&self) -> &str;

    /// Parameter schema for this tool
    fn parameters(&self) -> ToolParameter;

    /// Execute the tool with the given arguments
    async fn execute(&self, arguments: &Value) -> ToolResult;

    /// Full [ToolSpec] for this tool (for the agent-loop tool list)
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name(), self.description(), self.parameters())
    }
}

/// Tool parameter type specification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolParameter {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Object {
        properties: Vec<(String, ToolParameter)>,
        #[serde(skip_serializing_if = "Option::is_none")]
        required: Option<Vec<String>>,
    },
}

impl ToolParameter {
    pub fn new_string(description: impl Into<String>) -> Self {
        Self::String { description: Some(description.into()) }
    }

    pub fn new_number(description: impl Into<String>) -> Self {
        Self::Number { description: Some(description.into()) }
    }

    pub fn new_object(properties: Vec<(String, ToolParameter)>) -> Self {
        Self::Object { properties, required: None }
    }

    pub fn with_required(self, required: Vec<&str>) -> Self {
        match self {
            Self::Object { properties, .. } => Self::Object {
                properties,
                required: Some(required.into_iter().map(String::from).collect()),
            },
            other => other,
        }
    }
}

/// Specification of a tool as advertised to the agent loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameter,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: ToolParameter) -> Self {
        Self { name: name.into(), description: description.into(), parameters }
    }
}

/// Result from executing a tool.
///
/// Both arms are conversational data for the model; an error result is a
/// recoverable outcome, not a fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self { content: content.into(), error: None }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self { content: String::new(), error: Some(error.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse into the single text fed back to the agent loop.
    pub fn into_text(self) -> String {
        match self.error {
            Some(error) => error,
            None => self.content,
        }
    }
}
