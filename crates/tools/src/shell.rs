use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;

use crate::tool::{Tool, ToolParameter, ToolResult};

/// Fixed execution ceiling for shell commands.
pub const SHELL_TIMEOUT_SECS: u64 = 60;

/// Runs one shell command to completion and returns its output.
///
/// Non-zero exit status and timeouts are conversational outcomes the model
/// can react to; neither terminates the turn.
#[derive(Debug)]
pub struct ShellTool {
    timeout: Duration,
}

impl ShellTool {
    pub fn new() -> Self {
        Self { timeout: Duration::from_secs(SHELL_TIMEOUT_SECS) }
    }

    /// Custom ceiling, for tests.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Combine trimmed stdout and stderr, marking the stderr section.
    fn format_output(stdout: &str, stderr: &str) -> String {
        let stdout = stdout.trim_end();
        let stderr = stderr.trim_end();

        let mut output = stdout.to_string();
        if !stderr.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("[stderr]\n");
            output.push_str(stderr);
        }

        if output.is_empty() { "(no output)".to_string() } else { output }
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its output. Commands run to completion with a 60 second ceiling."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![(
            "command".to_string(),
            ToolParameter::new_string("The shell command to execute"),
        )])
        .with_required(vec!["command"])
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(command) = arguments.get("command").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'command' parameter");
        };

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ToolResult::error(format!("Failed to execute command '{}': {}", command, e));
            }
            Err(_) => {
                return ToolResult::error(format!(
                    "Command timed out after {} seconds: {}",
                    self.timeout.as_secs(),
                    command
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = Self::format_output(&stdout, &stderr);

        if output.status.success() {
            ToolResult::success(text)
        } else {
            let exit_code = output.status.code().unwrap_or(-1);
            ToolResult::error(format!("Command failed (exit {}):\n{}", exit_code, text))
        }
    }
}
