//! Local file read/write adapters.

use std::path::Path;

use serde_json::Value;

use crate::tool::{Tool, ToolParameter, ToolResult};

/// Maximum number of lines returned by a single read.
const READ_LINE_LIMIT: usize = 2000;

/// Reads a local text file.
#[derive(Debug)]
pub struct FileReadTool;

impl FileReadTool {
    fn read(path: &Path) -> ToolResult {
        if !path.exists() {
            return ToolResult::error(format!("File not found: {}", path.display()));
        }
        if path.is_dir() {
            return ToolResult::error(format!("Path is a directory, not a file: {}", path.display()));
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return ToolResult::error(format!("Failed to read {}: {}", path.display(), e)),
        };

        let total_lines = content.lines().count();
        if total_lines > READ_LINE_LIMIT {
            let truncated: String = content
                .lines()
                .take(READ_LINE_LIMIT)
                .collect::<Vec<_>>()
                .join("\n");
            return ToolResult::success(format!(
                "{}\n\n[truncated: showing {} of {} lines]",
                truncated, READ_LINE_LIMIT, total_lines
            ));
        }

        ToolResult::success(content)
    }
}

#[async_trait::async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read a local text file and return its contents."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![(
            "path".to_string(),
            ToolParameter::new_string("Path of the file to read"),
        )])
        .with_required(vec!["path"])
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(path) = arguments.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'path' parameter");
        };

        Self::read(Path::new(path))
    }
}

/// Writes text to a local file, creating parent directories as needed.
#[derive(Debug)]
pub struct FileWriteTool;

#[async_trait::async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write text content to a local file, creating parent directories if needed."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![
            ("path".to_string(), ToolParameter::new_string("Destination path")),
            ("content".to_string(), ToolParameter::new_string("Content to write")),
        ])
        .with_required(vec!["path", "content"])
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(path) = arguments.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'path' parameter");
        };
        let Some(content) = arguments.get("content").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'content' parameter");
        };

        let path = Path::new(path);
        if path.is_dir() {
            return ToolResult::error(format!("Path is a directory, not a file: {}", path.display()));
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            return ToolResult::error(format!("Cannot create {}: {}", parent.display(), e));
        }

        match std::fs::write(path, content) {
            Ok(()) => ToolResult::success(format!("Wrote {} bytes to {}", content.len(), path.display())),
            Err(e) => ToolResult::error(format!("Failed to write {}: {}", path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "outline:\n- intro\n- demo\n").unwrap();

        let tool = FileReadTool;
        let result = tool.execute(&serde_json::json!({"path": path.to_str().unwrap()})).await;
        assert!(result.is_success());
        assert!(result.content.contains("- demo"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let tool = FileReadTool;
        let result = tool.execute(&serde_json::json!({"path": "/no/such/file.txt"})).await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_read_directory_rejected() {
        let temp = TempDir::new().unwrap();
        let tool = FileReadTool;
        let result = tool.execute(&serde_json::json!({"path": temp.path().to_str().unwrap()})).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_read_truncates_long_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.txt");
        let content: String = (0..READ_LINE_LIMIT + 10).map(|i| format!("line {}\n", i)).collect();
        std::fs::write(&path, content).unwrap();

        let tool = FileReadTool;
        let result = tool.execute(&serde_json::json!({"path": path.to_str().unwrap()})).await;
        assert!(result.is_success());
        assert!(result.content.contains("[truncated"));
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deep/nested/out.md");

        let tool = FileWriteTool;
        let args = serde_json::json!({"path": path.to_str().unwrap(), "content": "# Slide 1"});
        let result = tool.execute(&args).await;

        assert!(result.is_success());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Slide 1");
    }

    #[tokio::test]
    async fn test_write_missing_content_parameter() {
        let tool = FileWriteTool;
        let result = tool.execute(&serde_json::json!({"path": "/tmp/x"})).await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("content"));
    }
}
