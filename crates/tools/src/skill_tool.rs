//! The single dynamically-dispatched skill tool.
//!
//! One tool covers every discovered skill: the model passes a skill id and
//! receives that skill's full instructions as the result text. The lookup
//! is a closed map consultation against the immutable registry; an unknown
//! id comes back as a textual error listing the valid ids so the model can
//! self-correct.

use std::sync::Arc;

use deckhand_skills::{SkillError, SkillRegistry};
use serde_json::Value;

use crate::tool::{Tool, ToolParameter, ToolResult};

/// Resolves a skill id to its full instructions on demand.
#[derive(Debug, Clone)]
pub struct SkillTool {
    registry: Arc<SkillRegistry>,
}

impl SkillTool {
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait::async_trait]
impl Tool for SkillTool {
    fn name(&self) -> &str {
        "skill"
    }

    fn description(&self) -> &str {
        "Load the full instructions for a skill. Pass the id of one of the skills listed in the \
         system prompt."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![(
            "skill_id".to_string(),
            ToolParameter::new_string("Id of the skill to load"),
        )])
        .with_required(vec!["skill_id"])
    }

    async fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(skill_id) = arguments.get("skill_id").and_then(|v| v.as_str()) else {
            return ToolResult::error("Missing or invalid 'skill_id' parameter");
        };

        match self.registry.resolve_instructions(skill_id) {
            Ok(instructions) => ToolResult::success(instructions),
            Err(SkillError::NotFound(_)) => ToolResult::error(format!(
                "Unknown skill '{}'. Valid ids: {}",
                skill_id,
                self.registry.ids().join(", ")
            )),
            Err(err) => ToolResult::error(format!("Failed to load skill '{}': {}", skill_id, err)),
        }
    }
}
