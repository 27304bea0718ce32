//! Parser for SKILL.md manifests with YAML frontmatter.
//!
//! SKILL.md format:
//! ```markdown
//! ---
//! name: pptx
//! description: Create and edit PowerPoint presentations
//! ---
//!
//! # PPTX
//!
//! ## Workflow
//! ...
//! ```
//!
//! The frontmatter supplies the catalogue metadata; everything after the
//! closing fence is the instructions body.

use crate::types::{Result, Skill, SkillError};
use std::fs;
use std::path::Path;

/// Manifest file name expected in every skill directory.
pub const MANIFEST_FILE: &str = "SKILL.md";

/// Parse a skill directory's manifest into a [Skill].
///
/// Reads only the frontmatter; the instructions body stays on disk. The
/// skill id is the directory name.
pub fn parse_manifest(skill_dir: &Path) -> Result<Skill> {
    let manifest_path = skill_dir.join(MANIFEST_FILE);

    if !manifest_path.exists() {
        return Err(SkillError::NotFound(manifest_path.display().to_string()));
    }

    let id = skill_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SkillError::InvalidManifest(format!("unusable directory name: {}", skill_dir.display())))?
        .to_string();

    let content = fs::read_to_string(&manifest_path)?;
    let (frontmatter, _body) = extract_frontmatter(&content)?;

    Ok(Skill {
        id,
        name: frontmatter.name,
        description: frontmatter.description,
        instructions_path: manifest_path,
        root: skill_dir.to_path_buf(),
    })
}

/// Read the instructions body of a manifest file (everything after the
/// frontmatter), trimmed.
pub fn read_instructions(manifest_path: &Path) -> Result<String> {
    let content = fs::read_to_string(manifest_path)?;
    let (_frontmatter, body) = extract_frontmatter(&content)?;
    Ok(body.trim().to_string())
}

/// Extract YAML frontmatter and body from manifest content.
fn extract_frontmatter(content: &str) -> Result<(Frontmatter, &str)> {
    if !content.starts_with("---") {
        return Err(SkillError::InvalidManifest("SKILL.md must start with ---".to_string()));
    }

    let rest = &content[3..];
    let frontmatter_end = rest
        .find("---")
        .ok_or_else(|| SkillError::InvalidManifest("closing --- not found".to_string()))?;

    let frontmatter_str = &rest[..frontmatter_end];
    let body = &rest[frontmatter_end + 3..];

    let frontmatter: Frontmatter = serde_yml::from_str(frontmatter_str)
        .map_err(|e| SkillError::InvalidManifest(format!("YAML parse error: {e}")))?;

    if frontmatter.name.trim().is_empty() {
        return Err(SkillError::InvalidManifest("name is required".to_string()));
    }

    if frontmatter.description.trim().is_empty() {
        return Err(SkillError::InvalidManifest("description is required".to_string()));
    }

    if frontmatter.description.len() > 1024 {
        return Err(SkillError::InvalidManifest(
            "description must be <= 1024 characters".to_string(),
        ));
    }

    Ok((frontmatter, body))
}

/// YAML frontmatter structure.
#[derive(Debug, serde::Deserialize)]
struct Frontmatter {
    #[serde(default)]
    name: String,

    #[serde(default)]
    description: String,
}
