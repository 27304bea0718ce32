//! Core types for the skills system.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One discoverable capability bundle.
///
/// Created at discovery time and immutable afterward. The instructions
/// body is deliberately not held here; it is read from
/// `instructions_path` only when the skill is selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    /// Stable identifier, derived from the directory name
    pub id: String,

    /// Display name from the manifest frontmatter
    pub name: String,

    /// What the skill does; the model reads this to decide when to load it
    pub description: String,

    /// Path to the SKILL.md holding the full instructions body
    pub instructions_path: PathBuf,

    /// The skill directory (helper scripts and assets live here)
    pub root: PathBuf,
}

/// Errors that can occur when working with skills.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("skill not found: {0}")]
    NotFound(String),

    #[error("skill root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("invalid SKILL.md manifest: {0}")]
    InvalidManifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for skill operations.
pub type Result<T> = std::result::Result<T, SkillError>;

impl From<SkillError> for deckhand_core::Error {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::RootMissing(_) => deckhand_core::Error::Config(err.to_string()),
            other => deckhand_core::Error::Skill(other.to_string()),
        }
    }
}
