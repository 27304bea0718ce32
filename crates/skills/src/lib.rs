//! Skill discovery and the immutable skill registry.
//!
//! A skill is a directory holding a `SKILL.md` manifest (YAML frontmatter
//! plus an instructions body) and any helper scripts the instructions
//! reference. The registry is built once per process by scanning a skill
//! root, then shared read-only; instruction bodies stay on disk until a
//! skill is actually selected.

pub mod manifest;
pub mod registry;
pub mod types;

pub use manifest::parse_manifest;
pub use registry::SkillRegistry;
pub use types::{Result, Skill, SkillError};
