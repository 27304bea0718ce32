//! Discovery and the process-wide skill catalogue.

use crate::manifest;
use crate::types::{Result, Skill, SkillError};
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// Immutable, ordered catalogue of discovered skills.
///
/// Built exactly once at warm-up and read-only afterward, so it can be
/// shared across turns behind an `Arc` without locking. Construct fresh
/// instances per test; there is no global.
#[derive(Debug, Clone)]
pub struct SkillRegistry {
    skills: Vec<Skill>,
    index: HashMap<String, usize>,
}

impl SkillRegistry {
    /// Scan the immediate subdirectories of `skill_root` and build the
    /// registry.
    ///
    /// Directories whose manifest is missing or malformed are skipped with
    /// a warning so one broken skill never prevents startup. Fails only if
    /// `skill_root` itself does not exist. Deterministic for an unchanged
    /// filesystem: entries are visited in directory-name order.
    pub fn discover(skill_root: &Path) -> Result<Self> {
        if !skill_root.is_dir() {
            return Err(SkillError::RootMissing(skill_root.to_path_buf()));
        }

        let mut skills = Vec::new();
        let mut index = HashMap::new();

        for entry in WalkDir::new(skill_root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            match manifest::parse_manifest(path) {
                Ok(skill) => {
                    tracing::debug!(id = %skill.id, "discovered skill");
                    index.insert(skill.id.clone(), skills.len());
                    skills.push(skill);
                }
                Err(err) => {
                    tracing::warn!(dir = %path.display(), %err, "skipping skill");
                }
            }
        }

        Ok(Self { skills, index })
    }

    /// Look up a skill by id.
    pub fn get(&self, id: &str) -> Option<&Skill> {
        self.index.get(id).map(|&i| &self.skills[i])
    }

    /// Skills in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter()
    }

    /// Skill ids in discovery order.
    pub fn ids(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Render the compact, model-readable catalogue for the system prompt:
    /// one line per skill, registry order, no instruction bodies.
    pub fn render_catalogue(&self) -> String {
        let mut out = String::new();
        for skill in &self.skills {
            out.push_str(&format!("- {} ({}): {}\n", skill.id, skill.name, skill.description));
        }
        out
    }

    /// Load the full instructions for one skill on demand.
    ///
    /// This is the only point where instruction text is read from disk.
    pub fn resolve_instructions(&self, id: &str) -> Result<String> {
        let skill = self.get(id).ok_or_else(|| SkillError::NotFound(id.to_string()))?;
        manifest::read_instructions(&skill.instructions_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILE;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_skill(root: &Path, id: &str, name: &str, description: &str) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n\nInstructions for {id}.\n"),
        )
        .unwrap();
    }

    #[test]
    fn test_discover_orders_by_directory_name() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "zeta", "Zeta", "Last");
        create_skill(temp.path(), "alpha", "Alpha", "First");
        create_skill(temp.path(), "mid", "Mid", "Middle");

        let registry = SkillRegistry::discover(temp.path()).unwrap();
        assert_eq!(registry.ids(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_discover_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let result = SkillRegistry::discover(&temp.path().join("nope"));
        assert!(matches!(result, Err(SkillError::RootMissing(_))));
    }

    #[test]
    fn test_discover_skips_broken_skill() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "good-one", "One", "Valid");
        create_skill(temp.path(), "good-two", "Two", "Also valid");

        // Third directory is missing its description field.
        let broken = temp.path().join("broken");
        fs::create_dir(&broken).unwrap();
        fs::write(broken.join(MANIFEST_FILE), "---\nname: broken\n---\nbody").unwrap();

        let registry = SkillRegistry::discover(temp.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("broken").is_none());
    }

    #[test]
    fn test_discover_skips_manifest_less_directory() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "pptx", "PPTX", "Builds decks");
        fs::create_dir(temp.path().join("scratch")).unwrap();

        let registry = SkillRegistry::discover(temp.path()).unwrap();
        assert_eq!(registry.ids(), vec!["pptx"]);
    }

    #[test]
    fn test_discover_ignores_stray_files_in_root() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "pptx", "PPTX", "Builds decks");
        fs::write(temp.path().join("README.md"), "not a skill").unwrap();

        let registry = SkillRegistry::discover(temp.path()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_discover_is_idempotent() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "beta", "Beta", "Second");
        create_skill(temp.path(), "alpha", "Alpha", "First");

        let first = SkillRegistry::discover(temp.path()).unwrap();
        let second = SkillRegistry::discover(temp.path()).unwrap();
        assert_eq!(first.ids(), second.ids());
    }

    #[test]
    fn test_render_catalogue() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "pptx", "PowerPoint Builder", "Creates .pptx decks");
        create_skill(temp.path(), "research", "Researcher", "Gathers source material");

        let registry = SkillRegistry::discover(temp.path()).unwrap();
        let catalogue = registry.render_catalogue();

        assert_eq!(
            catalogue,
            "- pptx (PowerPoint Builder): Creates .pptx decks\n\
             - research (Researcher): Gathers source material\n"
        );
    }

    #[test]
    fn test_resolve_instructions_reads_body() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "pptx", "PPTX", "Builds decks");

        let registry = SkillRegistry::discover(temp.path()).unwrap();
        let instructions = registry.resolve_instructions("pptx").unwrap();

        assert!(instructions.contains("Instructions for pptx."));
        assert!(!instructions.contains("description:"));
    }

    #[test]
    fn test_resolve_instructions_unknown_id() {
        let temp = TempDir::new().unwrap();
        create_skill(temp.path(), "pptx", "PPTX", "Builds decks");

        let registry = SkillRegistry::discover(temp.path()).unwrap();
        let before: Vec<PathBuf> = registry.iter().map(|s| s.root.clone()).collect();

        let result = registry.resolve_instructions("nonexistent");
        assert!(matches!(result, Err(SkillError::NotFound(_))));

        // Lookup failure does not disturb the registry.
        let after: Vec<PathBuf> = registry.iter().map(|s| s.root.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_root_yields_empty_registry() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::discover(temp.path()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.render_catalogue(), "");
    }
}
