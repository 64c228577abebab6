//! RON definition loader

use crate::error::{Error, Result};
use crate::schema::{AchievementDef, ItemDef, QuestDef};
use glimmer_core::{DefId, TriggerKind};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;

/// Loaded gamification content, immutable for the engine's lifetime
#[derive(Debug, Default)]
pub struct Definitions {
    /// Achievement definitions by ID
    pub achievements: IndexMap<DefId, AchievementDef>,
    /// Quest definitions by ID
    pub quests: IndexMap<DefId, QuestDef>,
    /// Item definitions by ID
    pub items: IndexMap<DefId, ItemDef>,
}

impl Definitions {
    /// Create empty definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an achievement definition
    pub fn achievement(&self, id: &DefId) -> Option<&AchievementDef> {
        self.achievements.get(id)
    }

    /// Get a quest definition
    pub fn quest(&self, id: &DefId) -> Option<&QuestDef> {
        self.quests.get(id)
    }

    /// Get an item definition
    pub fn item(&self, id: &DefId) -> Option<&ItemDef> {
        self.items.get(id)
    }

    /// Achievements that subscribe to a trigger class
    pub fn achievements_for(&self, kind: TriggerKind) -> impl Iterator<Item = &AchievementDef> {
        self.achievements.values().filter(move |a| a.trigger == kind)
    }

    /// Quests whose requirements include a trigger class
    pub fn quests_for(&self, kind: TriggerKind) -> impl Iterator<Item = &QuestDef> {
        self.quests
            .values()
            .filter(move |q| q.requirements.iter().any(|r| r.trigger == kind))
    }

    /// Verify that every cross-reference resolves
    ///
    /// Checks achievement prerequisites, quest prerequisites, and item
    /// grants inside reward bundles.
    pub fn validate(&self) -> Result<()> {
        for def in self.achievements.values() {
            for prereq in &def.prerequisites {
                if !self.achievements.contains_key(prereq) {
                    return Err(Error::UnknownReference(format!(
                        "achievement '{}' requires unknown achievement '{}'",
                        def.id, prereq
                    )));
                }
            }
            for grant in &def.reward.items {
                if !self.items.contains_key(&grant.item) {
                    return Err(Error::UnknownReference(format!(
                        "achievement '{}' grants unknown item '{}'",
                        def.id, grant.item
                    )));
                }
            }
        }
        for def in self.quests.values() {
            for prereq in &def.prerequisites {
                if !self.quests.contains_key(prereq) {
                    return Err(Error::UnknownReference(format!(
                        "quest '{}' requires unknown quest '{}'",
                        def.id, prereq
                    )));
                }
            }
            for grant in &def.reward.items {
                if !self.items.contains_key(&grant.item) {
                    return Err(Error::UnknownReference(format!(
                        "quest '{}' grants unknown item '{}'",
                        def.id, grant.item
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Loader for RON definition files
pub struct Loader {
    defs: Definitions,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            defs: Definitions::new(),
        }
    }

    /// Load a single RON file
    ///
    /// The collection type is detected from the filename or the top-level
    /// field name.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if filename.contains("achievement") || content.contains("achievements:") {
            self.load_achievements_str(&content)
        } else if filename.contains("quest") || content.contains("quests:") {
            self.load_quests_str(&content)
        } else if filename.contains("item") || content.contains("items:") {
            self.load_items_str(&content)
        } else {
            Err(Error::InvalidDefinition(format!(
                "could not determine definition type of {:?}",
                path
            )))
        }
    }

    /// Load achievements from a RON string
    pub fn load_achievements_str(&mut self, content: &str) -> Result<()> {
        let file: crate::schema::achievement::AchievementDefs = ron::from_str(content)?;
        for def in file.achievements {
            let id = def.id.clone();
            if self.defs.achievements.contains_key(&id) {
                return Err(Error::DuplicateDefinition(id.to_string()));
            }
            self.defs.achievements.insert(id, def);
        }
        Ok(())
    }

    /// Load quests from a RON string
    pub fn load_quests_str(&mut self, content: &str) -> Result<()> {
        let file: crate::schema::quest::QuestDefs = ron::from_str(content)?;
        for def in file.quests {
            let id = def.id.clone();
            if self.defs.quests.contains_key(&id) {
                return Err(Error::DuplicateDefinition(id.to_string()));
            }
            if def.requirements.is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "quest '{}' has no requirements",
                    id
                )));
            }
            self.defs.quests.insert(id, def);
        }
        Ok(())
    }

    /// Load items from a RON string
    pub fn load_items_str(&mut self, content: &str) -> Result<()> {
        let file: crate::schema::item::ItemDefs = ron::from_str(content)?;
        for def in file.items {
            let id = def.id.clone();
            if self.defs.items.contains_key(&id) {
                return Err(Error::DuplicateDefinition(id.to_string()));
            }
            self.defs.items.insert(id, def);
        }
        Ok(())
    }

    /// Load all RON files from a directory, recursively
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();

            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Validate cross-references and return the finished registry
    pub fn finish(self) -> Result<Definitions> {
        self.defs.validate()?;
        Ok(self.defs)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACHIEVEMENTS: &str = r#"
    (
        achievements: [
            (
                id: "first_post",
                name: "First Post",
                trigger: post_created,
                criterion: LifetimeCount(threshold: 1),
                reward: (xp: 50),
            ),
            (
                id: "prolific_poster",
                name: "Prolific Poster",
                trigger: post_created,
                criterion: LifetimeCount(threshold: 100),
                reward: (xp: 500, sparkle: 250),
                rarity: rare,
                prerequisites: ["first_post"],
            ),
        ]
    )
    "#;

    const QUESTS: &str = r#"
    (
        quests: [
            (
                id: "daily_poster",
                name: "Daily Poster",
                kind: daily,
                requirements: [(key: "posts", trigger: post_created, count: 1)],
                reward: (xp: 50),
            ),
        ]
    )
    "#;

    #[test]
    fn test_load_and_index() {
        let mut loader = Loader::new();
        loader.load_achievements_str(ACHIEVEMENTS).unwrap();
        loader.load_quests_str(QUESTS).unwrap();

        let defs = loader.finish().unwrap();
        assert_eq!(defs.achievements.len(), 2);
        assert_eq!(
            defs.achievements_for(TriggerKind::PostCreated).count(),
            2
        );
        assert_eq!(defs.achievements_for(TriggerKind::LoginRecorded).count(), 0);
        assert_eq!(defs.quests_for(TriggerKind::PostCreated).count(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut loader = Loader::new();
        loader.load_achievements_str(ACHIEVEMENTS).unwrap();
        let err = loader.load_achievements_str(ACHIEVEMENTS).unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(_)));
    }

    #[test]
    fn test_unknown_prerequisite_rejected() {
        let content = r#"
        (
            achievements: [
                (
                    id: "gated",
                    name: "Gated",
                    trigger: post_created,
                    criterion: LifetimeCount(threshold: 1),
                    prerequisites: ["does_not_exist"],
                ),
            ]
        )
        "#;
        let mut loader = Loader::new();
        loader.load_achievements_str(content).unwrap();
        assert!(matches!(
            loader.finish().unwrap_err(),
            Error::UnknownReference(_)
        ));
    }

    #[test]
    fn test_empty_quest_rejected() {
        let content = r#"
        (
            quests: [
                (
                    id: "empty",
                    name: "Empty",
                    kind: daily,
                    requirements: [],
                ),
            ]
        )
        "#;
        let mut loader = Loader::new();
        assert!(matches!(
            loader.load_quests_str(content).unwrap_err(),
            Error::InvalidDefinition(_)
        ));
    }
}
