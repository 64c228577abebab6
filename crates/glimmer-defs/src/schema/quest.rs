//! Quest definition schema

use chrono::{DateTime, Utc};
use glimmer_core::{DefId, RewardBundle, TriggerKind};
use serde::{Deserialize, Serialize};

/// How often a quest recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Daily,
    Weekly,
    Monthly,
    Special,
}

/// One requirement within a quest
///
/// `session_scoped` requirements count qualifying trigger events inside the
/// assignment's own progress blob ("give 10 reactions today") because no
/// single durable query yields a time-boxed count. Non-scoped requirements
/// instead read the lifetime count from the trigger payload ("reach 100
/// followers"), mirroring how achievement criteria are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestRequirement {
    /// Key under which progress is stored in the assignment blob
    pub key: String,
    /// Trigger class that advances this requirement
    pub trigger: TriggerKind,
    /// Count needed to satisfy the requirement
    pub count: u64,
    /// Accumulate per-assignment instead of reading the lifetime count
    #[serde(default = "default_session_scoped")]
    pub session_scoped: bool,
}

fn default_session_scoped() -> bool {
    true
}

/// Definition of a quest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    /// Unique identifier
    pub id: DefId,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Recurrence class
    pub kind: QuestKind,
    /// All requirements must be met for completion
    pub requirements: Vec<QuestRequirement>,
    /// Rewards granted exactly once on claim
    #[serde(default)]
    pub reward: RewardBundle,
    /// Quests that must have been claimed before this one is eligible
    #[serde(default)]
    pub prerequisites: Vec<DefId>,
    /// Minimum account level to be assigned this quest
    #[serde(default = "default_min_level")]
    pub min_level: u32,
    /// Days that must pass after a claim before reassignment
    #[serde(default)]
    pub cooldown_days: u32,
    /// Not assignable before this instant
    #[serde(default)]
    pub available_from: Option<DateTime<Utc>>,
    /// Not assignable after this instant
    #[serde(default)]
    pub available_until: Option<DateTime<Utc>>,
}

fn default_min_level() -> u32 {
    1
}

impl QuestDef {
    /// Create a minimal daily quest with one requirement (tests and fixtures)
    pub fn daily(id: impl Into<DefId>, trigger: TriggerKind, count: u64) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            id,
            description: String::new(),
            kind: QuestKind::Daily,
            requirements: vec![QuestRequirement {
                key: "progress".to_string(),
                trigger,
                count,
                session_scoped: true,
            }],
            reward: RewardBundle::default(),
            prerequisites: Vec::new(),
            min_level: 1,
            cooldown_days: 0,
            available_from: None,
            available_until: None,
        }
    }

    /// Set the reward bundle
    pub fn with_reward(mut self, reward: RewardBundle) -> Self {
        self.reward = reward;
        self
    }

    /// Whether the quest's availability window contains the given instant
    pub fn available_at(&self, now: DateTime<Utc>) -> bool {
        if let Some(from) = self.available_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.available_until {
            if now > until {
                return false;
            }
        }
        true
    }
}

/// A collection of quest definitions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuestDefs {
    pub quests: Vec<QuestDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quest_def_ron() {
        let ron_str = r#"
        (
            id: "daily_poster",
            name: "Daily Poster",
            description: "Create a post today",
            kind: daily,
            requirements: [
                (key: "posts", trigger: post_created, count: 1),
            ],
            reward: (xp: 50, sparkle: 20),
        )
        "#;

        let def: QuestDef = ron::from_str(ron_str).unwrap();
        assert_eq!(def.id.as_str(), "daily_poster");
        assert_eq!(def.kind, QuestKind::Daily);
        assert_eq!(def.requirements.len(), 1);
        assert!(def.requirements[0].session_scoped);
        assert_eq!(def.min_level, 1);
    }

    #[test]
    fn test_availability_window() {
        let mut def = QuestDef::daily("d", TriggerKind::PostCreated, 1);
        let now = Utc::now();
        assert!(def.available_at(now));

        def.available_until = Some(now - chrono::Duration::days(1));
        assert!(!def.available_at(now));
    }
}
