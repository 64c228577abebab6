//! Achievement definition schema

use chrono::{DateTime, Utc};
use glimmer_core::{Currency, DefId, RewardBundle, TriggerKind};
use serde::{Deserialize, Serialize};

/// How close an account is to an achievement, and when it unlocks
///
/// Each criterion is evaluated against durable state: either a lifetime
/// count carried in the trigger payload, or a query over the engine's own
/// ledger tables. Never an in-memory counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    /// The lifetime count in the trigger payload reaches a threshold
    /// (posts created, comments posted, followers, login streak days)
    LifetimeCount { threshold: u64 },
    /// A single post's reaction total reaches a threshold
    PeakReactions { threshold: u64 },
    /// Total currency earned to date, summed from the engine's ledger
    LifetimeEarned { currency: Currency, amount: u64 },
    /// Completed trades, counted from the engine's trade table
    TradesCompleted { count: u64 },
    /// The account's level reaches a value
    LevelReached { level: u32 },
    /// The account's cumulative XP reaches a value
    XpTotal { amount: u64 },
}

impl Criterion {
    /// The threshold needed to unlock, for progress display
    pub fn required(&self) -> u64 {
        match self {
            Criterion::LifetimeCount { threshold } => *threshold,
            Criterion::PeakReactions { threshold } => *threshold,
            Criterion::LifetimeEarned { amount, .. } => *amount,
            Criterion::TradesCompleted { count } => *count,
            Criterion::LevelReached { level } => *level as u64,
            Criterion::XpTotal { amount } => *amount,
        }
    }
}

/// Rarity tier, for display and sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Definition of an achievement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Unique identifier
    pub id: DefId,
    /// Display name
    pub name: String,
    /// Description shown once visible
    #[serde(default)]
    pub description: String,
    /// Which trigger class causes (re-)evaluation
    pub trigger: TriggerKind,
    /// Completion criterion
    pub criterion: Criterion,
    /// Rewards granted exactly once on unlock
    #[serde(default)]
    pub reward: RewardBundle,
    /// Hidden from listings until unlocked
    #[serde(default)]
    pub secret: bool,
    /// Rarity tier
    #[serde(default)]
    pub rarity: Rarity,
    /// Achievements that must be unlocked first
    #[serde(default)]
    pub prerequisites: Vec<DefId>,
    /// No unlocks after this instant (seasonal achievements)
    #[serde(default)]
    pub available_until: Option<DateTime<Utc>>,
}

impl AchievementDef {
    /// Create a minimal definition (tests and fixtures)
    pub fn new(id: impl Into<DefId>, trigger: TriggerKind, criterion: Criterion) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            id,
            description: String::new(),
            trigger,
            criterion,
            reward: RewardBundle::default(),
            secret: false,
            rarity: Rarity::Common,
            prerequisites: Vec::new(),
            available_until: None,
        }
    }

    /// Set the reward bundle
    pub fn with_reward(mut self, reward: RewardBundle) -> Self {
        self.reward = reward;
        self
    }
}

/// A collection of achievement definitions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AchievementDefs {
    pub achievements: Vec<AchievementDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_achievement_def_ron() {
        let ron_str = r#"
        (
            id: "prolific_poster",
            name: "Prolific Poster",
            description: "Create 100 posts",
            trigger: post_created,
            criterion: LifetimeCount(threshold: 100),
            reward: (xp: 500, sparkle: 250),
            rarity: rare,
        )
        "#;

        let def: AchievementDef = ron::from_str(ron_str).unwrap();
        assert_eq!(def.id.as_str(), "prolific_poster");
        assert_eq!(def.trigger, TriggerKind::PostCreated);
        assert_eq!(def.criterion.required(), 100);
        assert_eq!(def.reward.xp, 500);
        assert_eq!(def.rarity, Rarity::Rare);
        assert!(!def.secret);
        assert!(def.prerequisites.is_empty());
    }

    #[test]
    fn test_criterion_required() {
        assert_eq!(Criterion::LevelReached { level: 10 }.required(), 10);
        assert_eq!(
            Criterion::LifetimeEarned {
                currency: Currency::Sparkle,
                amount: 1000
            }
            .required(),
            1000
        );
    }
}
