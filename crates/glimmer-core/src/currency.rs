//! Currency and reward types
//!
//! Two virtual currencies exist side by side: sparkle points (the common
//! currency) and premium points. Each balance is non-negative and every
//! mutation is recorded as an immutable transaction row by the ledger.

use crate::DefId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two virtual currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// The common, freely earned currency
    Sparkle,
    /// The scarce currency granted at level milestones and special events
    Premium,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Sparkle => write!(f, "sparkle_points"),
            Currency::Premium => write!(f, "premium_points"),
        }
    }
}

/// Classification of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnKind {
    /// Balance increased by a reward or grant
    Earned,
    /// Balance decreased by a purchase or fee
    Spent,
    /// Balance moved between two accounts (trade, gift)
    Transferred,
    /// A previous spend returned to the account
    Refunded,
}

/// A quantity of a specific item granted as part of a reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGrant {
    /// Item definition ID
    pub item: DefId,
    /// Number of copies granted
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl ItemGrant {
    /// Create a grant of a single copy
    pub fn one(item: impl Into<DefId>) -> Self {
        Self {
            item: item.into(),
            quantity: 1,
        }
    }
}

/// A bundle of rewards granted together (level-up, achievement, quest)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBundle {
    /// Experience points
    #[serde(default)]
    pub xp: u64,
    /// Sparkle points
    #[serde(default)]
    pub sparkle: u64,
    /// Premium points
    #[serde(default)]
    pub premium: u64,
    /// Item grants
    #[serde(default)]
    pub items: Vec<ItemGrant>,
}

impl RewardBundle {
    /// A bundle containing only XP
    pub fn xp(amount: u64) -> Self {
        Self {
            xp: amount,
            ..Default::default()
        }
    }

    /// A bundle containing only sparkle points
    pub fn sparkle(amount: u64) -> Self {
        Self {
            sparkle: amount,
            ..Default::default()
        }
    }

    /// Whether the bundle grants nothing at all
    pub fn is_empty(&self) -> bool {
        self.xp == 0 && self.sparkle == 0 && self.premium == 0 && self.items.is_empty()
    }

    /// Merge another bundle into this one
    pub fn merge(&mut self, other: &RewardBundle) {
        self.xp += other.xp;
        self.sparkle += other.sparkle;
        self.premium += other.premium;
        self.items.extend(other.items.iter().cloned());
    }
}
