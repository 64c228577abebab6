//! XP award and level-up flow
//!
//! XP only ever increases. An award appends an XPEntry, recomputes the
//! level from the curve, and on a level-up persists the new level and
//! grants the level reward bundle, all inside the caller's write
//! transaction. A crash between any two of those steps is impossible to
//! observe: either the whole award committed or none of it did.

use crate::ledger;
use crate::sink::Effects;
use chrono::{DateTime, Utc};
use glimmer_core::{level_for_xp, AccountId, Currency, DefId, Error, Result, RewardBundle, TxnKind};
use glimmer_store::{StoredXpEntry, WriteTxn};
use serde::{Deserialize, Serialize};

/// How level-ups pay out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelPolicy {
    /// Sparkle points granted per level-up, scaled by the level reached
    pub sparkle_per_level: u64,
    /// Every Nth level also grants premium points
    pub premium_every: u32,
    /// Premium points granted at those levels, scaled by the level reached
    pub premium_per_level: u64,
    /// Item grants at milestone levels
    pub milestone_items: Vec<(u32, DefId)>,
}

impl Default for LevelPolicy {
    fn default() -> Self {
        Self {
            sparkle_per_level: 100,
            premium_every: 5,
            premium_per_level: 10,
            milestone_items: vec![
                (10, DefId::new("badge_veteran")),
                (25, DefId::new("badge_devoted")),
                (50, DefId::new("badge_legend")),
                (100, DefId::new("badge_mythic")),
            ],
        }
    }
}

impl LevelPolicy {
    /// The reward bundle for reaching one specific level
    pub fn reward_for_level(&self, level: u32) -> RewardBundle {
        let mut bundle = RewardBundle::sparkle(self.sparkle_per_level * level as u64);
        if self.premium_every > 0 && level % self.premium_every == 0 {
            bundle.premium = self.premium_per_level * level as u64;
        }
        for (milestone, item) in &self.milestone_items {
            if *milestone == level {
                bundle.items.push(glimmer_core::ItemGrant::one(item.clone()));
            }
        }
        bundle
    }
}

/// Outcome of an XP award
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpAward {
    /// Cumulative XP after the award
    pub total_xp: u64,
    /// Whether a level boundary was crossed
    pub level_up: bool,
    /// The level reached, when `level_up`
    pub new_level: Option<u32>,
    /// Everything granted by crossed levels, merged
    pub rewards: RewardBundle,
}

/// Award XP and process any level-ups.
///
/// Multi-level jumps grant each crossed level's rewards. Level rewards are
/// granted through the ledger in the same transaction; the level-up
/// notification and realtime event are queued on `effects` for post-commit
/// dispatch. Achievement evaluation is the caller's next step, never this
/// function's, so reward-granted XP cannot recurse.
pub fn award_xp(
    txn: &WriteTxn,
    policy: &LevelPolicy,
    account: AccountId,
    amount: u64,
    reason: &str,
    now: DateTime<Utc>,
    effects: &mut Effects,
) -> Result<XpAward> {
    if amount == 0 {
        return Err(Error::invalid_state("xp amount must be positive"));
    }
    let mut row = txn
        .account(account)?
        .ok_or(Error::AccountNotFound(account))?;

    let old_level = row.level;
    let total_xp = row.xp + amount;
    row.xp = total_xp;
    let new_level = level_for_xp(total_xp);
    row.level = new_level;
    txn.put_account(row)?;

    let entry_id = txn.next_id("xp")?;
    txn.push_xp_entry(StoredXpEntry {
        id: entry_id,
        account: account.raw(),
        amount,
        reason: reason.to_string(),
        total_after: total_xp,
        at_ms: now.timestamp_millis(),
    })?;

    let mut rewards = RewardBundle::default();
    let level_up = new_level > old_level;
    if level_up {
        for level in (old_level + 1)..=new_level {
            rewards.merge(&policy.reward_for_level(level));
        }
        grant_level_rewards(txn, account, &rewards, new_level, now)?;

        effects.notify(
            account,
            "level_up",
            format!("Level {}!", new_level),
            format!("You reached level {}", new_level),
        );
        effects.emit(
            account,
            "level_up",
            vec![("level".to_string(), new_level.to_string())],
        );
    }

    Ok(XpAward {
        total_xp,
        level_up,
        new_level: level_up.then_some(new_level),
        rewards,
    })
}

fn grant_level_rewards(
    txn: &WriteTxn,
    account: AccountId,
    rewards: &RewardBundle,
    level: u32,
    now: DateTime<Utc>,
) -> Result<()> {
    let reason = format!("level_reward:{}", level);
    if rewards.sparkle > 0 {
        ledger::award(
            txn,
            account,
            rewards.sparkle,
            Currency::Sparkle,
            TxnKind::Earned,
            &reason,
            None,
            now,
        )?;
    }
    if rewards.premium > 0 {
        ledger::award(
            txn,
            account,
            rewards.premium,
            Currency::Premium,
            TxnKind::Earned,
            &reason,
            None,
            now,
        )?;
    }
    for grant in &rewards.items {
        crate::inventory::grant(txn, account, &grant.item, grant.quantity, "level_reward")?;
    }
    Ok(())
}
