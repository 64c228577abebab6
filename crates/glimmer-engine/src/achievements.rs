//! Achievement evaluator
//!
//! Every trigger event filters the static definitions down to those
//! subscribed to its class, then computes each one's progress from durable
//! state: the payload's lifetime count, the account's mirrored counters,
//! or a query over the engine's own tables. Progress survives restarts
//! because nothing is counted in memory.
//!
//! The unlock is at-most-once: `unlocked_at` is checked before granting
//! and set in the same write transaction as the reward grant, so a retried
//! trigger can never pay twice.

use crate::sink::Effects;
use crate::{inventory, ledger, xp};
use chrono::{DateTime, Utc};
use glimmer_core::{
    AccountId, Currency, DefId, Result, RewardBundle, Trigger, TriggerKind, TxnKind,
};
use glimmer_defs::{AchievementDef, Criterion, Definitions};
use glimmer_store::{StoredAccount, StoredProgress, WriteTxn};
use serde::{Deserialize, Serialize};

/// An achievement newly unlocked by a trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    /// Achievement definition ID
    pub id: DefId,
    /// Display name
    pub name: String,
    /// Rewards granted
    pub reward: RewardBundle,
}

/// Evaluate all achievements subscribed to the trigger's class.
///
/// Returns the newly unlocked achievements. Achievements in the same batch
/// are independent; evaluation order carries no meaning.
pub fn evaluate(
    txn: &WriteTxn,
    defs: &Definitions,
    policy: &xp::LevelPolicy,
    account: AccountId,
    trigger: &Trigger,
    now: DateTime<Utc>,
    effects: &mut Effects,
) -> Result<Vec<UnlockedAchievement>> {
    let Some(row) = txn.account(account)? else {
        return Err(glimmer_core::Error::AccountNotFound(account));
    };

    // Snapshot before the batch: prerequisites are satisfied by earlier
    // commits only, so unlock cascades never depend on definition order
    let unlocked_before: std::collections::HashSet<String> = txn
        .progress_for(account)?
        .iter()
        .filter(|p| p.is_unlocked())
        .map(|p| p.achievement.clone())
        .collect();

    let mut unlocked = Vec::new();
    for def in defs.achievements_for(trigger.kind()) {
        if let Some(until) = def.available_until {
            if now > until {
                continue;
            }
        }

        let mut progress = txn
            .progress(account, &def.id)?
            .unwrap_or_else(|| StoredProgress::new(account, &def.id, def.criterion.required()));
        if progress.is_unlocked() {
            continue;
        }
        // Prerequisites gate the unlock, not the progress tracking
        let prerequisites_met = def
            .prerequisites
            .iter()
            .all(|p| unlocked_before.contains(p.as_str()));

        let computed = current_progress(txn, &row, def, trigger)?;
        // Progress is monotone for display even when the source dips
        progress.progress = progress.progress.max(computed);

        if prerequisites_met && progress.progress >= progress.required {
            progress.unlocked_at_ms = Some(now.timestamp_millis());
            txn.put_progress(progress)?;
            grant_reward(txn, policy, account, &def.id, &def.reward, now, effects)?;

            effects.notify(
                account,
                "achievement_unlocked",
                format!("Achievement: {}", def.name),
                def.description.clone(),
            );
            effects.emit(
                account,
                "achievement_unlocked",
                vec![
                    ("achievement".to_string(), def.id.to_string()),
                    ("rarity".to_string(), format!("{:?}", def.rarity)),
                ],
            );

            unlocked.push(UnlockedAchievement {
                id: def.id.clone(),
                name: def.name.clone(),
                reward: def.reward.clone(),
            });
        } else {
            // Persist partial progress for display
            txn.put_progress(progress)?;
        }
    }

    Ok(unlocked)
}

/// Compute current progress for one definition against durable state.
fn current_progress(
    txn: &WriteTxn,
    row: &StoredAccount,
    def: &AchievementDef,
    trigger: &Trigger,
) -> Result<u64> {
    let value = match &def.criterion {
        Criterion::LifetimeCount { .. } => trigger
            .lifetime_count()
            .unwrap_or_else(|| mirrored_count(row, def.trigger)),
        Criterion::PeakReactions { .. } => match trigger {
            Trigger::ReactionReceived { post_reactions } => *post_reactions,
            _ => 0,
        },
        Criterion::LifetimeEarned { currency, .. } => {
            ledger::lifetime_earned(txn, row.account_id(), *currency)?
        }
        Criterion::TradesCompleted { .. } => completed_trades(txn, row.account_id())?,
        Criterion::LevelReached { .. } => row.level as u64,
        Criterion::XpTotal { .. } => row.xp,
    };
    Ok(value)
}

/// The mirrored forum counter matching a trigger class.
fn mirrored_count(row: &StoredAccount, kind: TriggerKind) -> u64 {
    match kind {
        TriggerKind::PostCreated => row.post_count,
        TriggerKind::CommentPosted => row.comment_count,
        TriggerKind::FollowerGained => row.follower_count,
        TriggerKind::LoginRecorded => row.login_streak as u64,
        _ => 0,
    }
}

fn completed_trades(txn: &WriteTxn, account: AccountId) -> Result<u64> {
    let trades = txn.all_trades()?;
    Ok(trades
        .iter()
        .filter(|t| {
            t.trade_status() == glimmer_core::TradeStatus::Completed
                && (t.initiator == account.raw() || t.recipient == account.raw())
        })
        .count() as u64)
}

fn grant_reward(
    txn: &WriteTxn,
    policy: &xp::LevelPolicy,
    account: AccountId,
    achievement: &DefId,
    reward: &RewardBundle,
    now: DateTime<Utc>,
    effects: &mut Effects,
) -> Result<()> {
    let reason = format!("achievement:{}", achievement);
    if reward.xp > 0 {
        // Goes through the full XP path so level rewards still apply, but
        // does not re-enter evaluation; the next trigger picks up any new
        // level/XP thresholds.
        xp::award_xp(txn, policy, account, reward.xp, &reason, now, effects)?;
    }
    if reward.sparkle > 0 {
        ledger::award(
            txn,
            account,
            reward.sparkle,
            Currency::Sparkle,
            TxnKind::Earned,
            &reason,
            Some(achievement.to_string()),
            now,
        )?;
    }
    if reward.premium > 0 {
        ledger::award(
            txn,
            account,
            reward.premium,
            Currency::Premium,
            TxnKind::Earned,
            &reason,
            Some(achievement.to_string()),
            now,
        )?;
    }
    for grant in &reward.items {
        inventory::grant(txn, account, &grant.item, grant.quantity, "achievement")?;
    }
    Ok(())
}
