//! The facade external flows call
//!
//! Every operation follows the same shape: open one write transaction,
//! compose all mutations of the logical unit, collect side effects, commit,
//! then dispatch the effects to the sinks. A business error aborts the
//! transaction by dropping it uncommitted, so expected failures leave no
//! partial state and no stray notifications.

use crate::achievements::{self, UnlockedAchievement};
use crate::clock::{Clock, SystemClock};
use crate::leaderboard::{LeaderboardEntry, Leaderboards, Metric, Period, Scope};
use crate::quests::{self, QuestUpdate, QuestView};
use crate::sink::{Effects, EventSink, NotificationSink, NullSink, SideEffect};
use crate::trade::{self, TradeResolution};
use crate::xp::{self, LevelPolicy, XpAward};
use crate::{inventory, ledger};
use chrono::{DateTime, Utc};
use glimmer_core::{
    AccountId, DefId, Error, LevelProgress, Result, RewardBundle, TradeId, Trigger, TriggerKind,
    TxnKind,
};
use glimmer_defs::Definitions;
use glimmer_store::{stat_kind, Store, StoredAccount, StoredStatEntry, TradeSide, WriteTxn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything a single trigger event caused
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TriggerOutcome {
    /// The XP award, when the trigger carries base XP
    pub xp: Option<XpAward>,
    /// Achievements newly unlocked, including follow-on level/XP unlocks
    pub unlocked: Vec<UnlockedAchievement>,
    /// Quest assignments the trigger advanced
    pub quests: Vec<QuestUpdate>,
}

/// Profile summary for one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    /// The account
    pub account: AccountId,
    /// Cumulative XP
    pub xp: u64,
    /// Current level with progress toward the next
    pub progress: LevelProgress,
    /// Sparkle point balance
    pub sparkle: u64,
    /// Premium point balance
    pub premium: u64,
    /// Achievements unlocked so far
    pub unlocked_achievements: usize,
    /// Completed quests waiting to be claimed
    pub claimable_quests: usize,
}

/// Base XP carried by each trigger class.
fn base_xp(kind: TriggerKind) -> u64 {
    match kind {
        TriggerKind::PostCreated => 50,
        TriggerKind::CommentPosted => 20,
        TriggerKind::ReactionGiven => 5,
        TriggerKind::ReactionReceived => 10,
        TriggerKind::FollowerGained => 15,
        TriggerKind::LoginRecorded => 10,
        TriggerKind::TradeCompleted => 25,
        TriggerKind::PurchaseMade => 0,
        TriggerKind::LevelReached => 0,
        TriggerKind::XpGained => 0,
    }
}

/// The gamification engine facade.
///
/// Holds the store, the immutable definitions loaded at startup, the
/// level policy, and the injected clock and sinks. Cheap to share behind
/// an `Arc`; all interior state is the store itself plus the leaderboard
/// cache.
pub struct Gamification {
    store: Store,
    defs: Definitions,
    policy: LevelPolicy,
    leaderboards: Leaderboards,
    notifications: Arc<dyn NotificationSink>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl Gamification {
    /// Create a facade with default policy, null sinks, and the wall clock.
    pub fn new(store: Store, defs: Definitions) -> Self {
        Self {
            store,
            defs,
            policy: LevelPolicy::default(),
            leaderboards: Leaderboards::default(),
            notifications: Arc::new(NullSink),
            events: Arc::new(NullSink),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the level policy.
    pub fn with_policy(mut self, policy: LevelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the notification sink.
    pub fn with_notifications(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = sink;
        self
    }

    /// Replace the realtime event sink.
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a fresh level-1 account.
    pub fn create_account(&self, account: AccountId) -> Result<()> {
        let now = self.clock.now();
        let txn = self.store.write()?;
        if txn.account(account)?.is_some() {
            return Err(Error::invalid_state(format!("{} already exists", account)));
        }
        txn.put_account(StoredAccount::new(account, now))?;
        txn.commit()?;
        Ok(())
    }

    /// Award XP directly, outside any trigger.
    ///
    /// Level- and XP-triggered achievements and quests evaluate afterward
    /// in the same transaction.
    pub fn award_xp(&self, account: AccountId, amount: u64, reason: &str) -> Result<XpAward> {
        let now = self.clock.now();
        let mut effects = Effects::new();
        let txn = self.store.write()?;

        let award = xp::award_xp(&txn, &self.policy, account, amount, reason, now, &mut effects)?;
        self.follow_up(&txn, account, &award, now, &mut effects)?;

        txn.commit()?;
        self.dispatch(effects);
        Ok(award)
    }

    /// Feed an external event through the whole pipeline: stat mirror,
    /// base XP, achievements, quest progress, follow-on level/XP checks.
    pub fn on_trigger(&self, account: AccountId, trigger: Trigger) -> Result<TriggerOutcome> {
        let now = self.clock.now();
        let mut effects = Effects::new();
        let mut outcome = TriggerOutcome::default();
        let txn = self.store.write()?;

        self.mirror_stats(&txn, account, &trigger, now)?;

        let amount = base_xp(trigger.kind());
        if amount > 0 {
            let award = xp::award_xp(
                &txn,
                &self.policy,
                account,
                amount,
                &trigger.kind().to_string(),
                now,
                &mut effects,
            )?;
            outcome.xp = Some(award);
        }

        outcome.unlocked.extend(achievements::evaluate(
            &txn,
            &self.defs,
            &self.policy,
            account,
            &trigger,
            now,
            &mut effects,
        )?);

        quests::refresh_daily(&txn, &self.defs, account, now)?;
        outcome.quests =
            quests::update_progress(&txn, &self.defs, account, &trigger, now, &mut effects)?;

        if let Some(award) = outcome.xp.clone() {
            let follow = self.follow_up(&txn, account, &award, now, &mut effects)?;
            outcome.unlocked.extend(follow);
        }

        txn.commit()?;
        self.dispatch(effects);
        Ok(outcome)
    }

    /// Advance quest progress for a trigger without the XP/achievement
    /// pipeline. Entry point for flows that report raw activity.
    pub fn update_quest_progress(
        &self,
        account: AccountId,
        trigger: Trigger,
    ) -> Result<Vec<QuestUpdate>> {
        let now = self.clock.now();
        let mut effects = Effects::new();
        let txn = self.store.write()?;

        quests::refresh_daily(&txn, &self.defs, account, now)?;
        let updates = quests::update_progress(&txn, &self.defs, account, &trigger, now, &mut effects)?;

        txn.commit()?;
        self.dispatch(effects);
        Ok(updates)
    }

    /// Claim the reward of a completed quest, exactly once.
    pub fn claim_quest_rewards(&self, account: AccountId, quest: &DefId) -> Result<RewardBundle> {
        let now = self.clock.now();
        let mut effects = Effects::new();
        let txn = self.store.write()?;

        let reward = quests::claim(&txn, &self.defs, &self.policy, account, quest, now, &mut effects)?;

        txn.commit()?;
        self.dispatch(effects);
        Ok(reward)
    }

    /// Ensure today's daily rotation exists and return it. Safe to call
    /// redundantly; the rotation is deterministic per (account, day).
    pub fn refresh_daily_quests(&self, account: AccountId) -> Result<Vec<QuestView>> {
        let now = self.clock.now();
        let txn = self.store.write()?;
        let views = quests::refresh_daily(&txn, &self.defs, account, now)?;
        txn.commit()?;
        Ok(views)
    }

    /// Buy an item from the catalog: spend the price, grant the copies,
    /// then run the purchase trigger. Returns the owned quantity.
    pub fn purchase_item(&self, account: AccountId, item: &DefId, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(Error::invalid_state("purchase quantity must be positive"));
        }
        let def = self
            .defs
            .items
            .get(item.as_str())
            .ok_or_else(|| Error::NotFound(format!("item '{}'", item)))?;
        let cost = def
            .cost
            .ok_or_else(|| Error::invalid_state(format!("item '{}' is not for sale", item)))?;

        let now = self.clock.now();
        let mut effects = Effects::new();
        let txn = self.store.write()?;

        ledger::spend(
            &txn,
            account,
            cost.amount * quantity as u64,
            cost.currency,
            TxnKind::Spent,
            &format!("purchase:{}", item),
            Some(item.to_string()),
            now,
        )?;
        let owned = inventory::grant(&txn, account, item, quantity, "purchase")?;

        let trigger = Trigger::PurchaseMade;
        achievements::evaluate(&txn, &self.defs, &self.policy, account, &trigger, now, &mut effects)?;
        quests::refresh_daily(&txn, &self.defs, account, now)?;
        quests::update_progress(&txn, &self.defs, account, &trigger, now, &mut effects)?;

        txn.commit()?;
        self.dispatch(effects);
        Ok(owned)
    }

    /// Propose a trade to another account.
    pub fn propose_trade(
        &self,
        initiator: AccountId,
        recipient: AccountId,
        offer: TradeSide,
        request: TradeSide,
        message: Option<String>,
    ) -> Result<TradeId> {
        self.check_tradeable(&offer)?;
        self.check_tradeable(&request)?;

        let now = self.clock.now();
        let mut effects = Effects::new();
        let txn = self.store.write()?;

        let id = trade::propose(&txn, initiator, recipient, offer, request, message, now, &mut effects)?;

        txn.commit()?;
        self.dispatch(effects);
        Ok(id)
    }

    /// Respond to a pending trade. On acceptance the exchange executes
    /// atomically and trade-completion achievements evaluate for both
    /// parties. A failed re-validation commits the CANCELLED status and
    /// then surfaces as `TradeNoLongerValid`; a late response commits the
    /// EXPIRED status and surfaces as `InvalidState`.
    pub fn respond_trade(
        &self,
        id: TradeId,
        responder: AccountId,
        accept: bool,
    ) -> Result<TradeResolution> {
        let now = self.clock.now();
        let mut effects = Effects::new();
        let txn = self.store.write()?;

        let resolution = trade::respond(&txn, id, responder, accept, now, &mut effects)?;
        if resolution == TradeResolution::Completed {
            let row = txn
                .trade(id)?
                .ok_or_else(|| Error::NotFound(format!("{}", id)))?;
            for party in [AccountId::new(row.initiator), AccountId::new(row.recipient)] {
                achievements::evaluate(
                    &txn,
                    &self.defs,
                    &self.policy,
                    party,
                    &Trigger::TradeCompleted,
                    now,
                    &mut effects,
                )?;
                quests::update_progress(
                    &txn,
                    &self.defs,
                    party,
                    &Trigger::TradeCompleted,
                    now,
                    &mut effects,
                )?;
            }
        }

        txn.commit()?;
        self.dispatch(effects);
        match resolution {
            TradeResolution::Invalidated(reason) => Err(Error::TradeNoLongerValid(reason)),
            TradeResolution::Expired => Err(Error::invalid_state(format!(
                "trade {} expired before it was answered",
                id
            ))),
            other => Ok(other),
        }
    }

    /// Sweep overdue PENDING trades to EXPIRED. Returns how many flipped.
    pub fn expire_trades(&self) -> Result<usize> {
        let now = self.clock.now();
        let txn = self.store.write()?;
        let expired = trade::expire_pending(&txn, now)?;
        txn.commit()?;
        Ok(expired)
    }

    /// Ranked accounts under a metric, scope, and period.
    pub fn get_leaderboard(
        &self,
        metric: Metric,
        scope: Scope,
        period: Period,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboards
            .get(&self.store, metric, scope, period, limit, self.clock.now())
    }

    /// Profile summary: XP, level progress, balances, unlock and claim counts.
    pub fn get_user_stats(&self, account: AccountId) -> Result<UserStats> {
        let r = self.store.read()?;
        let row = r
            .account(account)?
            .ok_or(Error::AccountNotFound(account))?;
        let unlocked = r
            .progress_for(account)?
            .iter()
            .filter(|p| p.is_unlocked())
            .count();
        let claimable = r
            .assignments_for(account)?
            .iter()
            .filter(|a| {
                a.quest_status() == glimmer_core::QuestStatus::Completed && a.claimed_at_ms.is_none()
            })
            .count();
        Ok(UserStats {
            account,
            xp: row.xp,
            progress: LevelProgress::for_xp(row.xp),
            sparkle: row.sparkle,
            premium: row.premium,
            unlocked_achievements: unlocked,
            claimable_quests: claimable,
        })
    }

    /// Current inventory rows for an account.
    pub fn get_inventory(&self, account: AccountId) -> Result<Vec<glimmer_store::StoredInventory>> {
        let r = self.store.read()?;
        Ok(r.inventory_for(account)?)
    }

    /// Equip or unequip an owned item.
    pub fn set_equipped(&self, account: AccountId, item: &DefId, equipped: bool) -> Result<()> {
        let txn = self.store.write()?;
        inventory::set_equipped(&txn, account, item, equipped)?;
        txn.commit()?;
        Ok(())
    }

    /// Level- and XP-triggered evaluation after an XP award.
    fn follow_up(
        &self,
        txn: &WriteTxn,
        account: AccountId,
        award: &XpAward,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> Result<Vec<UnlockedAchievement>> {
        let mut unlocked = Vec::new();
        if let Some(level) = award.new_level {
            let trigger = Trigger::LevelReached { level };
            unlocked.extend(achievements::evaluate(
                txn, &self.defs, &self.policy, account, &trigger, now, effects,
            )?);
            quests::update_progress(txn, &self.defs, account, &trigger, now, effects)?;
        }
        let trigger = Trigger::XpGained {
            total_xp: award.total_xp,
        };
        unlocked.extend(achievements::evaluate(
            txn, &self.defs, &self.policy, account, &trigger, now, effects,
        )?);
        quests::update_progress(txn, &self.defs, account, &trigger, now, effects)?;
        Ok(unlocked)
    }

    /// Mirror forum-owned counters onto the account row and append the
    /// stat log entry the windowed leaderboards read.
    fn mirror_stats(
        &self,
        txn: &WriteTxn,
        account: AccountId,
        trigger: &Trigger,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut row = txn
            .account(account)?
            .ok_or(Error::AccountNotFound(account))?;
        let stat = match trigger {
            Trigger::PostCreated { lifetime_posts } => {
                row.post_count = row.post_count.max(*lifetime_posts);
                Some(stat_kind::POST)
            }
            Trigger::CommentPosted { lifetime_comments } => {
                row.comment_count = row.comment_count.max(*lifetime_comments);
                Some(stat_kind::COMMENT)
            }
            Trigger::FollowerGained { follower_count } => {
                row.follower_count = row.follower_count.max(*follower_count);
                Some(stat_kind::FOLLOWER)
            }
            Trigger::LoginRecorded { streak_days } => {
                row.login_streak = *streak_days;
                Some(stat_kind::LOGIN)
            }
            _ => None,
        };
        let Some(stat) = stat else {
            return Ok(());
        };
        txn.put_account(row)?;
        let id = txn.next_id("stat")?;
        txn.push_stat_entry(StoredStatEntry {
            id,
            account: account.raw(),
            stat,
            at_ms: now.timestamp_millis(),
        })?;
        Ok(())
    }

    fn check_tradeable(&self, side: &TradeSide) -> Result<()> {
        for (item, _) in &side.items {
            match self.defs.items.get(item.as_str()) {
                None => return Err(Error::NotFound(format!("item '{}'", item))),
                Some(def) if !def.tradeable => {
                    return Err(Error::invalid_state(format!("item '{}' cannot be traded", item)));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn dispatch(&self, mut effects: Effects) {
        for effect in effects.drain() {
            match effect {
                SideEffect::Notify {
                    account,
                    kind,
                    title,
                    body,
                } => self.notifications.notify(account, &kind, &title, &body),
                SideEffect::Emit {
                    account,
                    event,
                    payload,
                } => self.events.emit(account, &event, &payload),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::sink::CollectingSink;
    use glimmer_defs::Loader;

    fn defs() -> Definitions {
        let mut loader = Loader::new();
        loader
            .load_achievements_str(
                r#"
                (
                    achievements: [
                        (
                            id: "first_post",
                            name: "First Post",
                            trigger: post_created,
                            criterion: LifetimeCount(threshold: 1),
                            reward: (sparkle: 25),
                        ),
                        (
                            id: "level_5",
                            name: "Rising Star",
                            trigger: level_reached,
                            criterion: LevelReached(level: 5),
                            reward: (premium: 10),
                        ),
                        (
                            id: "first_trade",
                            name: "Dealmaker",
                            trigger: trade_completed,
                            criterion: TradesCompleted(count: 1),
                        ),
                    ]
                )
                "#,
            )
            .unwrap();
        loader
            .load_quests_str(
                r#"
                (
                    quests: [
                        (
                            id: "daily_poster",
                            name: "Daily Poster",
                            kind: daily,
                            requirements: [
                                (key: "posts", trigger: post_created, count: 1),
                            ],
                            reward: (xp: 40),
                        ),
                    ]
                )
                "#,
            )
            .unwrap();
        loader
            .load_items_str(
                r#"
                (
                    items: [
                        (
                            id: "avatar_frame_neon",
                            name: "Neon Avatar Frame",
                            cost: Some((currency: sparkle, amount: 60)),
                        ),
                        (
                            id: "bound_trophy",
                            name: "Bound Trophy",
                            tradeable: false,
                        ),
                    ]
                )
                "#,
            )
            .unwrap();
        loader.finish().unwrap()
    }

    fn engine_with_sink() -> (Gamification, Arc<CollectingSink>, Arc<FixedClock>) {
        let sink = Arc::new(CollectingSink::new());
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let engine = Gamification::new(Store::in_memory().unwrap(), defs())
            .with_notifications(sink.clone())
            .with_events(sink.clone())
            .with_clock(clock.clone());
        engine.create_account(AccountId::new(1)).unwrap();
        engine.create_account(AccountId::new(2)).unwrap();
        (engine, sink, clock)
    }

    #[test]
    fn test_create_account_twice_fails() {
        let (engine, _, _) = engine_with_sink();
        let err = engine.create_account(AccountId::new(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_post_trigger_full_pipeline() {
        let (engine, sink, _) = engine_with_sink();
        let account = AccountId::new(1);

        let outcome = engine
            .on_trigger(account, Trigger::PostCreated { lifetime_posts: 1 })
            .unwrap();

        // Base XP for a post
        assert_eq!(outcome.xp.as_ref().unwrap().total_xp, 50);
        // Achievement unlocked on the first post
        assert_eq!(outcome.unlocked.len(), 1);
        assert_eq!(outcome.unlocked[0].id.as_str(), "first_post");
        // Daily quest assigned and completed by the same event
        let poster = outcome
            .quests
            .iter()
            .find(|q| q.quest.as_str() == "daily_poster")
            .unwrap();
        assert!(poster.newly_completed);
        assert_eq!(sink.count_notifications("achievement_unlocked"), 1);
        assert_eq!(sink.count_notifications("quest_completed"), 1);

        let stats = engine.get_user_stats(account).unwrap();
        assert_eq!(stats.xp, 50);
        assert_eq!(stats.sparkle, 25);
        assert_eq!(stats.unlocked_achievements, 1);
        assert_eq!(stats.claimable_quests, 1);
    }

    #[test]
    fn test_quest_claim_exactly_once_through_facade() {
        let (engine, _, _) = engine_with_sink();
        let account = AccountId::new(1);
        let quest = DefId::new("daily_poster");

        engine
            .on_trigger(account, Trigger::PostCreated { lifetime_posts: 1 })
            .unwrap();
        let reward = engine.claim_quest_rewards(account, &quest).unwrap();
        assert_eq!(reward.xp, 40);

        let err = engine.claim_quest_rewards(account, &quest).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        // XP granted once: 50 base + 40 quest
        assert_eq!(engine.get_user_stats(account).unwrap().xp, 90);
    }

    #[test]
    fn test_level_up_notification_after_commit() {
        let (engine, sink, _) = engine_with_sink();
        let account = AccountId::new(1);

        let award = engine.award_xp(account, 300, "bonus").unwrap();
        assert_eq!(award.new_level, Some(2));
        assert_eq!(sink.count_notifications("level_up"), 1);
    }

    #[test]
    fn test_level_achievement_via_follow_up() {
        let (engine, _, _) = engine_with_sink();
        let account = AccountId::new(1);

        // Straight to level 5 (floor 1500)
        engine.award_xp(account, 1500, "bonus").unwrap();
        let stats = engine.get_user_stats(account).unwrap();
        assert_eq!(stats.progress.level, 5);
        // "level_5" unlocked, paying premium on top of the every-5th bonus
        assert!(stats.premium >= 10);
        assert_eq!(stats.unlocked_achievements, 1);
    }

    #[test]
    fn test_purchase_item() {
        let (engine, _, _) = engine_with_sink();
        let account = AccountId::new(1);
        let item = DefId::new("avatar_frame_neon");

        let err = engine.purchase_item(account, &item, 1).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        // Failed purchase left no inventory behind
        assert!(engine.get_inventory(account).unwrap().is_empty());

        engine.award_xp(account, 300, "bonus").unwrap(); // level 2 pays 200 sparkle
        let owned = engine.purchase_item(account, &item, 1).unwrap();
        assert_eq!(owned, 1);
        assert_eq!(engine.get_user_stats(account).unwrap().sparkle, 140);
    }

    #[test]
    fn test_unknown_item_purchase() {
        let (engine, _, _) = engine_with_sink();
        let err = engine
            .purchase_item(AccountId::new(1), &DefId::new("ghost"), 1)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_trade_through_facade_unlocks_achievement() {
        let (engine, sink, _) = engine_with_sink();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        engine.award_xp(a, 300, "seed").unwrap();
        engine.award_xp(b, 300, "seed").unwrap();

        let id = engine
            .propose_trade(
                a,
                b,
                TradeSide { items: vec![], sparkle: 50, premium: 0 },
                TradeSide { items: vec![], sparkle: 20, premium: 0 },
                Some("deal?".to_string()),
            )
            .unwrap();
        assert_eq!(sink.count_notifications("trade_proposed"), 1);

        let resolution = engine.respond_trade(id, b, true).unwrap();
        assert_eq!(resolution, TradeResolution::Completed);
        // Both parties unlocked the first-trade achievement
        assert_eq!(engine.get_user_stats(a).unwrap().unlocked_achievements, 1);
        assert_eq!(engine.get_user_stats(b).unwrap().unlocked_achievements, 1);
    }

    #[test]
    fn test_invalidated_trade_surfaces_typed_error() {
        let (engine, _, _) = engine_with_sink();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        engine.award_xp(a, 300, "seed").unwrap(); // 200 sparkle

        let id = engine
            .propose_trade(
                a,
                b,
                TradeSide { items: vec![], sparkle: 150, premium: 0 },
                TradeSide::empty(),
                None,
            )
            .unwrap();

        // Initiator spends below the committed amount before the response
        let frame = DefId::new("avatar_frame_neon");
        engine.purchase_item(a, &frame, 2).unwrap(); // 120 spent, 80 left

        let err = engine.respond_trade(id, b, true).unwrap_err();
        assert!(matches!(err, Error::TradeNoLongerValid(_)));
        // The cancellation itself persisted
        let err = engine.respond_trade(id, b, true).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_untradeable_item_rejected_at_propose() {
        let (engine, _, _) = engine_with_sink();
        let err = engine
            .propose_trade(
                AccountId::new(1),
                AccountId::new(2),
                TradeSide { items: vec![("bound_trophy".to_string(), 1)], sparkle: 0, premium: 0 },
                TradeSide::empty(),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_trade_expiry_via_clock() {
        let (engine, _, clock) = engine_with_sink();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        engine.award_xp(a, 300, "seed").unwrap();

        let id = engine
            .propose_trade(
                a,
                b,
                TradeSide { items: vec![], sparkle: 10, premium: 0 },
                TradeSide::empty(),
                None,
            )
            .unwrap();

        clock.advance(chrono::Duration::days(8));
        assert_eq!(engine.expire_trades().unwrap(), 1);
        let err = engine.respond_trade(id, b, true).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_late_response_is_invalid_state() {
        let (engine, _, clock) = engine_with_sink();
        let (a, b) = (AccountId::new(1), AccountId::new(2));
        engine.award_xp(a, 300, "seed").unwrap();

        let id = engine
            .propose_trade(
                a,
                b,
                TradeSide { items: vec![], sparkle: 10, premium: 0 },
                TradeSide::empty(),
                None,
            )
            .unwrap();

        // First response after the window already gets the typed error
        clock.advance(chrono::Duration::days(8));
        let err = engine.respond_trade(id, b, true).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        // The EXPIRED status persisted: the sweep finds nothing left to flip
        assert_eq!(engine.expire_trades().unwrap(), 0);
    }

    #[test]
    fn test_leaderboard_through_facade() {
        let (engine, _, _) = engine_with_sink();
        engine.award_xp(AccountId::new(1), 500, "seed").unwrap();
        engine.award_xp(AccountId::new(2), 900, "seed").unwrap();

        let board = engine
            .get_leaderboard(Metric::Xp, Scope::Global, Period::AllTime, 10)
            .unwrap();
        assert_eq!(board[0].account.raw(), 2);
        assert_eq!(board[0].score, 900);
    }

    #[test]
    fn test_stat_mirror_feeds_windowed_leaderboard() {
        let (engine, _, _) = engine_with_sink();
        let account = AccountId::new(1);
        for n in 1..=3 {
            engine
                .on_trigger(account, Trigger::PostCreated { lifetime_posts: n })
                .unwrap();
        }

        let board = engine
            .get_leaderboard(Metric::Posts, Scope::Global, Period::Day, 10)
            .unwrap();
        assert_eq!(board[0].account, account);
        assert_eq!(board[0].score, 3);
    }
}
