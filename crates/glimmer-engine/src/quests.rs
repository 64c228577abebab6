//! Quest tracker
//!
//! Assignments move AVAILABLE -> IN_PROGRESS -> COMPLETED -> CLAIMED, with
//! EXPIRED as a side branch taken lazily whenever an overdue assignment is
//! touched. The daily rotation is a pure function of (account, day): two
//! concurrent refresh calls compute the same selection, so the second one
//! finds the rows already present and writes nothing new.

use crate::sink::Effects;
use crate::{inventory, ledger, xp};
use chrono::{DateTime, Duration, TimeZone, Utc};
use glimmer_core::{
    AccountId, Currency, DefId, Error, QuestStatus, Result, RewardBundle, RotationRng, Trigger,
    TxnKind,
};
use glimmer_defs::{Definitions, QuestDef, QuestKind};
use glimmer_store::{StoredAssignment, WriteTxn};
use serde::{Deserialize, Serialize};

/// How many daily quests each account gets per rotation.
const DAILY_ROTATION_SIZE: usize = 3;

/// Progress toward one requirement of an assigned quest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementProgress {
    /// Requirement key
    pub key: String,
    /// Current count
    pub current: u64,
    /// Count needed
    pub required: u64,
}

/// An assignment as presented to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestView {
    /// Quest definition ID
    pub quest: DefId,
    /// Display name
    pub name: String,
    /// Current state
    pub status: QuestStatus,
    /// Per-requirement progress
    pub requirements: Vec<RequirementProgress>,
    /// Reward claimable on completion
    pub reward: RewardBundle,
    /// End of the availability window
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a progress update for one assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestUpdate {
    /// Quest definition ID
    pub quest: DefId,
    /// State after the update
    pub status: QuestStatus,
    /// Whether this update crossed the completion boundary
    pub newly_completed: bool,
}

/// The rotation day label for an instant, "YYYY-MM-DD" UTC.
pub fn day_label(now: DateTime<Utc>) -> String {
    now.date_naive().format("%Y-%m-%d").to_string()
}

fn day_ordinal(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(86_400)
}

fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let next = now.date_naive() + Duration::days(1);
    Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Ensure the account has today's rotation, creating it on first access.
///
/// Selection: eligible daily definitions, shuffled by the deterministic
/// rotation RNG, first three taken. Eligibility covers the availability
/// window, the account's level, prerequisites (all previously claimed),
/// and the per-quest cooldown. Returns today's assignments either way.
pub fn refresh_daily(
    txn: &WriteTxn,
    defs: &Definitions,
    account: AccountId,
    now: DateTime<Utc>,
) -> Result<Vec<QuestView>> {
    let row = txn
        .account(account)?
        .ok_or(Error::AccountNotFound(account))?;
    let day = day_label(now);

    let existing = txn.assignments_for(account)?;
    let today_exists = existing.iter().any(|a| a.day == day);
    if !today_exists {
        let history = &existing;
        let mut eligible: Vec<&QuestDef> = defs
            .quests
            .values()
            .filter(|q| q.kind == QuestKind::Daily)
            .filter(|q| q.available_at(now))
            .filter(|q| q.min_level <= row.level)
            .filter(|q| prerequisites_claimed(history, q))
            .filter(|q| !on_cooldown(history, q, now))
            .collect();

        let mut rng = RotationRng::for_rotation(account, day_ordinal(now));
        rng.shuffle(&mut eligible);
        for def in eligible.into_iter().take(DAILY_ROTATION_SIZE) {
            txn.put_assignment(StoredAssignment::new(
                account,
                &def.id,
                &day,
                now,
                end_of_day(now),
            ))?;
        }
    }

    let mut views = Vec::new();
    for a in txn.assignments_for(account)? {
        if a.day != day {
            continue;
        }
        if let Some(def) = defs.quests.get(a.quest.as_str()) {
            views.push(view_of(&a, def));
        }
    }
    Ok(views)
}

fn prerequisites_claimed(history: &[StoredAssignment], def: &QuestDef) -> bool {
    def.prerequisites.iter().all(|prereq| {
        history
            .iter()
            .any(|a| a.quest == prereq.as_str() && a.quest_status() == QuestStatus::Claimed)
    })
}

fn on_cooldown(history: &[StoredAssignment], def: &QuestDef, now: DateTime<Utc>) -> bool {
    if def.cooldown_days == 0 {
        return false;
    }
    let horizon = now - Duration::days(def.cooldown_days as i64);
    history.iter().any(|a| {
        a.quest == def.id.as_str()
            && a.claimed_at_ms
                .map(|ms| ms > horizon.timestamp_millis())
                .unwrap_or(false)
    })
}

/// Advance progress on active assignments for a trigger event.
///
/// Session-scoped requirements count one per qualifying event in the
/// assignment's own blob; lifetime requirements take the cumulative count
/// carried on the trigger payload. Any overdue non-terminal assignment,
/// including one completed but never claimed, flips to EXPIRED here
/// instead of progressing.
pub fn update_progress(
    txn: &WriteTxn,
    defs: &Definitions,
    account: AccountId,
    trigger: &Trigger,
    now: DateTime<Utc>,
    effects: &mut Effects,
) -> Result<Vec<QuestUpdate>> {
    let mut updates = Vec::new();
    for mut a in txn.assignments_for(account)? {
        let status = a.quest_status();
        if status.is_terminal() {
            continue;
        }
        if a.is_past_expiry(now) {
            a.set_status(QuestStatus::Expired);
            txn.put_assignment(a)?;
            continue;
        }
        if !status.accepts_progress() {
            continue;
        }
        let Some(def) = defs.quests.get(a.quest.as_str()) else {
            continue;
        };
        if !def.requirements.iter().any(|r| r.trigger == trigger.kind()) {
            continue;
        }

        let mut map = a.progress_map();
        for req in &def.requirements {
            if req.trigger != trigger.kind() {
                continue;
            }
            let entry = map.entry(req.key.clone()).or_insert(0);
            if req.session_scoped {
                *entry += 1;
            } else if let Some(lifetime) = trigger.lifetime_count() {
                *entry = (*entry).max(lifetime);
            }
        }
        a.set_progress_map(&map);

        let complete = def
            .requirements
            .iter()
            .all(|r| map.get(&r.key).copied().unwrap_or(0) >= r.count);
        let newly_completed = complete;
        if complete {
            a.set_status(QuestStatus::Completed);
            a.completed_at_ms = Some(now.timestamp_millis());
            effects.notify(
                account,
                "quest_completed",
                format!("Quest complete: {}", def.name),
                "Rewards are ready to claim".to_string(),
            );
            effects.emit(
                account,
                "quest_completed",
                vec![("quest".to_string(), def.id.to_string())],
            );
        } else if status == QuestStatus::Available {
            a.set_status(QuestStatus::InProgress);
        }
        let quest = DefId::new(a.quest.clone());
        let new_status = a.quest_status();
        txn.put_assignment(a)?;
        updates.push(QuestUpdate {
            quest,
            status: new_status,
            newly_completed,
        });
    }
    Ok(updates)
}

/// Claim the reward of a completed assignment, exactly once.
///
/// The null `claimed_at` gate and the reward grant commit together, so a
/// raced or retried claim either sees CLAIMED and fails or is the single
/// payer. Claiming from any state but COMPLETED is `InvalidState`, and a
/// completed assignment whose availability window has elapsed expires
/// instead of paying out.
pub fn claim(
    txn: &WriteTxn,
    defs: &Definitions,
    policy: &xp::LevelPolicy,
    account: AccountId,
    quest: &DefId,
    now: DateTime<Utc>,
    effects: &mut Effects,
) -> Result<RewardBundle> {
    let def = defs
        .quests
        .get(quest.as_str())
        .ok_or_else(|| Error::NotFound(format!("quest '{}'", quest)))?;

    let mut rows: Vec<StoredAssignment> = txn
        .assignments_for(account)?
        .into_iter()
        .filter(|a| a.quest == quest.as_str())
        .collect();
    rows.sort_by(|a, b| a.started_at_ms.cmp(&b.started_at_ms));
    let Some(mut assignment) = rows.into_iter().last() else {
        return Err(Error::NotFound(format!(
            "no assignment of quest '{}'",
            quest
        )));
    };

    if !assignment.quest_status().is_terminal() && assignment.is_past_expiry(now) {
        assignment.set_status(QuestStatus::Expired);
        txn.put_assignment(assignment)?;
        return Err(Error::invalid_state(format!(
            "quest '{}' expired before it was claimed",
            quest
        )));
    }

    if assignment.quest_status() != QuestStatus::Completed || assignment.claimed_at_ms.is_some() {
        return Err(Error::invalid_state(format!(
            "quest '{}' is {:?}, not claimable",
            quest,
            assignment.quest_status()
        )));
    }

    assignment.set_status(QuestStatus::Claimed);
    assignment.claimed_at_ms = Some(now.timestamp_millis());
    txn.put_assignment(assignment)?;

    let reason = format!("quest:{}", quest);
    if def.reward.xp > 0 {
        xp::award_xp(txn, policy, account, def.reward.xp, &reason, now, effects)?;
    }
    if def.reward.sparkle > 0 {
        ledger::award(
            txn,
            account,
            def.reward.sparkle,
            Currency::Sparkle,
            TxnKind::Earned,
            &reason,
            Some(quest.to_string()),
            now,
        )?;
    }
    if def.reward.premium > 0 {
        ledger::award(
            txn,
            account,
            def.reward.premium,
            Currency::Premium,
            TxnKind::Earned,
            &reason,
            Some(quest.to_string()),
            now,
        )?;
    }
    for grant in &def.reward.items {
        inventory::grant(txn, account, &grant.item, grant.quantity, "quest")?;
    }

    effects.notify(
        account,
        "quest_claimed",
        format!("Claimed: {}", def.name),
        def.description.clone(),
    );
    Ok(def.reward.clone())
}

/// Number of completed-but-unclaimed assignments.
pub fn claimable_count(txn: &WriteTxn, account: AccountId) -> Result<usize> {
    Ok(txn
        .assignments_for(account)?
        .iter()
        .filter(|a| a.quest_status() == QuestStatus::Completed && a.claimed_at_ms.is_none())
        .count())
}

fn view_of(a: &StoredAssignment, def: &QuestDef) -> QuestView {
    let map = a.progress_map();
    QuestView {
        quest: def.id.clone(),
        name: def.name.clone(),
        status: a.quest_status(),
        requirements: def
            .requirements
            .iter()
            .map(|r| RequirementProgress {
                key: r.key.clone(),
                current: map.get(&r.key).copied().unwrap_or(0),
                required: r.count,
            })
            .collect(),
        reward: def.reward.clone(),
        expires_at: a.expires_at(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmer_defs::Loader;
    use glimmer_store::{Store, StoredAccount};

    fn defs() -> Definitions {
        let mut loader = Loader::new();
        loader
            .load_quests_str(
                r#"
                (
                    quests: [
                        (
                            id: "daily_poster",
                            name: "Daily Poster",
                            description: "Create a post today",
                            kind: daily,
                            requirements: [
                                (key: "posts", trigger: post_created, count: 1),
                            ],
                            reward: (xp: 50, sparkle: 20),
                        ),
                        (
                            id: "daily_reactor",
                            name: "Daily Reactor",
                            kind: daily,
                            requirements: [
                                (key: "reactions", trigger: reaction_given, count: 3),
                            ],
                            reward: (sparkle: 15),
                        ),
                        (
                            id: "daily_commenter",
                            name: "Daily Commenter",
                            kind: daily,
                            requirements: [
                                (key: "comments", trigger: comment_posted, count: 2),
                            ],
                        ),
                        (
                            id: "elite_quest",
                            name: "Elite",
                            kind: daily,
                            min_level: 10,
                            requirements: [
                                (key: "posts", trigger: post_created, count: 5),
                            ],
                        ),
                    ]
                )
                "#,
            )
            .unwrap();
        loader.finish().unwrap()
    }

    fn fixture() -> (Store, AccountId) {
        let store = Store::in_memory().unwrap();
        let account = AccountId::new(1);
        let w = store.write().unwrap();
        w.put_account(StoredAccount::new(account, Utc::now())).unwrap();
        w.commit().unwrap();
        (store, account)
    }

    #[test]
    fn test_rotation_assigns_three_and_is_idempotent() {
        let (store, account) = fixture();
        let defs = defs();
        let now = Utc::now();

        let w = store.write().unwrap();
        let first = refresh_daily(&w, &defs, account, now).unwrap();
        // Level-gated quest excluded; three eligible remain
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|v| v.status == QuestStatus::Available));
        assert!(!first.iter().any(|v| v.quest.as_str() == "elite_quest"));

        let again = refresh_daily(&w, &defs, account, now).unwrap();
        assert_eq!(again.len(), 3);
        w.commit().unwrap();
    }

    #[test]
    fn test_rotation_deterministic_across_calls() {
        let defs = defs();
        let now = Utc::now();

        let pick = |store: &Store| {
            let w = store.write().unwrap();
            let mut ids: Vec<String> = refresh_daily(&w, &defs, AccountId::new(9), now)
                .unwrap()
                .iter()
                .map(|v| v.quest.to_string())
                .collect();
            w.commit().unwrap();
            ids.sort();
            ids
        };

        let store_a = Store::in_memory().unwrap();
        let store_b = Store::in_memory().unwrap();
        for store in [&store_a, &store_b] {
            let w = store.write().unwrap();
            w.put_account(StoredAccount::new(AccountId::new(9), now)).unwrap();
            w.commit().unwrap();
        }
        assert_eq!(pick(&store_a), pick(&store_b));
    }

    #[test]
    fn test_progress_to_completion() {
        let (store, account) = fixture();
        let defs = defs();
        let now = Utc::now();
        let mut effects = Effects::new();

        let w = store.write().unwrap();
        refresh_daily(&w, &defs, account, now).unwrap();

        let updates = update_progress(
            &w,
            &defs,
            account,
            &Trigger::ReactionGiven,
            now,
            &mut effects,
        )
        .unwrap();
        let reactor = updates
            .iter()
            .find(|u| u.quest.as_str() == "daily_reactor")
            .unwrap();
        assert_eq!(reactor.status, QuestStatus::InProgress);
        assert!(!reactor.newly_completed);

        for _ in 0..2 {
            update_progress(&w, &defs, account, &Trigger::ReactionGiven, now, &mut effects)
                .unwrap();
        }
        let views = refresh_daily(&w, &defs, account, now).unwrap();
        let reactor = views
            .iter()
            .find(|v| v.quest.as_str() == "daily_reactor")
            .unwrap();
        assert_eq!(reactor.status, QuestStatus::Completed);
        assert_eq!(reactor.requirements[0].current, 3);
        w.commit().unwrap();
    }

    #[test]
    fn test_claim_exactly_once() {
        let (store, account) = fixture();
        let defs = defs();
        let now = Utc::now();
        let policy = xp::LevelPolicy::default();
        let mut effects = Effects::new();
        let quest = DefId::new("daily_poster");

        let w = store.write().unwrap();
        refresh_daily(&w, &defs, account, now).unwrap();
        update_progress(
            &w,
            &defs,
            account,
            &Trigger::PostCreated { lifetime_posts: 1 },
            now,
            &mut effects,
        )
        .unwrap();

        let reward = claim(&w, &defs, &policy, account, &quest, now, &mut effects).unwrap();
        assert_eq!(reward.xp, 50);
        assert_eq!(reward.sparkle, 20);
        let row = w.account(account).unwrap().unwrap();
        assert_eq!(row.xp, 50);
        assert_eq!(row.sparkle, 20);

        let err = claim(&w, &defs, &policy, account, &quest, now, &mut effects).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        // No second payout
        assert_eq!(w.account(account).unwrap().unwrap().xp, 50);
    }

    #[test]
    fn test_claim_uncompleted_rejected() {
        let (store, account) = fixture();
        let defs = defs();
        let now = Utc::now();
        let policy = xp::LevelPolicy::default();
        let mut effects = Effects::new();

        let w = store.write().unwrap();
        refresh_daily(&w, &defs, account, now).unwrap();
        let err = claim(
            &w,
            &defs,
            &policy,
            account,
            &DefId::new("daily_poster"),
            now,
            &mut effects,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_lazy_expiry_blocks_progress() {
        let (store, account) = fixture();
        let defs = defs();
        let now = Utc::now();
        let mut effects = Effects::new();

        let w = store.write().unwrap();
        refresh_daily(&w, &defs, account, now).unwrap();

        // Tomorrow: every active assignment from today is overdue
        let later = now + Duration::days(2);
        let updates = update_progress(
            &w,
            &defs,
            account,
            &Trigger::PostCreated { lifetime_posts: 1 },
            later,
            &mut effects,
        )
        .unwrap();
        assert!(updates.is_empty());

        let expired = txn_statuses(&w, account);
        assert!(expired.iter().any(|s| *s == QuestStatus::Expired));
        assert!(!expired.iter().any(|s| *s == QuestStatus::Completed));
    }

    #[test]
    fn test_claim_rejected_after_window_elapsed() {
        let (store, account) = fixture();
        let defs = defs();
        let now = Utc::now();
        let policy = xp::LevelPolicy::default();
        let mut effects = Effects::new();
        let quest = DefId::new("daily_poster");

        let w = store.write().unwrap();
        refresh_daily(&w, &defs, account, now).unwrap();
        update_progress(
            &w,
            &defs,
            account,
            &Trigger::PostCreated { lifetime_posts: 1 },
            now,
            &mut effects,
        )
        .unwrap();

        // Completed, but the claim only arrives a month later
        let late = now + Duration::days(30);
        let err = claim(&w, &defs, &policy, account, &quest, late, &mut effects).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        // No payout, and the assignment landed in EXPIRED
        let row = w.account(account).unwrap().unwrap();
        assert_eq!(row.xp, 0);
        assert_eq!(row.sparkle, 0);
        assert!(txn_statuses(&w, account)
            .iter()
            .any(|s| *s == QuestStatus::Expired));
    }

    #[test]
    fn test_completed_but_unclaimed_expires_in_sweep() {
        let (store, account) = fixture();
        let defs = defs();
        let now = Utc::now();
        let mut effects = Effects::new();

        let w = store.write().unwrap();
        refresh_daily(&w, &defs, account, now).unwrap();
        update_progress(
            &w,
            &defs,
            account,
            &Trigger::PostCreated { lifetime_posts: 1 },
            now,
            &mut effects,
        )
        .unwrap();

        // An unrelated trigger two days on still expires the stale win
        let later = now + Duration::days(2);
        update_progress(&w, &defs, account, &Trigger::ReactionGiven, later, &mut effects)
            .unwrap();
        let poster = w
            .assignments_for(account)
            .unwrap()
            .into_iter()
            .find(|a| a.quest == "daily_poster")
            .unwrap();
        assert_eq!(poster.quest_status(), QuestStatus::Expired);
    }

    fn txn_statuses(w: &WriteTxn, account: AccountId) -> Vec<QuestStatus> {
        w.assignments_for(account)
            .unwrap()
            .iter()
            .map(|a| a.quest_status())
            .collect()
    }

    #[test]
    fn test_day_label() {
        let at = Utc.with_ymd_and_hms(2026, 8, 30, 15, 0, 0).unwrap();
        assert_eq!(day_label(at), "2026-08-30");
        assert_eq!(end_of_day(at), Utc.with_ymd_and_hms(2026, 8, 31, 0, 0, 0).unwrap());
    }
}
