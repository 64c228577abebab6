//! Leaderboard aggregation
//!
//! All-time ranks sort the current account rows directly. Bounded periods
//! sum the append-only logs (XP entries, currency transactions, stat
//! entries) inside a rolling window, so they need no extra bookkeeping at
//! write time. Results are cached per (metric, scope, period) with a short
//! TTL; ranking reads are frequent and slightly stale results are fine.

use chrono::{DateTime, Duration, Utc};
use glimmer_core::{AccountId, Currency, Result};
use glimmer_store::{stat_kind, ReadTxn, Store};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// What a leaderboard ranks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Xp,
    Sparkle,
    Premium,
    Posts,
    Followers,
}

/// Which population is ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
}

/// The time window scores are summed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    AllTime,
    Day,
    Week,
    Month,
}

impl Period {
    /// Start of the rolling window ending at `now`; None for all-time.
    fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::AllTime => None,
            Period::Day => Some(now - Duration::days(1)),
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => Some(now - Duration::days(30)),
        }
    }
}

/// One ranked row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based rank
    pub rank: u32,
    /// Ranked account
    pub account: AccountId,
    /// Score under the requested metric and period
    pub score: u64,
}

type CacheKey = (Metric, Scope, Period);

struct CacheSlot {
    computed_at: DateTime<Utc>,
    entries: Vec<LeaderboardEntry>,
}

/// TTL-cached leaderboard access
///
/// Cache entries hold the full ranking; `limit` is applied on the way out
/// so different page sizes share one computation.
pub struct Leaderboards {
    ttl: Duration,
    cache: Mutex<HashMap<CacheKey, CacheSlot>>,
}

impl Leaderboards {
    /// Create with the given cache TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Rank accounts, serving from cache while fresh.
    pub fn get(
        &self,
        store: &Store,
        metric: Metric,
        scope: Scope,
        period: Period,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let key = (metric, scope, period);
        {
            let cache = self.cache.lock().unwrap();
            if let Some(slot) = cache.get(&key) {
                if now - slot.computed_at < self.ttl {
                    return Ok(slot.entries.iter().take(limit).cloned().collect());
                }
            }
        }

        let r = store.read()?;
        let entries = compute(&r, metric, period, now)?;
        let mut cache = self.cache.lock().unwrap();
        cache.insert(
            key,
            CacheSlot {
                computed_at: now,
                entries: entries.clone(),
            },
        );
        Ok(entries.into_iter().take(limit).collect())
    }

    /// Drop every cached ranking, forcing recomputation on next read.
    pub fn invalidate(&self) {
        self.cache.lock().unwrap().clear();
    }
}

impl Default for Leaderboards {
    fn default() -> Self {
        Self::new(Duration::minutes(5))
    }
}

/// Compute a full ranking. Ties break by ascending account ID so the order
/// is deterministic for pagination.
pub fn compute(
    r: &ReadTxn,
    metric: Metric,
    period: Period,
    now: DateTime<Utc>,
) -> Result<Vec<LeaderboardEntry>> {
    let scores: Vec<(AccountId, u64)> = match period.window_start(now) {
        None => all_time_scores(r, metric)?,
        Some(from) => windowed_scores(r, metric, from, now)?,
    };

    let mut scores = scores;
    scores.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    Ok(scores
        .into_iter()
        .enumerate()
        .map(|(i, (account, score))| LeaderboardEntry {
            rank: (i + 1) as u32,
            account,
            score,
        })
        .collect())
}

fn all_time_scores(r: &ReadTxn, metric: Metric) -> Result<Vec<(AccountId, u64)>> {
    Ok(r.all_accounts()?
        .iter()
        .map(|a| {
            let score = match metric {
                Metric::Xp => a.xp,
                Metric::Sparkle => a.sparkle,
                Metric::Premium => a.premium,
                Metric::Posts => a.post_count,
                Metric::Followers => a.follower_count,
            };
            (a.account_id(), score)
        })
        .collect())
}

fn windowed_scores(
    r: &ReadTxn,
    metric: Metric,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<(AccountId, u64)>> {
    let from_ms = from.timestamp_millis();
    let to_ms = to.timestamp_millis();
    // Inclusive at `to`: `to` is the query instant, and events written in
    // the same millisecond as the read still count.
    let in_window = |at_ms: i64| at_ms >= from_ms && at_ms <= to_ms;

    let mut sums: HashMap<u64, u64> = HashMap::new();
    match metric {
        Metric::Xp => {
            for e in r.all_xp_entries()? {
                if in_window(e.at_ms) {
                    *sums.entry(e.account).or_insert(0) += e.amount;
                }
            }
        }
        Metric::Sparkle | Metric::Premium => {
            let currency = if metric == Metric::Sparkle {
                Currency::Sparkle
            } else {
                Currency::Premium
            };
            // Windowed currency rank counts earnings, not net flow
            for t in r.all_txns()? {
                if in_window(t.at_ms) && t.currency() == currency && t.amount > 0 {
                    *sums.entry(t.account).or_insert(0) += t.amount as u64;
                }
            }
        }
        Metric::Posts | Metric::Followers => {
            let stat = if metric == Metric::Posts {
                stat_kind::POST
            } else {
                stat_kind::FOLLOWER
            };
            for e in r.all_stat_entries()? {
                if in_window(e.at_ms) && e.stat == stat {
                    *sums.entry(e.account).or_insert(0) += 1;
                }
            }
        }
    }

    Ok(sums
        .into_iter()
        .map(|(account, score)| (AccountId::new(account), score))
        .collect())
}
