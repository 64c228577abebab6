//! Account row model

use chrono::{DateTime, TimeZone, Utc};
use glimmer_core::AccountId;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored account in the database.
///
/// `xp` is monotonically non-decreasing and `sparkle`/`premium` never go
/// negative; both invariants are enforced by the engine inside a single
/// write transaction. The forum-owned counters (posts, comments, followers,
/// streak) are mirrors updated from trigger payloads, kept here so
/// criteria and leaderboards read engine-owned durable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredAccount {
    /// Primary key - account ID.
    #[primary_key]
    pub id: u64,
    /// Cumulative experience.
    pub xp: u64,
    /// Level derived from `xp`, persisted for direct sorting.
    pub level: u32,
    /// Sparkle point balance.
    pub sparkle: u64,
    /// Premium point balance.
    pub premium: u64,
    /// Mirrored lifetime post count.
    pub post_count: u64,
    /// Mirrored lifetime comment count.
    pub comment_count: u64,
    /// Mirrored follower count.
    pub follower_count: u64,
    /// Mirrored login streak in days.
    pub login_streak: u32,
    /// Bumped on every mutation; stale-read detection for callers.
    pub version: u64,
    /// Creation time, epoch milliseconds.
    pub created_at_ms: i64,
}

impl StoredAccount {
    /// Create a fresh account row at level 1 with empty balances.
    pub fn new(id: AccountId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.raw(),
            xp: 0,
            level: 1,
            sparkle: 0,
            premium: 0,
            post_count: 0,
            comment_count: 0,
            follower_count: 0,
            login_streak: 0,
            version: 0,
            created_at_ms: created_at.timestamp_millis(),
        }
    }

    /// The typed account ID.
    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.id)
    }

    /// Balance of the given currency.
    pub fn balance(&self, currency: glimmer_core::Currency) -> u64 {
        match currency {
            glimmer_core::Currency::Sparkle => self.sparkle,
            glimmer_core::Currency::Premium => self.premium,
        }
    }

    /// Set the balance of the given currency.
    pub fn set_balance(&mut self, currency: glimmer_core::Currency, value: u64) {
        match currency {
            glimmer_core::Currency::Sparkle => self.sparkle = value,
            glimmer_core::Currency::Premium => self.premium = value,
        }
    }

    /// Creation time as a chrono instant.
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.created_at_ms)
            .single()
            .unwrap_or_default()
    }
}
