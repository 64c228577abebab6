//! Achievement progress and quest assignment row models

use chrono::{DateTime, TimeZone, Utc};
use glimmer_core::{AccountId, DefId, QuestStatus};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-(account, achievement) progress row.
///
/// Created lazily on first evaluation. Once `unlocked_at_ms` is set it is
/// never cleared; the reward grant commits in the same transaction as the
/// unlock, which is what makes the unlock at-most-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredProgress {
    /// Primary key - "{account}:{achievement}".
    #[primary_key]
    pub key: String,
    /// Owning account.
    #[secondary_key]
    pub account: u64,
    /// Achievement definition ID.
    pub achievement: String,
    /// Current progress value.
    pub progress: u64,
    /// Threshold required to unlock.
    pub required: u64,
    /// Unlock time, epoch milliseconds; None until unlocked.
    pub unlocked_at_ms: Option<i64>,
}

impl StoredProgress {
    /// Compose the primary key for a pair.
    pub fn key_for(account: AccountId, achievement: &DefId) -> String {
        format!("{}:{}", account.raw(), achievement.as_str())
    }

    /// Create a fresh progress row.
    pub fn new(account: AccountId, achievement: &DefId, required: u64) -> Self {
        Self {
            key: Self::key_for(account, achievement),
            account: account.raw(),
            achievement: achievement.as_str().to_string(),
            progress: 0,
            required,
            unlocked_at_ms: None,
        }
    }

    /// Whether the achievement has been unlocked.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at_ms.is_some()
    }
}

/// Per-(account, quest, day) assignment row.
///
/// The `progress` blob is a bincoded requirement-key → count map. For
/// session-scoped requirements this blob is the source of truth; it is not
/// recomputable from the ledger if lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 5, version = 1)]
#[native_db]
pub struct StoredAssignment {
    /// Primary key - "{account}:{quest}:{day}".
    #[primary_key]
    pub key: String,
    /// Owning account.
    #[secondary_key]
    pub account: u64,
    /// Quest definition ID.
    pub quest: String,
    /// Rotation day, "YYYY-MM-DD".
    pub day: String,
    /// Status, encoded (see `encode_status`).
    pub status: u8,
    /// Bincoded requirement-key → count map.
    pub progress: Vec<u8>,
    /// Assignment time, epoch milliseconds.
    pub started_at_ms: i64,
    /// Completion time, if reached.
    pub completed_at_ms: Option<i64>,
    /// Claim time, if claimed. Null gates the exactly-once payout.
    pub claimed_at_ms: Option<i64>,
    /// End of the availability window, epoch milliseconds.
    pub expires_at_ms: i64,
}

impl StoredAssignment {
    /// Compose the primary key for a triple.
    pub fn key_for(account: AccountId, quest: &DefId, day: &str) -> String {
        format!("{}:{}:{}", account.raw(), quest.as_str(), day)
    }

    /// Create a fresh AVAILABLE assignment.
    pub fn new(
        account: AccountId,
        quest: &DefId,
        day: &str,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key: Self::key_for(account, quest, day),
            account: account.raw(),
            quest: quest.as_str().to_string(),
            day: day.to_string(),
            status: Self::encode_status(QuestStatus::Available),
            progress: Vec::new(),
            started_at_ms: started_at.timestamp_millis(),
            completed_at_ms: None,
            claimed_at_ms: None,
            expires_at_ms: expires_at.timestamp_millis(),
        }
    }

    /// Encode a quest status.
    pub fn encode_status(status: QuestStatus) -> u8 {
        match status {
            QuestStatus::Available => 0,
            QuestStatus::InProgress => 1,
            QuestStatus::Completed => 2,
            QuestStatus::Claimed => 3,
            QuestStatus::Expired => 4,
            QuestStatus::Locked => 5,
        }
    }

    /// Decode a quest status.
    pub fn decode_status(raw: u8) -> QuestStatus {
        match raw {
            0 => QuestStatus::Available,
            1 => QuestStatus::InProgress,
            2 => QuestStatus::Completed,
            3 => QuestStatus::Claimed,
            4 => QuestStatus::Expired,
            _ => QuestStatus::Locked,
        }
    }

    /// The typed status of this row.
    pub fn quest_status(&self) -> QuestStatus {
        Self::decode_status(self.status)
    }

    /// Set the status.
    pub fn set_status(&mut self, status: QuestStatus) {
        self.status = Self::encode_status(status);
    }

    /// Decode the progress blob.
    pub fn progress_map(&self) -> BTreeMap<String, u64> {
        if self.progress.is_empty() {
            BTreeMap::new()
        } else {
            bincode::deserialize(&self.progress).unwrap_or_default()
        }
    }

    /// Encode and store the progress blob.
    pub fn set_progress_map(&mut self, map: &BTreeMap<String, u64>) {
        self.progress = bincode::serialize(map).unwrap_or_default();
    }

    /// Whether the availability window has elapsed.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at_ms
    }

    /// Expiry instant as chrono.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.expires_at_ms)
            .single()
            .unwrap_or_default()
    }
}
