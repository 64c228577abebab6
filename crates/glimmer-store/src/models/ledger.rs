//! Append-only log row models: currency transactions, XP entries, stat events

use glimmer_core::{Currency, TxnKind};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Immutable currency transaction row.
///
/// The sum of `amount` over an account's rows equals its current balance;
/// rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredTxn {
    /// Primary key - sequence-generated.
    #[primary_key]
    pub id: u64,
    /// Owning account.
    #[secondary_key]
    pub account: u64,
    /// Signed amount: positive for credits, negative for debits.
    pub amount: i64,
    /// Currency, encoded (0 = sparkle, 1 = premium).
    pub currency: u8,
    /// Transaction kind, encoded (0 = earned, 1 = spent, 2 = transferred, 3 = refunded).
    pub kind: u8,
    /// Source tag ("level_reward", "quest:daily_poster", ...).
    pub reason: String,
    /// Optional reference to the causing entity (item, trade, quest).
    pub reference: Option<String>,
    /// Balance after applying this row.
    pub balance_after: u64,
    /// Creation time, epoch milliseconds.
    pub at_ms: i64,
}

impl StoredTxn {
    /// Encode a currency.
    pub fn encode_currency(currency: Currency) -> u8 {
        match currency {
            Currency::Sparkle => 0,
            Currency::Premium => 1,
        }
    }

    /// Decode a currency.
    pub fn decode_currency(raw: u8) -> Currency {
        match raw {
            0 => Currency::Sparkle,
            _ => Currency::Premium,
        }
    }

    /// Encode a transaction kind.
    pub fn encode_kind(kind: TxnKind) -> u8 {
        match kind {
            TxnKind::Earned => 0,
            TxnKind::Spent => 1,
            TxnKind::Transferred => 2,
            TxnKind::Refunded => 3,
        }
    }

    /// Decode a transaction kind.
    pub fn decode_kind(raw: u8) -> TxnKind {
        match raw {
            0 => TxnKind::Earned,
            1 => TxnKind::Spent,
            2 => TxnKind::Transferred,
            _ => TxnKind::Refunded,
        }
    }

    /// The typed currency of this row.
    pub fn currency(&self) -> Currency {
        Self::decode_currency(self.currency)
    }

    /// The typed kind of this row.
    pub fn txn_kind(&self) -> TxnKind {
        Self::decode_kind(self.kind)
    }
}

/// Immutable XP log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredXpEntry {
    /// Primary key - sequence-generated.
    #[primary_key]
    pub id: u64,
    /// Owning account.
    #[secondary_key]
    pub account: u64,
    /// XP gained (always positive; XP never decreases).
    pub amount: u64,
    /// Source tag.
    pub reason: String,
    /// Cumulative XP after this entry.
    pub total_after: u64,
    /// Creation time, epoch milliseconds.
    pub at_ms: i64,
}

/// Kinds of mirrored forum stat events.
pub mod stat_kind {
    pub const POST: u8 = 0;
    pub const COMMENT: u8 = 1;
    pub const FOLLOWER: u8 = 2;
    pub const LOGIN: u8 = 3;
}

/// One mirrored forum event (post created, follower gained, ...).
///
/// Enables windowed post/follower leaderboards from engine-owned state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 8, version = 1)]
#[native_db]
pub struct StoredStatEntry {
    /// Primary key - sequence-generated.
    #[primary_key]
    pub id: u64,
    /// Owning account.
    #[secondary_key]
    pub account: u64,
    /// Stat kind (see [`stat_kind`]).
    pub stat: u8,
    /// Event time, epoch milliseconds.
    pub at_ms: i64,
}
