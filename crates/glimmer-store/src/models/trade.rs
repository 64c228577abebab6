//! Trade and inventory row models

use chrono::{DateTime, Utc};
use glimmer_core::{AccountId, DefId, TradeId, TradeStatus};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// What one party puts into a trade: items plus points of each currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSide {
    /// (item id, quantity) pairs.
    pub items: Vec<(String, u32)>,
    /// Sparkle points.
    pub sparkle: u64,
    /// Premium points.
    pub premium: u64,
}

impl TradeSide {
    /// A side containing nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the side carries no items or points.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.sparkle == 0 && self.premium == 0
    }
}

/// Stored trade row.
///
/// Status transitions are monotonic; a completed trade means ownership was
/// exchanged exactly once, inside the same write transaction that set the
/// status. Nothing is escrowed while PENDING; execution re-validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 6, version = 1)]
#[native_db]
pub struct StoredTrade {
    /// Primary key - sequence-generated.
    #[primary_key]
    pub id: u64,
    /// Proposing account.
    #[secondary_key]
    pub initiator: u64,
    /// Responding account.
    #[secondary_key]
    pub recipient: u64,
    /// What the initiator gives.
    pub offer: TradeSide,
    /// What the initiator asks of the recipient.
    pub request: TradeSide,
    /// Status, encoded (see `encode_status`).
    pub status: u8,
    /// Optional message from the initiator.
    pub message: Option<String>,
    /// Proposal time, epoch milliseconds.
    pub created_at_ms: i64,
    /// Expiry time, epoch milliseconds.
    pub expires_at_ms: i64,
    /// Completion time, if completed.
    pub completed_at_ms: Option<i64>,
}

impl StoredTrade {
    /// Encode a trade status.
    pub fn encode_status(status: TradeStatus) -> u8 {
        match status {
            TradeStatus::Pending => 0,
            TradeStatus::Rejected => 1,
            TradeStatus::Cancelled => 2,
            TradeStatus::Expired => 3,
            TradeStatus::Completed => 4,
        }
    }

    /// Decode a trade status.
    pub fn decode_status(raw: u8) -> TradeStatus {
        match raw {
            0 => TradeStatus::Pending,
            1 => TradeStatus::Rejected,
            2 => TradeStatus::Cancelled,
            3 => TradeStatus::Expired,
            _ => TradeStatus::Completed,
        }
    }

    /// The typed status of this row.
    pub fn trade_status(&self) -> TradeStatus {
        Self::decode_status(self.status)
    }

    /// Set the status.
    pub fn set_status(&mut self, status: TradeStatus) {
        self.status = Self::encode_status(status);
    }

    /// The typed trade ID.
    pub fn trade_id(&self) -> TradeId {
        TradeId::new(self.id)
    }

    /// Whether the expiry window has elapsed.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at_ms
    }
}

/// Per-(account, item) inventory row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 7, version = 1)]
#[native_db]
pub struct StoredInventory {
    /// Primary key - "{account}:{item}".
    #[primary_key]
    pub key: String,
    /// Owning account.
    #[secondary_key]
    pub account: u64,
    /// Item definition ID.
    pub item: String,
    /// Number of copies owned.
    pub quantity: u32,
    /// Whether the item is currently equipped.
    pub equipped: bool,
    /// How the first copy was acquired ("purchase", "trade", "reward").
    pub source: String,
    /// Optional expiry, epoch milliseconds.
    pub expires_at_ms: Option<i64>,
}

impl StoredInventory {
    /// Compose the primary key for a pair.
    pub fn key_for(account: AccountId, item: &DefId) -> String {
        format!("{}:{}", account.raw(), item.as_str())
    }

    /// Create a fresh row with the given quantity.
    pub fn new(account: AccountId, item: &DefId, quantity: u32, source: &str) -> Self {
        Self {
            key: Self::key_for(account, item),
            account: account.raw(),
            item: item.as_str().to_string(),
            quantity,
            equipped: false,
            source: source.to_string(),
            expires_at_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_status_round_trip() {
        for s in [
            TradeStatus::Pending,
            TradeStatus::Rejected,
            TradeStatus::Cancelled,
            TradeStatus::Expired,
            TradeStatus::Completed,
        ] {
            assert_eq!(StoredTrade::decode_status(StoredTrade::encode_status(s)), s);
        }
    }

    #[test]
    fn test_trade_side_empty() {
        assert!(TradeSide::empty().is_empty());
        let side = TradeSide {
            items: vec![("pin".to_string(), 1)],
            sparkle: 0,
            premium: 0,
        };
        assert!(!side.is_empty());
    }

    #[test]
    fn test_inventory_key() {
        let key = StoredInventory::key_for(AccountId::new(3), &DefId::new("avatar_frame"));
        assert_eq!(key, "3:avatar_frame");
    }
}
