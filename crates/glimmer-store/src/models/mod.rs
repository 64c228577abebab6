//! Stored row models for the database

mod account;
mod ledger;
mod quest;
mod trade;

pub use account::StoredAccount;
pub use ledger::{stat_kind, StoredStatEntry, StoredTxn, StoredXpEntry};
pub use quest::{StoredAssignment, StoredProgress};
pub use trade::{StoredInventory, StoredTrade, TradeSide};

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Sequence counter for generated primary keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 9, version = 1)]
#[native_db]
pub struct StoredSequence {
    /// Sequence name ("txn", "xp", "trade", "stat").
    #[primary_key]
    pub name: String,
    /// Next value to hand out.
    pub next: u64,
}
