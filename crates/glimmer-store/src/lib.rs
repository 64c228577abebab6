//! Glimmer Store - Persistence layer using native_db
//!
//! Provides durable storage for:
//! - Accounts (XP, level, balances, mirrored forum counters)
//! - Append-only currency transaction and XP logs
//! - Achievement progress and quest assignments
//! - Trades, inventories, and stat log entries
//!
//! The store hands out transaction wrappers rather than committing per
//! call: a facade operation opens one [`WriteTxn`], composes every row
//! mutation of its logical unit, and commits once. native_db serializes
//! writers, which is what makes concurrent spends on one account safe.

mod error;
mod models;
mod store;

pub use error::{Error, Result};
pub use models::{
    stat_kind, StoredAccount, StoredAssignment, StoredInventory, StoredProgress, StoredStatEntry,
    StoredTrade, StoredTxn, StoredXpEntry, TradeSide,
};
pub use store::{ReadTxn, Store, WriteTxn};
