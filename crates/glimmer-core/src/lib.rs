//! Glimmer Core - Domain types for the gamification engine
//!
//! This crate provides the pure, storage-free building blocks:
//! - Identifiers for accounts, definitions, and trades
//! - Currency, transaction, and reward types
//! - The level curve and its closed-form inversion
//! - The trigger taxonomy driving achievement/quest evaluation
//! - A deterministic RNG for daily quest rotation
//! - The error taxonomy shared across the engine

mod currency;
mod error;
mod identity;
pub mod level;
mod rng;
mod state;
mod trigger;

pub use currency::{Currency, ItemGrant, RewardBundle, TxnKind};
pub use error::{Error, Result};
pub use identity::{AccountId, DefId, TradeId};
pub use level::{level_for_xp, xp_floor, LevelProgress};
pub use rng::RotationRng;
pub use state::{QuestStatus, TradeStatus};
pub use trigger::{Trigger, TriggerKind};
