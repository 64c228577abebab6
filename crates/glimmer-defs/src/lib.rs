//! Glimmer Defs - RON loader and schema for gamification content
//!
//! Loads static configuration from RON files:
//! - Achievement definitions (trigger, criterion, reward, rarity)
//! - Quest definitions (kind, requirements, reward, gating)
//! - Item definitions (store cost, tradeability)
//!
//! Definitions are loaded once at startup into an immutable [`Definitions`]
//! registry that is passed into the engine's constructor; the engine never
//! consults ambient global state.

mod error;
mod loader;
mod schema;

pub use error::{Error, Result};
pub use loader::{Definitions, Loader};
pub use schema::achievement::{AchievementDef, AchievementDefs, Criterion, Rarity};
pub use schema::item::{ItemCost, ItemDef, ItemDefs};
pub use schema::quest::{QuestDef, QuestDefs, QuestKind, QuestRequirement};
