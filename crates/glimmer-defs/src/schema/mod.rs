//! Schema definitions for RON content files

pub mod achievement;
pub mod item;
pub mod quest;

pub use achievement::AchievementDef;
pub use item::ItemDef;
pub use quest::QuestDef;
