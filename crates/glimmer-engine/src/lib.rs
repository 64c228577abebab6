//! Glimmer Engine - gamification logic over the store
//!
//! The engine composes:
//! - the currency ledger (non-negative balances, append-only transaction log)
//! - the XP award and level-up flow
//! - the achievement evaluator (at-most-once unlocks)
//! - the quest tracker (daily rotation, state machine, exactly-once claims)
//! - the trading engine (propose/respond/execute with optimistic re-validation)
//! - the leaderboard aggregator (TTL-cached ranked snapshots)
//!
//! All of it fronted by [`Gamification`], the facade external flows call.
//! Every facade operation is one store write transaction; notification and
//! realtime-event side effects are collected during the operation and
//! dispatched to the configured sinks strictly after commit.

pub mod achievements;
mod clock;
mod facade;
pub mod inventory;
pub mod leaderboard;
pub mod ledger;
pub mod quests;
mod sink;
pub mod trade;
pub mod xp;

pub use achievements::UnlockedAchievement;
pub use clock::{Clock, FixedClock, SystemClock};
pub use facade::{Gamification, TriggerOutcome, UserStats};
pub use leaderboard::{LeaderboardEntry, Leaderboards, Metric, Period, Scope};
pub use quests::{QuestUpdate, QuestView};
pub use sink::{CollectingSink, Effects, EventSink, NotificationSink, NullSink, SideEffect};
pub use trade::TradeResolution;
pub use xp::{LevelPolicy, XpAward};

pub use glimmer_core::{Error, Result};
