//! Trigger taxonomy
//!
//! A trigger is an external event classification that causes the engine to
//! re-evaluate achievements and quest progress. Triggers that correspond to
//! counters owned by the forum (posts, comments, followers, login streak)
//! carry the durable lifetime count in their payload, so criteria evaluation
//! stays a deterministic function of durable state rather than an in-memory
//! counter. Engine-owned counters (currency earned, trades completed) are
//! queried from the engine's own tables instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An external event entering the gamification engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// A post was created; carries the author's lifetime post count
    PostCreated { lifetime_posts: u64 },
    /// A comment was posted; carries the author's lifetime comment count
    CommentPosted { lifetime_comments: u64 },
    /// The account gave a reaction
    ReactionGiven,
    /// One of the account's posts received a reaction; carries that post's new total
    ReactionReceived { post_reactions: u64 },
    /// The account gained a follower; carries the new follower count
    FollowerGained { follower_count: u64 },
    /// The account logged in; carries the consecutive-day streak length
    LoginRecorded { streak_days: u32 },
    /// The account completed a trade
    TradeCompleted,
    /// The account purchased an item from the store
    PurchaseMade,
    /// The account reached a new level
    LevelReached { level: u32 },
    /// The account's cumulative XP changed
    XpGained { total_xp: u64 },
}

impl Trigger {
    /// The fieldless classification used by definitions to subscribe
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::PostCreated { .. } => TriggerKind::PostCreated,
            Trigger::CommentPosted { .. } => TriggerKind::CommentPosted,
            Trigger::ReactionGiven => TriggerKind::ReactionGiven,
            Trigger::ReactionReceived { .. } => TriggerKind::ReactionReceived,
            Trigger::FollowerGained { .. } => TriggerKind::FollowerGained,
            Trigger::LoginRecorded { .. } => TriggerKind::LoginRecorded,
            Trigger::TradeCompleted => TriggerKind::TradeCompleted,
            Trigger::PurchaseMade => TriggerKind::PurchaseMade,
            Trigger::LevelReached { .. } => TriggerKind::LevelReached,
            Trigger::XpGained { .. } => TriggerKind::XpGained,
        }
    }

    /// The lifetime count carried by the payload, if this trigger has one
    pub fn lifetime_count(&self) -> Option<u64> {
        match self {
            Trigger::PostCreated { lifetime_posts } => Some(*lifetime_posts),
            Trigger::CommentPosted { lifetime_comments } => Some(*lifetime_comments),
            Trigger::FollowerGained { follower_count } => Some(*follower_count),
            Trigger::LoginRecorded { streak_days } => Some(*streak_days as u64),
            _ => None,
        }
    }
}

/// Fieldless trigger classification, referenced from RON definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    PostCreated,
    CommentPosted,
    ReactionGiven,
    ReactionReceived,
    FollowerGained,
    LoginRecorded,
    TradeCompleted,
    PurchaseMade,
    LevelReached,
    XpGained,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerKind::PostCreated => "post_created",
            TriggerKind::CommentPosted => "comment_posted",
            TriggerKind::ReactionGiven => "reaction_given",
            TriggerKind::ReactionReceived => "reaction_received",
            TriggerKind::FollowerGained => "follower_gained",
            TriggerKind::LoginRecorded => "login_recorded",
            TriggerKind::TradeCompleted => "trade_completed",
            TriggerKind::PurchaseMade => "purchase_made",
            TriggerKind::LevelReached => "level_reached",
            TriggerKind::XpGained => "xp_gained",
        };
        write!(f, "{}", s)
    }
}
