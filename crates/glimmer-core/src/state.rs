//! State machines for quest assignments and trades
//!
//! Both machines are monotonic: once a terminal state is reached no
//! backward transition exists. Transition legality lives here so the store
//! and engine share one source of truth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a quest assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Assigned, no progress yet
    Available,
    /// At least one requirement has progress
    InProgress,
    /// All requirements met, reward not yet claimed
    Completed,
    /// Reward claimed (terminal)
    Claimed,
    /// Availability window elapsed before completion or claim (terminal)
    Expired,
    /// Prerequisite or level gate not yet satisfied
    Locked,
}

impl QuestStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestStatus::Claimed | QuestStatus::Expired)
    }

    /// Whether progress updates apply in this state
    pub fn accepts_progress(&self) -> bool {
        matches!(self, QuestStatus::Available | QuestStatus::InProgress)
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestStatus::Available => "available",
            QuestStatus::InProgress => "in_progress",
            QuestStatus::Completed => "completed",
            QuestStatus::Claimed => "claimed",
            QuestStatus::Expired => "expired",
            QuestStatus::Locked => "locked",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle of a two-party trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Awaiting the recipient's response
    Pending,
    /// Recipient declined (terminal)
    Rejected,
    /// Withdrawn by the initiator, or failed execute-time re-validation (terminal)
    Cancelled,
    /// No response within the expiry window (terminal)
    Expired,
    /// Accepted and atomically executed (terminal)
    Completed,
}

impl TradeStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Pending)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Rejected => "rejected",
            TradeStatus::Cancelled => "cancelled",
            TradeStatus::Expired => "expired",
            TradeStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quest_terminal() {
        assert!(QuestStatus::Claimed.is_terminal());
        assert!(QuestStatus::Expired.is_terminal());
        assert!(!QuestStatus::Completed.is_terminal());
        assert!(QuestStatus::InProgress.accepts_progress());
        assert!(!QuestStatus::Completed.accepts_progress());
    }

    #[test]
    fn test_trade_terminal() {
        assert!(!TradeStatus::Pending.is_terminal());
        assert!(TradeStatus::Completed.is_terminal());
        assert!(TradeStatus::Cancelled.is_terminal());
    }
}
