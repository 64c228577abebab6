//! Error taxonomy for the gamification engine
//!
//! Everything here except `Store` and `Config` is an expected business
//! condition: it is returned to the facade's caller for user-facing
//! messaging and never leaves partial state behind (the store transaction
//! aborts with it). `Store` and `Config` are the unrecoverable ones.

use crate::{AccountId, Currency, DefId};
use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("insufficient {currency}: need {needed}, have {available}")]
    InsufficientFunds {
        currency: Currency,
        needed: u64,
        available: u64,
    },

    #[error("insufficient inventory of '{item}': need {needed}, have {available}")]
    InsufficientInventory {
        item: DefId,
        needed: u32,
        available: u32,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("cannot trade with yourself")]
    SelfReferenceNotAllowed,

    #[error("trade can no longer be executed: {0}")]
    TradeNoLongerValid(String),

    #[error("concurrent modification detected, retry the operation")]
    ConcurrencyConflict,

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an `InvalidState` with a formatted message
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Whether this is an expected business condition rather than a fault
    pub fn is_business(&self) -> bool {
        !matches!(self, Error::Store(_) | Error::Config(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_classification() {
        let err = Error::InsufficientFunds {
            currency: Currency::Sparkle,
            needed: 100,
            available: 50,
        };
        assert!(err.is_business());
        assert!(!Error::Store("io".into()).is_business());
    }

    #[test]
    fn test_display() {
        let err = Error::InsufficientFunds {
            currency: Currency::Sparkle,
            needed: 100,
            available: 50,
        };
        assert_eq!(
            err.to_string(),
            "insufficient sparkle_points: need 100, have 50"
        );
    }
}
