//! Side-effect sinks
//!
//! Notifications and realtime events are collected during an operation and
//! dispatched only after the store transaction commits. Sinks are
//! fire-and-forget: they return nothing, and a slow or failing sink can
//! never roll back gamification state.

use glimmer_core::AccountId;
use std::sync::Mutex;

/// A side effect recorded during an operation, dispatched after commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// A user-facing notification (inbox, push)
    Notify {
        account: AccountId,
        kind: String,
        title: String,
        body: String,
    },
    /// A realtime UI event (level-up animation, achievement popup)
    Emit {
        account: AccountId,
        event: String,
        payload: Vec<(String, String)>,
    },
}

/// Ordered collection of pending side effects
#[derive(Debug, Default)]
pub struct Effects {
    pending: Vec<SideEffect>,
}

impl Effects {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification
    pub fn notify(
        &mut self,
        account: AccountId,
        kind: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) {
        self.pending.push(SideEffect::Notify {
            account,
            kind: kind.into(),
            title: title.into(),
            body: body.into(),
        });
    }

    /// Queue a realtime event
    pub fn emit(
        &mut self,
        account: AccountId,
        event: impl Into<String>,
        payload: Vec<(String, String)>,
    ) {
        self.pending.push(SideEffect::Emit {
            account,
            event: event.into(),
            payload,
        });
    }

    /// Drain all pending effects
    pub fn drain(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.pending)
    }

    /// Number of pending effects
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Delivery target for notifications
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification; best-effort
    fn notify(&self, account: AccountId, kind: &str, title: &str, body: &str);
}

/// Delivery target for realtime events
pub trait EventSink: Send + Sync {
    /// Deliver an event; best-effort
    fn emit(&self, account: AccountId, event: &str, payload: &[(String, String)]);
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _account: AccountId, _kind: &str, _title: &str, _body: &str) {}
}

impl EventSink for NullSink {
    fn emit(&self, _account: AccountId, _event: &str, _payload: &[(String, String)]) {}
}

/// Sink that records everything, for tests
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Recorded effects in dispatch order
    pub recorded: Mutex<Vec<SideEffect>>,
}

impl CollectingSink {
    /// Create an empty collecting sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn all(&self) -> Vec<SideEffect> {
        self.recorded.lock().unwrap().clone()
    }

    /// Count of recorded notifications of a given kind
    pub fn count_notifications(&self, kind: &str) -> usize {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SideEffect::Notify { kind: k, .. } if k == kind))
            .count()
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, account: AccountId, kind: &str, title: &str, body: &str) {
        self.recorded.lock().unwrap().push(SideEffect::Notify {
            account,
            kind: kind.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, account: AccountId, event: &str, payload: &[(String, String)]) {
        self.recorded.lock().unwrap().push(SideEffect::Emit {
            account,
            event: event.to_string(),
            payload: payload.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_drain() {
        let mut effects = Effects::new();
        effects.notify(AccountId::new(1), "level_up", "Level up!", "You reached level 2");
        effects.emit(AccountId::new(1), "level_up", vec![]);
        assert_eq!(effects.len(), 2);

        let drained = effects.drain();
        assert_eq!(drained.len(), 2);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.notify(AccountId::new(1), "quest_completed", "Done", "Quest complete");
        sink.notify(AccountId::new(1), "level_up", "Up", "Level 2");
        assert_eq!(sink.count_notifications("quest_completed"), 1);
        assert_eq!(sink.all().len(), 2);
    }
}
