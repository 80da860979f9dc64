//! Change notification for rule mutations.
//!
//! Listeners are plain callbacks registered with the manager. Events fire
//! only after a mutation is durable in some backend, so a listener never
//! observes state that later rolls back.

use crate::model::Rule;

/// A durable mutation of the rule set.
#[derive(Debug, Clone)]
pub enum RuleEvent {
    Added(Rule),
    Removed(Rule),
    Updated(Rule),
    Cleared { removed: usize },
}

pub type RuleListener = Box<dyn Fn(&RuleEvent)>;

/// Handle for one subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<(u64, RuleListener)>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: Fn(&RuleEvent) + 'static,
    {
        self.next_id += 1;
        self.listeners.push((self.next_id, Box::new(listener)));
        Subscription(self.next_id)
    }

    /// Removes a subscription. Returns false when the handle is stale.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription.0);
        self.listeners.len() != before
    }

    pub fn emit(&self, event: &RuleEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
