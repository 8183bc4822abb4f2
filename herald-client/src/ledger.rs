//! Local record of the subscriptions the client wants the broker to hold.

use std::collections::HashMap;

use herald_core::qos::QoS;

/// Desired state of one topic filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// Subscribed (or to be subscribed on reconnect) with this QoS.
    Active(QoS),
    /// Unsubscribed while offline; the broker must be told on reconnect.
    PendingRemoval,
}

/// Request to replay against the broker after a reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resubscribe {
    Subscribe(String, QoS),
    Unsubscribe(String),
}

/// Topic filter → desired subscription state. Keys are the translated
/// filters sent to the broker, so `org/*` is stored as `org/#`.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionLedger {
    entries: HashMap<String, Subscription>,
}

impl SubscriptionLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, filter: &str) -> Option<Subscription> {
        self.entries.get(filter).copied()
    }

    /// Set the state of `filter`, returning what it replaced.
    pub(crate) fn insert(&mut self, filter: &str, subscription: Subscription) -> Option<Subscription> {
        self.entries.insert(filter.to_string(), subscription)
    }

    pub(crate) fn remove(&mut self, filter: &str) -> Option<Subscription> {
        self.entries.remove(filter)
    }

    /// Put `filter` back to a state returned by `insert` or `remove`.
    pub(crate) fn restore(&mut self, filter: &str, previous: Option<Subscription>) {
        match previous {
            Some(subscription) => {
                self.entries.insert(filter.to_string(), subscription);
            }
            None => {
                self.entries.remove(filter);
            }
        }
    }

    pub(crate) fn mark_pending_removal(&mut self, filter: &str) {
        self.insert(filter, Subscription::PendingRemoval);
    }

    /// Requests that bring a fresh session in line with the ledger.
    ///
    /// Tombstones are dropped from the ledger as their unsubscribe is
    /// handed out.
    pub(crate) fn resubscribe_plan(&mut self) -> Vec<Resubscribe> {
        let mut plan = Vec::with_capacity(self.entries.len());
        self.entries.retain(|filter, subscription| match *subscription {
            Subscription::Active(qos) => {
                plan.push(Resubscribe::Subscribe(filter.clone(), qos));
                true
            }
            Subscription::PendingRemoval => {
                plan.push(Resubscribe::Unsubscribe(filter.clone()));
                false
            }
        });
        plan
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
