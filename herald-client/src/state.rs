use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    arena::MessageArena,
    broker::{BrokerCandidate, RegistrationId},
    ledger::SubscriptionLedger,
    message::OutboundMessage,
    transport::MessageId,
};

/// Lifecycle of the broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Shutdown,
}

/// Point-in-time counters, mostly useful for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientStats {
    pub capacity: usize,
    pub in_use: usize,
    pub waiting: usize,
    pub publishing: usize,
    pub published: usize,
    pub subscriptions: usize,
    pub brokers: usize,
}

/// Everything guarded by the client mutex.
pub(crate) struct State {
    pub connected: bool,
    pub connection: ConnectionState,
    /// Set once the broker accepted the current connect attempt.
    pub session_established: bool,
    pub parallel_capacity: usize,
    /// Queued messages, highest priority first, FIFO within a priority.
    pub waiting: VecDeque<Arc<OutboundMessage>>,
    /// Messages on the wire, keyed by transport id.
    pub publishing: HashMap<MessageId, Arc<OutboundMessage>>,
    /// Finished synchronous messages, keyed by sequence number.
    pub published: HashMap<u64, Arc<OutboundMessage>>,
    pub subscriptions: SubscriptionLedger,
    pub brokers: HashMap<RegistrationId, Arc<BrokerCandidate>>,
    pub using_broker: Option<RegistrationId>,
    // Declared last: every message above must be gone before the arena drops.
    pub arena: MessageArena,
}

impl State {
    pub(crate) fn new(arena: MessageArena, parallel_capacity: usize) -> Self {
        Self {
            connected: false,
            connection: ConnectionState::Disconnected,
            session_established: false,
            parallel_capacity,
            waiting: VecDeque::new(),
            publishing: HashMap::new(),
            published: HashMap::new(),
            subscriptions: SubscriptionLedger::new(),
            brokers: HashMap::new(),
            using_broker: None,
            arena,
        }
    }

    pub(crate) fn stats(&self) -> ClientStats {
        ClientStats {
            capacity: self.arena.capacity(),
            in_use: self.arena.in_use(),
            waiting: self.waiting.len(),
            publishing: self.publishing.len(),
            published: self.published.len(),
            subscriptions: self.subscriptions.len(),
            brokers: self.brokers.len(),
        }
    }
}
