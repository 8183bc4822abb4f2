//! Outbound message records.

use std::sync::OnceLock;

use bytes::Bytes;
use herald_core::{properties::Properties, qos::QoS, reason::ReasonCode};

use crate::{
    admission::Priority,
    arena::Slot,
    error::ClientError,
    transport::{MessageId, PublishRequest},
};

/// Terminal result of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Delivered,
    Rejected(ReasonCode),
    SendFailed,
    ConnectionLost,
}

impl Outcome {
    pub(crate) fn into_result(self) -> Result<(), ClientError> {
        match self {
            Outcome::Delivered => Ok(()),
            Outcome::Rejected(reason) => Err(ClientError::Rejected(reason)),
            Outcome::SendFailed => Err(ClientError::SendFailed),
            Outcome::ConnectionLost => Err(ClientError::ConnectionLost),
        }
    }
}

/// One publish request, shared between the queue or map holding it and,
/// for synchronous publishes, the waiting caller.
///
/// The arena slot is released when the last `Arc` to the message drops.
#[derive(Debug)]
pub(crate) struct OutboundMessage {
    pub topic: String,
    pub qos: QoS,
    pub priority: Priority,
    pub sync: bool,
    pub seq: u64,
    /// Only filled for messages parked in the waiting queue.
    pub payload: Option<Bytes>,
    pub properties: Option<Properties>,
    id: OnceLock<MessageId>,
    outcome: OnceLock<Outcome>,
    _slot: Slot,
}

impl OutboundMessage {
    /// A message sent straight to the wire; payload stays with the caller.
    pub(crate) fn direct(
        slot: Slot,
        seq: u64,
        request: &PublishRequest<'_>,
        priority: Priority,
        sync: bool,
    ) -> Self {
        Self::new(slot, seq, request, priority, sync, None, None)
    }

    /// A message that outlives the publish call and owns copies of its data.
    pub(crate) fn queued(
        slot: Slot,
        seq: u64,
        request: &PublishRequest<'_>,
        priority: Priority,
        sync: bool,
    ) -> Self {
        let payload = (!request.payload.is_empty()).then(|| Bytes::copy_from_slice(request.payload));
        let properties = request.properties.cloned();
        Self::new(slot, seq, request, priority, sync, payload, properties)
    }

    fn new(
        slot: Slot,
        seq: u64,
        request: &PublishRequest<'_>,
        priority: Priority,
        sync: bool,
        payload: Option<Bytes>,
        properties: Option<Properties>,
    ) -> Self {
        Self {
            topic: request.topic.to_string(),
            qos: request.qos,
            priority,
            sync,
            seq,
            payload,
            properties,
            id: OnceLock::new(),
            outcome: OnceLock::new(),
            _slot: slot,
        }
    }

    /// Request built from the message's own copies.
    pub(crate) fn as_request(&self) -> PublishRequest<'_> {
        PublishRequest {
            topic: &self.topic,
            payload: self.payload.as_deref().unwrap_or_default(),
            qos: self.qos,
            properties: self.properties.as_ref(),
        }
    }

    /// Transport id, set once the message is on the wire.
    pub(crate) fn id(&self) -> Option<MessageId> {
        self.id.get().copied()
    }

    pub(crate) fn set_id(&self, id: MessageId) {
        let _ = self.id.set(id);
    }

    pub(crate) fn outcome(&self) -> Option<Outcome> {
        self.outcome.get().copied()
    }

    pub(crate) fn set_outcome(&self, outcome: Outcome) {
        let _ = self.outcome.set(outcome);
    }
}
