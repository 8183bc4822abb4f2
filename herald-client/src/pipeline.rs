//! Routing of outbound messages between the waiting queue, the publishing
//! map and the published map.
//!
//! All functions here run with the client mutex held.

use std::{mem, sync::Arc};

use herald_core::reason::ReasonCode;
use tracing::{debug, error, trace, warn};

use crate::{
    admission::{self, Priority},
    error::{ClientError, Result},
    message::{OutboundMessage, Outcome},
    state::State,
    transport::{MessageId, PublishRequest, Transport, TransportError},
};

impl State {
    pub(crate) fn has_room_for(&self, priority: Priority) -> bool {
        admission::admits(self.arena.capacity(), self.arena.in_use(), priority)
    }

    pub(crate) fn is_publishing_full(&self) -> bool {
        self.publishing.len() >= self.parallel_capacity
    }

    /// Send `request` right away if there is a live connection and room in
    /// flight, otherwise park a copy of it in the waiting queue.
    pub(crate) fn submit<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        seq: u64,
        request: &PublishRequest<'_>,
        priority: Priority,
        sync: bool,
    ) -> Result<Arc<OutboundMessage>> {
        let slot = self.arena.alloc().ok_or(ClientError::TooManyPending)?;

        if self.connected && !self.is_publishing_full() {
            let message = Arc::new(OutboundMessage::direct(slot, seq, request, priority, sync));
            self.send(transport, &message, request)?;
            Ok(message)
        } else {
            let message = Arc::new(OutboundMessage::queued(slot, seq, request, priority, sync));
            self.enqueue_waiting(Arc::clone(&message));
            Ok(message)
        }
    }

    fn send<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        message: &Arc<OutboundMessage>,
        request: &PublishRequest<'_>,
    ) -> std::result::Result<(), TransportError> {
        let id = transport.publish(request).map_err(|e| {
            error!(
                "Failed to publish topic {} with qos {:?}: {}",
                message.topic, message.qos, e
            );
            e
        })?;
        trace!("Publishing message {} as id {}", message.seq, id);
        message.set_id(id);
        if self.publishing.insert(id, Arc::clone(message)).is_some() {
            warn!("Transport reused in-flight message id {}", id);
        }
        Ok(())
    }

    /// Insert behind the last message of equal or higher priority.
    pub(crate) fn enqueue_waiting(&mut self, message: Arc<OutboundMessage>) {
        let position = self
            .waiting
            .iter()
            .rposition(|queued| queued.priority >= message.priority)
            .map_or(0, |index| index + 1);
        self.waiting.insert(position, message);
    }

    /// Move waiting messages onto the wire while there is room in flight.
    /// A message the transport refuses is completed as failed, not retried.
    pub(crate) fn drain_waiting<T: Transport + ?Sized>(&mut self, transport: &T) {
        if !self.connected {
            return;
        }
        while !self.is_publishing_full() {
            let Some(message) = self.waiting.pop_front() else {
                break;
            };
            let request = message.as_request();
            if let Err(e) = self.send(transport, &message, &request) {
                error!("Failed to publish waiting message {}: {}", message.topic, e);
                self.complete(message, Outcome::SendFailed);
            }
        }
    }

    /// Record the outcome of a finished message. Synchronous messages move
    /// to the published map for their waiter; asynchronous ones are
    /// released here.
    pub(crate) fn complete(&mut self, message: Arc<OutboundMessage>, outcome: Outcome) {
        if !message.sync {
            return;
        }
        message.set_outcome(outcome);
        self.published.insert(message.seq, message);
    }

    pub(crate) fn on_publish_acknowledged<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        id: MessageId,
        reason: ReasonCode,
    ) {
        match self.publishing.remove(&id) {
            Some(message) => {
                let outcome = if reason.is_publish_success() {
                    Outcome::Delivered
                } else {
                    Outcome::Rejected(reason)
                };
                self.complete(message, outcome);
            }
            None => debug!("No publishing message for id {}", id),
        }
        self.drain_waiting(transport);
    }

    /// Fail every at-most-once message; the session cannot redeliver them.
    /// Higher QoS messages stay where they are and are resent by the
    /// transport's session resumption.
    pub(crate) fn drop_at_most_once(&mut self) {
        let dropped: Vec<MessageId> = self
            .publishing
            .iter()
            .filter(|(_, message)| !message.qos.survives_reconnect())
            .map(|(id, _)| *id)
            .collect();
        for id in dropped {
            if let Some(message) = self.publishing.remove(&id) {
                warn!(
                    "Disconnected, dropping publishing message with qos 0: {}",
                    message.topic
                );
                self.complete(message, Outcome::ConnectionLost);
            }
        }

        for message in mem::take(&mut self.waiting) {
            if !message.qos.survives_reconnect() {
                warn!(
                    "Disconnected, dropping waiting message with qos 0: {}",
                    message.topic
                );
                self.complete(message, Outcome::ConnectionLost);
            } else {
                self.waiting.push_back(message);
            }
        }
    }

    pub(crate) fn take_published(&mut self, seq: u64) -> Option<Arc<OutboundMessage>> {
        self.published.remove(&seq)
    }

    /// Remove `message` from whichever structure holds it.
    pub(crate) fn remove_message(&mut self, message: &Arc<OutboundMessage>) {
        if self.published.remove(&message.seq).is_some() {
            return;
        }
        if let Some(id) = message.id() {
            let held = self
                .publishing
                .get(&id)
                .map_or(false, |m| Arc::ptr_eq(m, message));
            if held {
                self.publishing.remove(&id);
                return;
            }
        }
        if let Some(position) = self.waiting.iter().position(|m| Arc::ptr_eq(m, message)) {
            self.waiting.remove(position);
        }
    }

    /// Release every message the client still holds.
    pub(crate) fn release_all(&mut self) {
        self.waiting.clear();
        self.publishing.clear();
        self.published.clear();
    }
}
