//! The protocol engine the client drives.
//!
//! The client never encodes packets itself. It relies on a [`Transport`]
//! that owns the socket and the MQTT v5 session, much like a threaded
//! mosquitto handle: every method may be called from any thread, and
//! [`Transport::run`] is called in a loop from the client's network thread
//! to read packets and dispatch the resulting events.

use std::{sync::Arc, time::Duration};

use herald_core::{properties::Properties, qos::QoS, reason::ReasonCode};
use thiserror::Error;

use crate::{broker::BrokerCandidate, event::EventHandler, options::Will};

/// Identifier a transport assigns to a message it accepted for sending.
pub type MessageId = u32;

/// Errors reported by a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection refused: {0}")]
    Refused(ReasonCode),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Session parameters used for every connect attempt.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub client_id: String,
    pub keep_alive: Duration,
    pub session_expiry_interval: Duration,
    pub will: Option<Will>,
    pub tcp_nodelay: bool,
}

/// A message handed to the transport for sending.
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub qos: QoS,
    pub properties: Option<&'a Properties>,
}

/// Per-subscription options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Do not deliver messages published by this same client.
    pub no_local: bool,
}

impl SubscribeOptions {
    pub fn no_local() -> Self {
        Self { no_local: true }
    }
}

/// A session-oriented pub/sub protocol engine.
pub trait Transport: Send + Sync {
    /// Open a new session with `broker`. Success means the connect packet
    /// was sent; the outcome arrives later through
    /// [`EventHandler::on_connect`].
    fn connect(
        &self,
        broker: &BrokerCandidate,
        params: &ConnectParams,
    ) -> Result<(), TransportError>;

    /// Reconnect to the broker used by the last successful `connect`.
    fn reconnect(&self) -> Result<(), TransportError>;

    /// Run one iteration of the network loop, waiting at most `timeout`
    /// for traffic. Events are dispatched to `handler` on the calling
    /// thread without any transport lock held. Returns an error once the
    /// session is down.
    fn run(&self, timeout: Duration, handler: &dyn EventHandler) -> Result<(), TransportError>;

    fn publish(&self, request: &PublishRequest<'_>) -> Result<MessageId, TransportError>;

    fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        options: SubscribeOptions,
    ) -> Result<(), TransportError>;

    fn unsubscribe(&self, filter: &str) -> Result<(), TransportError>;

    /// Close the session. A pending [`Transport::run`] must return soon after.
    ///
    /// `session_expiry` overrides the interval sent at connect time, so
    /// `Some(Duration::ZERO)` ends the session and releases the will now.
    fn disconnect(
        &self,
        reason: ReasonCode,
        session_expiry: Option<Duration>,
    ) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn connect(
        &self,
        broker: &BrokerCandidate,
        params: &ConnectParams,
    ) -> Result<(), TransportError> {
        (**self).connect(broker, params)
    }

    fn reconnect(&self) -> Result<(), TransportError> {
        (**self).reconnect()
    }

    fn run(&self, timeout: Duration, handler: &dyn EventHandler) -> Result<(), TransportError> {
        (**self).run(timeout, handler)
    }

    fn publish(&self, request: &PublishRequest<'_>) -> Result<MessageId, TransportError> {
        (**self).publish(request)
    }

    fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        options: SubscribeOptions,
    ) -> Result<(), TransportError> {
        (**self).subscribe(filter, qos, options)
    }

    fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        (**self).unsubscribe(filter)
    }

    fn disconnect(
        &self,
        reason: ReasonCode,
        session_expiry: Option<Duration>,
    ) -> Result<(), TransportError> {
        (**self).disconnect(reason, session_expiry)
    }
}
