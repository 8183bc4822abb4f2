use herald_core::{message::Message, reason::ReasonCode};

use crate::transport::MessageId;

/// Callbacks a transport dispatches from inside [`Transport::run`].
///
/// All callbacks run on the network thread. Implementations take the
/// client lock briefly and must not block.
///
/// [`Transport::run`]: crate::transport::Transport::run
pub trait EventHandler: Send + Sync {
    /// The broker answered a connect or reconnect attempt.
    fn on_connect(&self, result: Result<(), ReasonCode>);

    /// The session went down.
    fn on_disconnect(&self, reason: DisconnectReason);

    /// A message arrived on a subscribed topic.
    fn on_message(&self, message: Message);

    /// A published message completed its QoS flow (for QoS 0, once written).
    fn on_publish(&self, id: MessageId, reason: ReasonCode);
}

/// Reason for disconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Client initiated disconnect.
    ClientInitiated,

    /// Server initiated disconnect.
    ServerInitiated(ReasonCode),

    /// Connection lost (network error or missed keep-alive).
    ConnectionLost,
}
