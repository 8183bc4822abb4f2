//! Transport callbacks. They run on the network thread and re-enter the
//! client state under its lock.

use herald_core::{message::Message, reason::ReasonCode};
use tracing::{debug, error, info, trace, warn};

use crate::{
    client::Inner,
    event::{DisconnectReason, EventHandler},
    ledger::Resubscribe,
    state::ConnectionState,
    transport::{MessageId, SubscribeOptions, Transport},
};

impl<T: Transport> Inner<T> {
    /// Mark the client offline and fail what the broker cannot redeliver.
    pub(crate) fn handle_disconnect(&self, reason: DisconnectReason) {
        {
            let mut state = self.lock();
            state.connected = false;
            if state.connection != ConnectionState::Shutdown {
                state.connection = ConnectionState::Disconnected;
            }
            state.drop_at_most_once();
        }
        info!("Disconnected from broker: {:?}", reason);
        self.message_status_changed.notify_all();
    }
}

impl<T: Transport> EventHandler for Inner<T> {
    fn on_connect(&self, result: Result<(), ReasonCode>) {
        if let Err(reason) = result {
            error!("Broker refused connection: {}", reason);
            return;
        }
        info!("Connected to broker");

        {
            let mut state = self.lock();
            state.connected = true;
            state.session_established = true;
            state.connection = ConnectionState::Connected;

            for action in state.subscriptions.resubscribe_plan() {
                match action {
                    Resubscribe::Subscribe(filter, qos) => {
                        if let Err(e) =
                            self.transport
                                .subscribe(&filter, qos, SubscribeOptions::no_local())
                        {
                            error!("Failed to subscribe topic {} with qos {:?}: {}", filter, qos, e);
                        }
                    }
                    Resubscribe::Unsubscribe(filter) => {
                        if let Err(e) = self.transport.unsubscribe(&filter) {
                            warn!("Failed to unsubscribe topic {}: {}", filter, e);
                        }
                    }
                }
            }

            state.drain_waiting(&self.transport);
        }
        self.message_status_changed.notify_all();

        if let Some(callback) = &self.on_connected {
            callback();
        }
    }

    fn on_disconnect(&self, reason: DisconnectReason) {
        self.handle_disconnect(reason);
    }

    fn on_message(&self, message: Message) {
        trace!("Received message on topic {}", message.topic);
        match &self.on_message {
            Some(callback) => callback(message),
            None => debug!("No message callback, dropping message on {}", message.topic),
        }
    }

    fn on_publish(&self, id: MessageId, reason: ReasonCode) {
        trace!("Publish {} completed: {}", id, reason);
        {
            let mut state = self.lock();
            state.on_publish_acknowledged(&self.transport, id, reason);
        }
        self.message_status_changed.notify_all();
    }
}
