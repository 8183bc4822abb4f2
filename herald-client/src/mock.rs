//! Scripted in-memory transport used by the unit tests.

use std::{
    collections::{HashSet, VecDeque},
    io,
    sync::{Condvar, Mutex, MutexGuard},
    thread,
    time::{Duration, Instant},
};

use bytes::Bytes;
use herald_core::{message::Message, qos::QoS, reason::ReasonCode};

use crate::{
    broker::BrokerCandidate,
    event::{DisconnectReason, EventHandler},
    transport::{ConnectParams, MessageId, PublishRequest, SubscribeOptions, Transport, TransportError},
};

#[derive(Debug, Clone)]
pub(crate) struct Published {
    pub id: MessageId,
    pub topic: String,
    pub payload: Bytes,
    pub qos: QoS,
}

enum Event {
    Connect(Result<(), ReasonCode>),
    Disconnect(DisconnectReason),
    Message(Message),
    Publish(MessageId, ReasonCode),
}

#[derive(Default)]
struct MockState {
    reachable: HashSet<String>,
    current: Option<String>,
    link_up: bool,
    pending: VecDeque<Event>,
    next_id: MessageId,
    auto_ack: Option<ReasonCode>,
    fail_publish: bool,
    fail_subscribe: bool,
    fail_unsubscribe: bool,
    published: Vec<Published>,
    subscribed: Vec<(String, QoS, SubscribeOptions)>,
    unsubscribed: Vec<String>,
    connect_attempts: Vec<String>,
    disconnects: Vec<(ReasonCode, Option<Duration>)>,
    params: Option<ConnectParams>,
}

#[derive(Default)]
pub(crate) struct MockTransport {
    state: Mutex<MockState>,
    changed: Condvar,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A transport whose session is already up, for driving the pipeline
    /// without a network thread.
    pub(crate) fn connected() -> Self {
        let transport = Self::new();
        transport.lock().link_up = true;
        transport
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn push(&self, event: Event) {
        self.lock().pending.push_back(event);
        self.changed.notify_all();
    }

    pub(crate) fn set_reachable(&self, broker: &str, reachable: bool) {
        let mut state = self.lock();
        if reachable {
            state.reachable.insert(broker.to_string());
        } else {
            state.reachable.remove(broker);
        }
    }

    pub(crate) fn set_auto_ack(&self, reason: Option<ReasonCode>) {
        self.lock().auto_ack = reason;
    }

    pub(crate) fn set_fail_publish(&self, fail: bool) {
        self.lock().fail_publish = fail;
    }

    pub(crate) fn set_fail_subscribe(&self, fail: bool) {
        self.lock().fail_subscribe = fail;
    }

    pub(crate) fn set_fail_unsubscribe(&self, fail: bool) {
        self.lock().fail_unsubscribe = fail;
    }

    /// Simulate the network going away.
    pub(crate) fn drop_link(&self) {
        self.end_session(DisconnectReason::ConnectionLost);
    }

    /// Simulate the broker closing the session with `reason`.
    pub(crate) fn kick(&self, reason: ReasonCode) {
        self.end_session(DisconnectReason::ServerInitiated(reason));
    }

    fn end_session(&self, reason: DisconnectReason) {
        let mut state = self.lock();
        if state.link_up {
            state.link_up = false;
            state.pending.push_back(Event::Disconnect(reason));
        }
        drop(state);
        self.changed.notify_all();
    }

    pub(crate) fn ack(&self, id: MessageId, reason: ReasonCode) {
        self.push(Event::Publish(id, reason));
    }

    pub(crate) fn deliver(&self, message: Message) {
        self.push(Event::Message(message));
    }

    pub(crate) fn published(&self) -> Vec<Published> {
        self.lock().published.clone()
    }

    pub(crate) fn published_topics(&self) -> Vec<String> {
        self.lock().published.iter().map(|p| p.topic.clone()).collect()
    }

    pub(crate) fn subscribed(&self) -> Vec<(String, QoS, SubscribeOptions)> {
        self.lock().subscribed.clone()
    }

    pub(crate) fn unsubscribed(&self) -> Vec<String> {
        self.lock().unsubscribed.clone()
    }

    pub(crate) fn connect_attempts(&self) -> Vec<String> {
        self.lock().connect_attempts.clone()
    }

    pub(crate) fn disconnects(&self) -> Vec<(ReasonCode, Option<Duration>)> {
        self.lock().disconnects.clone()
    }

    pub(crate) fn params(&self) -> Option<ConnectParams> {
        self.lock().params.clone()
    }

    fn open(&self, state: &mut MockState, broker: String) -> Result<(), TransportError> {
        if !state.reachable.contains(&broker) {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                broker,
            )));
        }
        state.current = Some(broker);
        state.link_up = true;
        state.pending.push_back(Event::Connect(Ok(())));
        Ok(())
    }
}

impl Transport for MockTransport {
    fn connect(
        &self,
        broker: &BrokerCandidate,
        params: &ConnectParams,
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        let address = broker.to_string();
        state.connect_attempts.push(address.clone());
        state.params = Some(params.clone());
        let result = self.open(&mut state, address);
        drop(state);
        self.changed.notify_all();
        result
    }

    fn reconnect(&self) -> Result<(), TransportError> {
        let mut state = self.lock();
        let address = state.current.clone().ok_or(TransportError::NotConnected)?;
        state.connect_attempts.push(address.clone());
        let result = self.open(&mut state, address);
        drop(state);
        self.changed.notify_all();
        result
    }

    fn run(&self, timeout: Duration, handler: &dyn EventHandler) -> Result<(), TransportError> {
        let deadline = Instant::now() + timeout;
        let event = {
            let mut state = self.lock();
            loop {
                if let Some(event) = state.pending.pop_front() {
                    break event;
                }
                if !state.link_up {
                    return Err(TransportError::NotConnected);
                }
                let now = Instant::now();
                if now >= deadline {
                    return Ok(());
                }
                state = self.changed.wait_timeout(state, deadline - now).unwrap().0;
            }
        };

        match event {
            Event::Connect(result) => handler.on_connect(result),
            Event::Message(message) => handler.on_message(message),
            Event::Publish(id, reason) => handler.on_publish(id, reason),
            Event::Disconnect(reason) => {
                handler.on_disconnect(reason);
                return Err(TransportError::NotConnected);
            }
        }
        Ok(())
    }

    fn publish(&self, request: &PublishRequest<'_>) -> Result<MessageId, TransportError> {
        let mut state = self.lock();
        if !state.link_up {
            return Err(TransportError::NotConnected);
        }
        if state.fail_publish {
            return Err(TransportError::Protocol("publish refused".to_string()));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.published.push(Published {
            id,
            topic: request.topic.to_string(),
            payload: Bytes::copy_from_slice(request.payload),
            qos: request.qos,
        });
        if let Some(reason) = state.auto_ack {
            state.pending.push_back(Event::Publish(id, reason));
            drop(state);
            self.changed.notify_all();
        }
        Ok(id)
    }

    fn subscribe(
        &self,
        filter: &str,
        qos: QoS,
        options: SubscribeOptions,
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.link_up {
            return Err(TransportError::NotConnected);
        }
        if state.fail_subscribe {
            return Err(TransportError::Protocol("subscribe refused".to_string()));
        }
        state.subscribed.push((filter.to_string(), qos, options));
        Ok(())
    }

    fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.link_up {
            return Err(TransportError::NotConnected);
        }
        if state.fail_unsubscribe {
            return Err(TransportError::Protocol("unsubscribe refused".to_string()));
        }
        state.unsubscribed.push(filter.to_string());
        Ok(())
    }

    fn disconnect(
        &self,
        reason: ReasonCode,
        session_expiry: Option<Duration>,
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        if !state.link_up {
            return Err(TransportError::NotConnected);
        }
        state.link_up = false;
        state.disconnects.push((reason, session_expiry));
        state
            .pending
            .push_back(Event::Disconnect(DisconnectReason::ClientInitiated));
        drop(state);
        self.changed.notify_all();
        Ok(())
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub(crate) fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
