use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use herald_core::{
    properties::Properties,
    qos::QoS,
    reason::ReasonCode,
    topic::{self, TopicValidationError},
};
use tracing::{debug, error, info, warn};

use crate::{
    admission::Priority,
    arena::MessageArena,
    broker::{BrokerCandidate, RegistrationId},
    connection,
    error::{ClientError, Result},
    ledger::Subscription,
    message::Outcome,
    options::{ClientOptions, ConnectedCallback, MessageCallback},
    state::{ClientStats, ConnectionState, State},
    transport::{ConnectParams, PublishRequest, SubscribeOptions, Transport, TransportError},
};

/// State shared between the client handle and its network thread.
pub(crate) struct Inner<T> {
    pub(crate) transport: T,
    state: Mutex<State>,
    pub(crate) message_status_changed: Condvar,
    broker_changed_or_exiting: Condvar,
    running: AtomicBool,
    next_seq: AtomicU64,
    pub(crate) on_message: Option<MessageCallback>,
    pub(crate) on_connected: Option<ConnectedCallback>,
    pub(crate) connect_params: ConnectParams,
    pub(crate) keep_alive: Duration,
    pub(crate) reconnect_delay_step: Duration,
    pub(crate) reconnect_delay_max: Duration,
}

impl<T> Inner<T> {
    /// The state is only ever changed in complete steps, so a poisoned lock
    /// still guards consistent data.
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn wait_broker_change<'a>(&self, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        self.broker_changed_or_exiting
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wait_broker_change_timeout<'a>(
        &self,
        guard: MutexGuard<'a, State>,
        timeout: Duration,
    ) -> MutexGuard<'a, State> {
        self.broker_changed_or_exiting
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner)
            .0
    }

    fn wait_message_status<'a>(
        &self,
        guard: MutexGuard<'a, State>,
        timeout: Duration,
    ) -> MutexGuard<'a, State> {
        self.message_status_changed
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner)
            .0
    }
}

/// A publish/subscribe client that keeps one broker session alive across
/// disconnects and broker changes.
///
/// Publishing and subscribing may happen from any number of threads. The
/// connection is driven by a dedicated network thread that is stopped when
/// the client is destroyed or dropped.
pub struct Client<T: Transport + 'static> {
    inner: Arc<Inner<T>>,
    network_thread: Option<JoinHandle<()>>,
}

impl<T: Transport + 'static> Client<T> {
    /// Validate `options` and start the network thread. The client stays
    /// disconnected until a broker candidate is added.
    pub fn create(options: ClientOptions, transport: T) -> Result<Self> {
        options.validate()?;
        let arena = MessageArena::with_capacity(options.message_capacity)
            .ok_or_else(|| ClientError::InvalidOptions("message capacity is zero".into()))?;

        let connect_params = ConnectParams {
            client_id: options.client_id.clone(),
            keep_alive: options.keep_alive,
            session_expiry_interval: options.session_expiry_interval,
            will: options.session_will(),
            tcp_nodelay: true,
        };

        let inner = Arc::new(Inner {
            transport,
            state: Mutex::new(State::new(arena, options.parallel_publish_capacity)),
            message_status_changed: Condvar::new(),
            broker_changed_or_exiting: Condvar::new(),
            running: AtomicBool::new(true),
            next_seq: AtomicU64::new(0),
            on_message: options.on_message,
            on_connected: options.on_connected,
            connect_params,
            keep_alive: options.keep_alive,
            reconnect_delay_step: options.reconnect_delay_step,
            reconnect_delay_max: options.reconnect_delay_max,
        });

        let network_inner = Arc::clone(&inner);
        let network_thread = thread::Builder::new()
            .name("herald-network".into())
            .spawn(move || connection::run_network_loop(network_inner))?;

        info!(
            "Created client {} (capacity {}, parallel {})",
            options.client_id, options.message_capacity, options.parallel_publish_capacity
        );

        Ok(Self {
            inner,
            network_thread: Some(network_thread),
        })
    }

    /// Stop the network thread, disconnect and release every message.
    pub fn destroy(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(network_thread) = self.network_thread.take() else {
            return;
        };

        {
            let _state = self.inner.lock();
            self.inner.running.store(false, Ordering::SeqCst);
        }
        self.disconnect_transport();
        self.inner.broker_changed_or_exiting.notify_all();

        if network_thread.join().is_err() {
            error!("Network thread panicked");
        }
        // A connect attempt racing with shutdown may have opened a session.
        self.disconnect_transport();

        let mut state = self.inner.lock();
        state.connected = false;
        state.connection = ConnectionState::Shutdown;
        state.release_all();
        drop(state);
        self.inner.message_status_changed.notify_all();
        info!("Client {} destroyed", self.inner.connect_params.client_id);
    }

    /// End the session now so the broker releases the will without waiting
    /// for the session to expire.
    fn disconnect_transport(&self) {
        match self
            .inner
            .transport
            .disconnect(ReasonCode::DisconnectWithWillMessage, Some(Duration::ZERO))
        {
            Ok(()) | Err(TransportError::NotConnected) => {}
            Err(e) => warn!("Failed to disconnect from broker: {}", e),
        }
    }

    /// Subscribe to `pattern`. A trailing `*` matches every sub-topic.
    ///
    /// While disconnected the subscription is recorded and installed on the
    /// next connect.
    pub fn subscribe(&self, pattern: &str, qos: QoS) -> Result<()> {
        let filter = parse_pattern(pattern)?;

        let mut state = self.inner.lock();
        let previous = state.subscriptions.insert(&filter, Subscription::Active(qos));
        if state.connected {
            if let Err(e) = self
                .inner
                .transport
                .subscribe(&filter, qos, SubscribeOptions::no_local())
            {
                state.subscriptions.restore(&filter, previous);
                error!("Failed to subscribe topic {} with qos {:?}: {}", filter, qos, e);
                return Err(e.into());
            }
        }
        debug!("Subscribed topic {} with qos {:?}", filter, qos);
        Ok(())
    }

    /// Unsubscribe from `pattern`. Unknown patterns are accepted.
    ///
    /// While disconnected the filter is marked for removal on the next
    /// connect, since a resumed session may still hold it.
    pub fn unsubscribe(&self, pattern: &str) -> Result<()> {
        let filter = parse_pattern(pattern)?;

        let mut state = self.inner.lock();
        if state.connected {
            let previous = state.subscriptions.remove(&filter);
            if let Err(e) = self.inner.transport.unsubscribe(&filter) {
                state.subscriptions.restore(&filter, previous);
                warn!("Failed to unsubscribe topic {}: {}", filter, e);
                return Err(e.into());
            }
        } else {
            state.subscriptions.mark_pending_removal(&filter);
        }
        debug!("Unsubscribed topic {}", filter);
        Ok(())
    }

    /// Queue or send a message without waiting for its acknowledgement.
    ///
    /// At-most-once messages need a live connection. Higher QoS messages
    /// are queued while disconnected and sent after the next connect.
    pub fn publish_async(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        properties: Option<&Properties>,
        priority: Priority,
    ) -> Result<()> {
        let request = publish_request(topic, payload, qos, properties)?;

        let mut state = self.inner.lock();
        if qos == QoS::AtMostOnce && !state.connected {
            debug!("Not connected, dropping message for {}", topic);
            return Err(ClientError::NotConnected);
        }
        if !state.has_room_for(priority) {
            error!("Too many messages wait for publish, dropping message for {}", topic);
            return Err(ClientError::TooManyPending);
        }
        let seq = self.next_seq();
        state.submit(&self.inner.transport, seq, &request, priority, false)?;
        Ok(())
    }

    /// Publish a message and wait until the broker acknowledges it or
    /// `deadline` passes.
    ///
    /// When the client is saturated an at-most-once message fails at once,
    /// while higher QoS messages wait for room until the deadline.
    pub fn publish_sync(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        properties: Option<&Properties>,
        deadline: Instant,
    ) -> Result<()> {
        let request = publish_request(topic, payload, qos, properties)?;

        let mut state = self.inner.lock();
        if qos == QoS::AtMostOnce && !state.connected {
            return Err(ClientError::NotConnected);
        }
        while !state.has_room_for(Priority::Low) {
            if qos == QoS::AtMostOnce {
                error!("Too many messages wait for publish, dropping message for {}", topic);
                return Err(ClientError::TooManyPending);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("Timed out waiting for room to publish {}", topic);
                return Err(ClientError::Timeout);
            }
            state = self.inner.wait_message_status(state, deadline - now);
        }

        let seq = self.next_seq();
        let message = state.submit(&self.inner.transport, seq, &request, Priority::Low, true)?;

        loop {
            if let Some(done) = state.take_published(seq) {
                let outcome = done.outcome().unwrap_or(Outcome::SendFailed);
                // Free the slot while still holding the lock so admission
                // waiters cannot miss the wakeup.
                drop(done);
                drop(message);
                drop(state);
                self.inner.message_status_changed.notify_all();
                return outcome.into_result();
            }

            let now = Instant::now();
            if now >= deadline {
                state.remove_message(&message);
                drop(message);
                drop(state);
                self.inner.message_status_changed.notify_all();
                warn!("Timed out waiting for publish of {} to complete", topic);
                return Err(ClientError::Timeout);
            }
            state = self.inner.wait_message_status(state, deadline - now);
        }
    }

    /// Register a broker the client may connect to. Replaces any candidate
    /// already registered under `id`.
    pub fn add_broker_candidate(&self, id: RegistrationId, host: &str, port: u16) -> Result<()> {
        if host.is_empty() {
            return Err(ClientError::InvalidBroker(format!(
                "empty host for registration {}",
                id
            )));
        }
        let broker = Arc::new(BrokerCandidate::new(host, port));
        info!("Adding broker candidate {} as {}", broker, id);
        {
            let mut state = self.inner.lock();
            state.brokers.insert(id, broker);
        }
        self.inner.broker_changed_or_exiting.notify_all();
        Ok(())
    }

    /// Forget a broker. An established session to it is left alone.
    pub fn remove_broker_candidate(&self, id: RegistrationId) {
        let removed = self.inner.lock().brokers.remove(&id);
        match removed {
            Some(broker) => info!("Removed broker candidate {} ({})", id, broker),
            None => debug!("No broker candidate registered as {}", id),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().connection
    }

    pub fn stats(&self) -> ClientStats {
        self.inner.lock().stats()
    }

    /// Ledger entry for `pattern`, if any.
    pub fn subscription(&self, pattern: &str) -> Option<Subscription> {
        let filter = topic::to_topic_filter(pattern).ok()?;
        self.inner.lock().subscriptions.get(&filter)
    }

    fn next_seq(&self) -> u64 {
        self.inner.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

impl<T: Transport + 'static> Drop for Client<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn parse_pattern(pattern: &str) -> std::result::Result<String, TopicValidationError> {
    topic::to_topic_filter(pattern).map_err(|e| {
        error!("Invalid topic pattern {}: {}", pattern, e);
        e
    })
}

fn publish_request<'a>(
    topic: &'a str,
    payload: &'a [u8],
    qos: QoS,
    properties: Option<&'a Properties>,
) -> std::result::Result<PublishRequest<'a>, TopicValidationError> {
    topic::validate_publish_topic(topic).map_err(|e| {
        error!("Invalid publish topic {}: {}", topic, e);
        e
    })?;
    Ok(PublishRequest {
        topic,
        payload,
        qos,
        properties,
    })
}
