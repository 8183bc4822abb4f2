use std::{fmt, sync::Arc, time::Duration};

use bytes::Bytes;
use herald_core::{message::Message, properties::Properties, qos::QoS};

use crate::{config::ClientConfig, error::ClientError};

pub const DEFAULT_MESSAGE_CAPACITY: usize = 256;
pub const DEFAULT_PARALLEL_PUBLISH_CAPACITY: usize = 20;
/// Upper bound for both the arena and the in-flight cap.
pub const MAX_MESSAGE_CAPACITY: usize = 2048;
pub const DEFAULT_SESSION_EXPIRY_INTERVAL: Duration = Duration::from_secs(600);
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);
pub const DEFAULT_RECONNECT_DELAY_STEP: Duration = Duration::from_secs(1);
pub const DEFAULT_RECONNECT_DELAY_MAX: Duration = Duration::from_secs(30);

/// Callback for messages received on subscribed topics.
pub type MessageCallback = Arc<dyn Fn(Message) + Send + Sync>;
/// Callback invoked each time a session to a broker is established.
pub type ConnectedCallback = Arc<dyn Fn() + Send + Sync>;

/// Will message configuration.
///
/// The will is always sent at least once, never retained and with an empty
/// payload. Its delay interval is derived from the session expiry interval
/// when the client is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Will {
    pub topic: String,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    pub properties: Option<Properties>,
    pub delay_interval: Duration,
}

impl Will {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: Bytes::new(),
            qos: QoS::AtLeastOnce,
            retain: false,
            properties: None,
            delay_interval: Duration::ZERO,
        }
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Options for creating a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientOptions {
    pub(crate) client_id: String,
    pub(crate) message_capacity: usize,
    pub(crate) parallel_publish_capacity: usize,
    pub(crate) session_expiry_interval: Duration,
    pub(crate) keep_alive: Duration,
    pub(crate) reconnect_delay_step: Duration,
    pub(crate) reconnect_delay_max: Duration,
    pub(crate) will: Option<Will>,
    pub(crate) on_message: Option<MessageCallback>,
    pub(crate) on_connected: Option<ConnectedCallback>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientOptions {
    /// Default options with a random client id.
    pub fn new() -> Self {
        Self {
            client_id: format!("herald-{}", uuid::Uuid::new_v4().simple()),
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            parallel_publish_capacity: DEFAULT_PARALLEL_PUBLISH_CAPACITY,
            session_expiry_interval: DEFAULT_SESSION_EXPIRY_INTERVAL,
            keep_alive: DEFAULT_KEEP_ALIVE,
            reconnect_delay_step: DEFAULT_RECONNECT_DELAY_STEP,
            reconnect_delay_max: DEFAULT_RECONNECT_DELAY_MAX,
            will: None,
            on_message: None,
            on_connected: None,
        }
    }

    /// Options seeded from a loaded [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut options = Self::new()
            .message_capacity(config.message_capacity)
            .parallel_publish_capacity(config.parallel_publish_capacity)
            .session_expiry_interval(Duration::from_secs(config.session_expiry_secs))
            .keep_alive(Duration::from_secs(config.keep_alive_secs));
        if let Some(client_id) = &config.client_id {
            options = options.client_id(client_id.clone());
        }
        options
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Number of messages the client may hold at once.
    pub fn message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }

    /// Number of messages that may be on the wire awaiting acknowledgement.
    pub fn parallel_publish_capacity(mut self, capacity: usize) -> Self {
        self.parallel_publish_capacity = capacity;
        self
    }

    pub fn session_expiry_interval(mut self, interval: Duration) -> Self {
        self.session_expiry_interval = interval;
        self
    }

    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Reconnect backoff grows by `step` per failed attempt up to `max`.
    pub fn reconnect_delay(mut self, step: Duration, max: Duration) -> Self {
        self.reconnect_delay_step = step;
        self.reconnect_delay_max = max;
        self
    }

    pub fn will(mut self, will: Will) -> Self {
        self.will = Some(will);
        self
    }

    pub fn on_message<F>(mut self, callback: F) -> Self
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(callback));
        self
    }

    pub fn on_connected<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connected = Some(Arc::new(callback));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.client_id.is_empty() {
            return Err(ClientError::InvalidOptions("client id is empty".into()));
        }
        if !(1..=MAX_MESSAGE_CAPACITY).contains(&self.message_capacity) {
            return Err(ClientError::InvalidOptions(format!(
                "message capacity {} not in 1..={}",
                self.message_capacity, MAX_MESSAGE_CAPACITY
            )));
        }
        if !(1..=MAX_MESSAGE_CAPACITY).contains(&self.parallel_publish_capacity) {
            return Err(ClientError::InvalidOptions(format!(
                "parallel publish capacity {} not in 1..={}",
                self.parallel_publish_capacity, MAX_MESSAGE_CAPACITY
            )));
        }
        // The will delay is twice the session expiry and must still fit in u32.
        let expiry = self.session_expiry_interval.as_secs();
        if expiry == 0 || expiry > u64::from(u32::MAX / 2) {
            return Err(ClientError::InvalidOptions(format!(
                "session expiry interval {}s not in 1..={}",
                expiry,
                u32::MAX / 2
            )));
        }
        let keep_alive = self.keep_alive.as_secs();
        if keep_alive == 0 || keep_alive > u64::from(u16::MAX) {
            return Err(ClientError::InvalidOptions(format!(
                "keep alive {}s not in 1..={}",
                keep_alive,
                u16::MAX
            )));
        }
        if self.reconnect_delay_step.is_zero() || self.reconnect_delay_max < self.reconnect_delay_step {
            return Err(ClientError::InvalidOptions(format!(
                "reconnect delay step {:?} must be non-zero and at most {:?}",
                self.reconnect_delay_step, self.reconnect_delay_max
            )));
        }
        if let Some(will) = &self.will {
            herald_core::topic::validate_publish_topic(&will.topic)?;
        }
        Ok(())
    }

    /// The will as it is handed to the transport.
    pub(crate) fn session_will(&self) -> Option<Will> {
        self.will.clone().map(|will| Will {
            payload: Bytes::new(),
            qos: QoS::AtLeastOnce,
            retain: false,
            delay_interval: self.session_expiry_interval * 2,
            ..will
        })
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("client_id", &self.client_id)
            .field("message_capacity", &self.message_capacity)
            .field("parallel_publish_capacity", &self.parallel_publish_capacity)
            .field("session_expiry_interval", &self.session_expiry_interval)
            .field("keep_alive", &self.keep_alive)
            .field("reconnect_delay_step", &self.reconnect_delay_step)
            .field("reconnect_delay_max", &self.reconnect_delay_max)
            .field("will", &self.will)
            .field("on_message", &self.on_message.is_some())
            .field("on_connected", &self.on_connected.is_some())
            .finish()
    }
}
