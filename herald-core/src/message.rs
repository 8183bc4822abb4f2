//! Messages delivered from the broker to the upstream consumer.

use std::sync::Arc;

use bytes::Bytes;

use crate::{properties::Properties, qos::QoS};

/// A message received on a subscribed topic.
///
/// Cheap to clone: `topic` is an `Arc<str>` and `payload` is `Bytes`.
#[derive(Clone, Debug)]
pub struct Message {
    pub topic: Arc<str>,
    pub qos: QoS,
    pub payload: Bytes,
    pub properties: Option<Properties>,
}

impl Message {
    pub fn new(topic: impl Into<Arc<str>>, payload: impl Into<Bytes>, qos: QoS) -> Self {
        Self {
            topic: topic.into(),
            qos,
            payload: payload.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }
}
