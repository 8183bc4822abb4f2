use herald_core::{reason::ReasonCode, topic::TopicValidationError};
use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur in the bridge client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The message arena is exhausted or admission control refused the
    /// message for its priority.
    #[error("Too many pending messages")]
    TooManyPending,

    #[error("Not connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The broker acknowledged the publish with a failure reason.
    #[error("Publish rejected by broker: {0}")]
    Rejected(ReasonCode),

    /// A queued message could not be handed to the transport.
    #[error("Failed to send queued message")]
    SendFailed,

    /// An at-most-once message was dropped because the connection went down.
    #[error("Connection lost before message was delivered")]
    ConnectionLost,

    #[error("Timeout")]
    Timeout,

    #[error("Invalid topic: {0}")]
    InvalidTopic(#[from] TopicValidationError),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Invalid broker: {0}")]
    InvalidBroker(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
