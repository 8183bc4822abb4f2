//! Herald publish/subscribe bridge client
//!
//! This crate provides a thread-based client that shares one broker session
//! between many producer threads. Outbound messages live in a fixed-size
//! arena, are admitted by priority and queued while the broker is away.
//! A dedicated network thread reconnects with a linear backoff and fails
//! over between registered broker candidates.
//!
//! The wire protocol is provided by a [`Transport`] implementation.
//!
//! # Example
//!
//! ```no_run
//! use std::time::{Duration, Instant};
//! use herald_client::{Client, ClientOptions, Priority, QoS, Transport};
//!
//! fn run<T: Transport + 'static>(transport: T) -> herald_client::Result<()> {
//!     let options = ClientOptions::new()
//!         .client_id("bridge-1")
//!         .on_message(|message| println!("Received on {}", message.topic));
//!
//!     let client = Client::create(options, transport)?;
//!     client.add_broker_candidate(1, "localhost", 1883)?;
//!
//!     // Subscribe to everything below events/
//!     client.subscribe("events/*", QoS::AtLeastOnce)?;
//!
//!     // Fire and forget
//!     client.publish_async("events/status", b"up", QoS::AtLeastOnce, None, Priority::Medium)?;
//!
//!     // Wait for the broker's acknowledgement
//!     let deadline = Instant::now() + Duration::from_secs(5);
//!     client.publish_sync("events/status", b"ready", QoS::ExactlyOnce, None, deadline)?;
//!
//!     client.destroy();
//!     Ok(())
//! }
//! ```

mod admission;
mod arena;
mod broker;
mod client;
pub mod config;
mod connection;
mod error;
mod event;
mod handlers;
mod ledger;
mod message;
mod options;
mod pipeline;
mod state;
mod transport;

#[cfg(test)]
mod mock;

pub use admission::Priority;
pub use broker::{BrokerCandidate, RegistrationId};
pub use client::Client;
pub use crate::config::ClientConfig;
pub use error::{ClientError, Result};
pub use event::{DisconnectReason, EventHandler};
pub use ledger::Subscription;
pub use options::{ClientOptions, Will};
pub use state::{ClientStats, ConnectionState};
pub use transport::{
    ConnectParams, MessageId, PublishRequest, SubscribeOptions, Transport, TransportError,
};

// Re-export commonly used types from herald-core
pub use herald_core::message::Message;
pub use herald_core::properties::Properties;
pub use herald_core::qos::QoS;
pub use herald_core::reason::ReasonCode;
