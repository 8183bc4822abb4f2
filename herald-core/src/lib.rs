//! Protocol-level value types shared by the Herald client layers.
//!
//! Nothing in this crate performs I/O. The types describe what travels
//! between the client and the broker: quality-of-service levels, reason
//! codes carried by acknowledgements, topic rules, message properties and
//! inbound messages.

pub mod message;
pub mod properties;
pub mod qos;
pub mod reason;
pub mod topic;

pub use message::Message;
pub use properties::Properties;
pub use qos::QoS;
pub use reason::ReasonCode;
