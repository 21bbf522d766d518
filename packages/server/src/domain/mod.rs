//! Domain layer
//!
//! Connection identity, relayed messages and the `MessageSink` seam through
//! which the registry transmits to a connection.

pub mod connection;
pub mod message;
pub mod sink;

pub use connection::{ConnectionId, ConnectionInfo};
pub use message::{BroadcastReport, Message};
pub use sink::MessageSink;

#[cfg(test)]
pub use sink::MockMessageSink;
