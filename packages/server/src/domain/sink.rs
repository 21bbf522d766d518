//! MessageSink trait 定義
//!
//! The registry owns the send half of every connection behind this trait.
//! The concrete implementation lives in the infrastructure layer
//! (`WriterSink`), tests substitute recording or failing sinks.

use std::io;

use async_trait::async_trait;

use super::Message;

/// Send half of one connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync + 'static {
    /// Transmit the whole message (no partial writes are reported as success)
    async fn send(&mut self, message: &Message) -> io::Result<()>;

    /// Half-close the connection in the send direction
    async fn close(&mut self) -> io::Result<()>;
}
