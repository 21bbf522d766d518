//! `MessageSink` implementation over an async writer.

use std::io;

use async_trait::async_trait;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    net::tcp::OwnedWriteHalf,
};

use crate::domain::{Message, MessageSink};

/// Sink used for accepted TCP connections
pub type TcpSink = WriterSink<OwnedWriteHalf>;

/// Sends relayed messages to one connection through its write half.
///
/// Dropping the sink drops the writer; for an `OwnedWriteHalf` that also
/// shuts down the send direction of the socket.
pub struct WriterSink<W> {
    writer: W,
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W> MessageSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send + Sync + 'static,
{
    async fn send(&mut self, message: &Message) -> io::Result<()> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.flush().await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}
