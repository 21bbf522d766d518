//! Client session worker.
//!
//! One worker per accepted connection. It owns the receive half of the
//! socket, relays everything it reads and removes its own connection from
//! the registry when it stops.
//!
//! ```text
//! Active --(peer closed | read error | cancelled)--> Closing --> Terminated
//! ```

use std::{io, sync::Arc};

use chatrelay_shared::framing::{FrameDecoder, Framing};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ConnectionId, Message, MessageSink},
    infrastructure::ConnectionRegistry,
    usecase::BroadcastUseCase,
};

/// Everything a session worker shares with the rest of the server
pub struct SessionContext<S> {
    pub registry: Arc<ConnectionRegistry<S>>,
    pub broadcaster: Arc<BroadcastUseCase<S>>,
    pub token: CancellationToken,
    pub buffer_size: usize,
    pub framing: Framing,
}

impl<S> Clone for SessionContext<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            broadcaster: self.broadcaster.clone(),
            token: self.token.clone(),
            buffer_size: self.buffer_size,
            framing: self.framing,
        }
    }
}

/// Why a session stopped
#[derive(Debug)]
pub enum SessionEnd {
    /// Zero-length read: the peer shut down its send direction
    PeerClosed,
    /// The receive call failed while the server was running
    Failed(io::Error),
    /// Server shutdown was requested
    Cancelled,
}

/// Deregisters the connection if the worker stops without reaching
/// `release` (task aborted or panicked).
struct DeregisterGuard<S: MessageSink> {
    id: ConnectionId,
    registry: Option<Arc<ConnectionRegistry<S>>>,
}

impl<S: MessageSink> DeregisterGuard<S> {
    fn new(id: ConnectionId, registry: Arc<ConnectionRegistry<S>>) -> Self {
        Self {
            id,
            registry: Some(registry),
        }
    }

    async fn release(mut self) {
        if let Some(registry) = self.registry.take() {
            registry.deregister(self.id).await;
        }
    }
}

impl<S: MessageSink> Drop for DeregisterGuard<S> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            let id = self.id;
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    registry.deregister(id).await;
                });
            }
        }
    }
}

/// Run the receive loop of one connection until it ends, then deregister it.
///
/// The reader is dropped before this returns, so the connection's receive
/// half is released exactly once whatever the exit path.
pub async fn run_session<R, S>(id: ConnectionId, reader: R, ctx: SessionContext<S>) -> SessionEnd
where
    R: AsyncRead + Unpin + Send,
    S: MessageSink,
{
    let guard = DeregisterGuard::new(id, ctx.registry.clone());

    let end = receive_loop(id, reader, &ctx).await;
    match &end {
        SessionEnd::PeerClosed => tracing::info!("Client {} disconnected", id),
        SessionEnd::Failed(e) => tracing::warn!("Receive from client {} failed: {}", id, e),
        SessionEnd::Cancelled => tracing::debug!("Session {} stopped by shutdown", id),
    }

    guard.release().await;
    end
}

async fn receive_loop<R, S>(id: ConnectionId, mut reader: R, ctx: &SessionContext<S>) -> SessionEnd
where
    R: AsyncRead + Unpin + Send,
    S: MessageSink,
{
    let mut buf = vec![0u8; ctx.buffer_size.max(1)];
    let mut decoder = FrameDecoder::new(ctx.framing, buf.len());

    loop {
        let read = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => return SessionEnd::Cancelled,
            read = reader.read(&mut buf) => read,
        };

        match read {
            Ok(0) => {
                if let Some(rest) = decoder.finish() {
                    ctx.broadcaster.execute(&Message::new(rest), Some(id)).await;
                }
                return SessionEnd::PeerClosed;
            }
            Ok(n) => {
                for frame in decoder.decode(&buf[..n]) {
                    ctx.broadcaster.execute(&Message::new(frame), Some(id)).await;
                }
            }
            // A read interrupted by shutdown is not a fault
            Err(_) if ctx.token.is_cancelled() => return SessionEnd::Cancelled,
            Err(e) => return SessionEnd::Failed(e),
        }
    }
}
