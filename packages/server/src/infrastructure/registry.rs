//! In-memory connection registry
//!
//! ## 責務
//!
//! - 接続中のクライアントの送信側（`MessageSink`）を登録順に保持する
//! - 送信者を除く全クライアントへのファンアウト
//! - シャットダウン時の一括クローズ
//!
//! ## ロック
//!
//! Every operation takes the same `tokio::sync::Mutex`. The fan-out keeps the
//! lock for its whole duration so that membership cannot change between
//! choosing recipients and sending to them. This serializes broadcasts.
//! No method calls another registry method while holding the lock.

use std::net::SocketAddr;

use chatrelay_shared::time::now_millis;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::domain::{BroadcastReport, ConnectionId, ConnectionInfo, Message, MessageSink};

struct Entry<S> {
    info: ConnectionInfo,
    sink: S,
}

/// Ordered set of live connections
///
/// A connection is removed only by its own session worker (`deregister`) or
/// all at once by the accept loop at shutdown (`close_all`).
pub struct ConnectionRegistry<S> {
    entries: Mutex<Vec<Entry<S>>>,
}

impl<S: MessageSink> ConnectionRegistry<S> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append a new connection and return its id.
    pub async fn register(&self, peer_addr: SocketAddr, sink: S) -> ConnectionId {
        let info = ConnectionInfo {
            id: ConnectionId::generate(),
            peer_addr,
            connected_at: now_millis(),
        };
        let id = info.id;

        let mut entries = self.entries.lock().await;
        entries.push(Entry { info, sink });
        tracing::debug!(
            "Connection {} registered ({} connected)",
            id,
            entries.len()
        );

        id
    }

    /// Remove a connection. Returns `false` if it was already gone.
    ///
    /// The removed sink is dropped after the lock is released.
    pub async fn deregister(&self, id: ConnectionId) -> bool {
        let removed = {
            let mut entries = self.entries.lock().await;
            entries
                .iter()
                .position(|entry| entry.info.id == id)
                .map(|index| entries.remove(index))
        };

        match removed {
            Some(_) => {
                tracing::debug!("Connection {} deregistered", id);
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.entries
            .lock()
            .await
            .iter()
            .any(|entry| entry.info.id == id)
    }

    /// Registered connections in insertion order
    pub async fn connections(&self) -> Vec<ConnectionInfo> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|entry| entry.info.clone())
            .collect()
    }

    /// Send `message` to every registered connection except `sender`.
    ///
    /// `sender == None` means no exclusion. A failed recipient is logged and
    /// skipped; it stays registered until its own session worker notices.
    /// Cancelling `cancel` interrupts a send that is stuck on a peer that
    /// stopped reading; the interrupted recipient counts as failed and the
    /// fan-out stops there, releasing the lock.
    pub async fn broadcast(
        &self,
        message: &Message,
        sender: Option<ConnectionId>,
        cancel: &CancellationToken,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut entries = self.entries.lock().await;

        for entry in entries
            .iter_mut()
            .filter(|entry| Some(entry.info.id) != sender)
        {
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                sent = entry.sink.send(message) => Some(sent),
            };

            match sent {
                Some(Ok(())) => {
                    report.delivered += 1;
                    tracing::debug!("Relayed {} bytes to {}", message.len(), entry.info.id);
                }
                Some(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!(
                        "Failed to send to connection {} ({}): {}",
                        entry.info.id,
                        entry.info.peer_addr,
                        e
                    );
                }
                None => {
                    report.failed += 1;
                    tracing::debug!(
                        "Broadcast to connection {} interrupted by shutdown",
                        entry.info.id
                    );
                    break;
                }
            }
        }

        report
    }

    /// Half-close and release every registered connection, then clear the registry.
    ///
    /// Returns the number of connections that were closed.
    pub async fn close_all(&self) -> usize {
        let mut entries = self.entries.lock().await;

        for entry in entries.iter_mut() {
            if let Err(e) = entry.sink.close().await {
                tracing::debug!(
                    "Half-close of connection {} failed: {}",
                    entry.info.id,
                    e
                );
            }
        }

        let closed = entries.len();
        entries.clear();
        closed
    }
}

impl<S: MessageSink> Default for ConnectionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
