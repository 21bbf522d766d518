//! UseCase: メッセージのブロードキャスト
//!
//! Echoes the message to the operator console, then fans it out through the
//! registry. Recipient failures never reach the caller; they only show up in
//! the returned `BroadcastReport` and the log.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    domain::{BroadcastReport, ConnectionId, Message, MessageSink},
    infrastructure::ConnectionRegistry,
};

/// ブロードキャストのユースケース
pub struct BroadcastUseCase<S> {
    registry: Arc<ConnectionRegistry<S>>,
    shutdown: CancellationToken,
}

impl<S: MessageSink> BroadcastUseCase<S> {
    /// `shutdown` interrupts a fan-out that is blocked on a stalled recipient.
    pub fn new(registry: Arc<ConnectionRegistry<S>>, shutdown: CancellationToken) -> Self {
        Self { registry, shutdown }
    }

    /// Relay a message received from `sender` to every other connection.
    pub async fn execute(
        &self,
        message: &Message,
        sender: Option<ConnectionId>,
    ) -> BroadcastReport {
        println!("{}", message);

        let report = self
            .registry
            .broadcast(message, sender, &self.shutdown)
            .await;
        if report.failed > 0 {
            tracing::warn!(
                "Broadcast delivered to {} of {} recipients",
                report.delivered,
                report.attempted()
            );
        } else {
            tracing::debug!("Broadcast delivered to {} recipients", report.delivered);
        }

        report
    }

    /// Broadcast operator text to everyone as `"<name>: <text>"`.
    pub async fn execute_from_operator(&self, name: &str, text: &str) -> BroadcastReport {
        self.execute(&Message::from_operator(name, text), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::registry::test_support::{RecordingSink, peer};

    fn create_test_usecase() -> (
        BroadcastUseCase<RecordingSink>,
        Arc<ConnectionRegistry<RecordingSink>>,
    ) {
        let registry = Arc::new(ConnectionRegistry::new());
        (
            BroadcastUseCase::new(registry.clone(), CancellationToken::new()),
            registry,
        )
    }

    #[tokio::test]
    async fn test_execute_relays_to_others() {
        // テスト項目: 受信したメッセージが送信者以外に中継される
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        let alice_sink = RecordingSink::default();
        let bob_sink = RecordingSink::default();
        let alice = registry.register(peer(1001), alice_sink.clone()).await;
        registry.register(peer(1002), bob_sink.clone()).await;

        // when (操作):
        let report = usecase.execute(&Message::from("alice: hello"), Some(alice)).await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(bob_sink.received(), vec![b"alice: hello".to_vec()]);
        assert!(alice_sink.received().is_empty());
    }

    #[tokio::test]
    async fn test_execute_from_operator_reaches_all_with_prefix() {
        // テスト項目: オペレーターのブロードキャストはサーバー名付きで全員に届く
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        let alice_sink = RecordingSink::default();
        let bob_sink = RecordingSink::default();
        registry.register(peer(1001), alice_sink.clone()).await;
        registry.register(peer(1002), bob_sink.clone()).await;

        // when (操作):
        let report = usecase.execute_from_operator("Server", "test").await;

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert_eq!(alice_sink.received(), vec![b"Server: test".to_vec()]);
        assert_eq!(bob_sink.received(), vec![b"Server: test".to_vec()]);
    }

    #[tokio::test]
    async fn test_execute_from_operator_with_no_clients_is_noop() {
        // テスト項目: 接続クライアントがいない場合のブロードキャストは no-op
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();

        // when (操作):
        let report = usecase.execute_from_operator("Server", "test").await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::default());
        assert!(registry.is_empty().await);
    }
}
