//! Operator console: command parsing and the control loop.
//!
//! Lines arrive over a channel, fed by `chatrelay_shared::console::spawn_line_reader`
//! in the binary and by plain senders in tests.

use chatrelay_shared::time::timestamp_to_local_clock;
use tokio::sync::mpsc;

use crate::{domain::MessageSink, infrastructure::TcpSink};

use super::server::ServerHandle;

/// Operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `/exit`: shut the server down
    Exit,
    /// `/clients`: report the connected clients
    Clients,
    /// `/broadcast <text>`: send text to every client
    Broadcast(String),
    /// Blank line
    Empty,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);

        match line.trim() {
            "" => return ConsoleCommand::Empty,
            "/exit" => return ConsoleCommand::Exit,
            "/clients" => return ConsoleCommand::Clients,
            "/broadcast" => return ConsoleCommand::Broadcast(String::new()),
            _ => {}
        }

        match line.trim_start().strip_prefix("/broadcast ") {
            Some(text) => ConsoleCommand::Broadcast(text.to_string()),
            None => ConsoleCommand::Unknown(line.trim().to_string()),
        }
    }
}

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Keep reading commands; print these lines to the operator
    Continue(Vec<String>),
    /// Shutdown has been triggered
    Exit,
}

/// Reads operator commands and drives shutdown
pub struct ControlLoop<S = TcpSink> {
    handle: ServerHandle<S>,
}

impl<S: MessageSink> ControlLoop<S> {
    pub fn new(handle: ServerHandle<S>) -> Self {
        Self { handle }
    }

    pub async fn execute(&self, command: ConsoleCommand) -> CommandOutcome {
        match command {
            ConsoleCommand::Exit => {
                self.handle.shutdown();
                CommandOutcome::Exit
            }
            ConsoleCommand::Clients => {
                let connections = self.handle.connections().await;
                let mut lines = vec![format!(
                    "Number of connected clients: {}",
                    connections.len()
                )];
                lines.extend(connections.iter().map(|info| {
                    format!(
                        "  {} {} (connected at {})",
                        info.id,
                        info.peer_addr,
                        timestamp_to_local_clock(info.connected_at)
                    )
                }));
                CommandOutcome::Continue(lines)
            }
            ConsoleCommand::Broadcast(text) if text.is_empty() => {
                CommandOutcome::Continue(vec!["Usage: /broadcast <text>".to_string()])
            }
            ConsoleCommand::Broadcast(text) => {
                let report = self.handle.broadcast(&text).await;
                tracing::info!(
                    "Operator broadcast sent to {} client(s)",
                    report.delivered
                );
                CommandOutcome::Continue(Vec::new())
            }
            ConsoleCommand::Empty => CommandOutcome::Continue(Vec::new()),
            ConsoleCommand::Unknown(line) => {
                CommandOutcome::Continue(vec![format!("Unknown command: {}", line)])
            }
        }
    }

    /// Process console lines until `/exit` or end of input.
    ///
    /// Both paths leave the server shutting down; the caller then waits for
    /// the accept loop.
    pub async fn run(&self, mut lines: mpsc::UnboundedReceiver<String>) {
        while let Some(line) = lines.recv().await {
            match self.execute(ConsoleCommand::parse(&line)).await {
                CommandOutcome::Continue(output) => {
                    for line in output {
                        println!("{}", line);
                    }
                }
                CommandOutcome::Exit => {
                    println!("Shutting down server...");
                    return;
                }
            }
        }

        tracing::info!("Console input closed");
        println!("Shutting down server...");
        self.handle.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        infrastructure::{
            ConnectionRegistry,
            registry::test_support::{RecordingSink, peer},
        },
        ui::shutdown::ShutdownCoordinator,
    };

    fn create_test_control_loop() -> (ControlLoop<RecordingSink>, ServerHandle<RecordingSink>) {
        let handle = ServerHandle::new(
            Arc::new(ConnectionRegistry::new()),
            "Server",
            ShutdownCoordinator::new(),
        );
        (ControlLoop::new(handle.clone()), handle)
    }

    #[test]
    fn test_parse_commands() {
        // テスト項目: コンソール入力が対応するコマンドに変換される
        assert_eq!(ConsoleCommand::parse("/exit"), ConsoleCommand::Exit);
        assert_eq!(ConsoleCommand::parse("/clients\n"), ConsoleCommand::Clients);
        assert_eq!(ConsoleCommand::parse("   "), ConsoleCommand::Empty);
        assert_eq!(
            ConsoleCommand::parse("/broadcast test"),
            ConsoleCommand::Broadcast("test".to_string())
        );
        assert_eq!(
            ConsoleCommand::parse("/broadcast  two spaces"),
            ConsoleCommand::Broadcast(" two spaces".to_string())
        );
        assert_eq!(
            ConsoleCommand::parse("/broadcast"),
            ConsoleCommand::Broadcast(String::new())
        );
        assert_eq!(
            ConsoleCommand::parse("/broadcasting"),
            ConsoleCommand::Unknown("/broadcasting".to_string())
        );
        assert_eq!(
            ConsoleCommand::parse("hello"),
            ConsoleCommand::Unknown("hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_clients_reports_registry_size() {
        // テスト項目: /clients で接続数と各接続の情報が報告される
        // given (前提条件):
        let (control, handle) = create_test_control_loop();
        handle.registry().register(peer(1001), RecordingSink::default()).await;
        handle.registry().register(peer(1002), RecordingSink::default()).await;

        // when (操作):
        let outcome = control.execute(ConsoleCommand::Clients).await;

        // then (期待する結果):
        let CommandOutcome::Continue(lines) = outcome else {
            panic!("expected Continue");
        };
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Number of connected clients: 2");
        assert!(lines[1].contains("127.0.0.1:1001"));
        assert!(lines[2].contains("127.0.0.1:1002"));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_clients_with_prefix() {
        // テスト項目: /broadcast がサーバー名付きで全クライアントに届く
        // given (前提条件):
        let (control, handle) = create_test_control_loop();
        let alice_sink = RecordingSink::default();
        let bob_sink = RecordingSink::default();
        handle.registry().register(peer(1001), alice_sink.clone()).await;
        handle.registry().register(peer(1002), bob_sink.clone()).await;

        // when (操作):
        let outcome = control
            .execute(ConsoleCommand::parse("/broadcast test"))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, CommandOutcome::Continue(Vec::new()));
        assert_eq!(alice_sink.received(), vec![b"Server: test".to_vec()]);
        assert_eq!(bob_sink.received(), vec![b"Server: test".to_vec()]);
    }

    #[tokio::test]
    async fn test_broadcast_without_text_prints_usage() {
        // テスト項目: 本文なしの /broadcast は送信せず使い方を表示する
        // given (前提条件):
        let (control, handle) = create_test_control_loop();
        let alice_sink = RecordingSink::default();
        handle.registry().register(peer(1001), alice_sink.clone()).await;

        // when (操作):
        let outcome = control.execute(ConsoleCommand::parse("/broadcast")).await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            CommandOutcome::Continue(vec!["Usage: /broadcast <text>".to_string()])
        );
        assert!(alice_sink.received().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_is_reported() {
        // テスト項目: 未知のコマンドは Unknown command として報告される
        // given (前提条件):
        let (control, handle) = create_test_control_loop();

        // when (操作):
        let outcome = control.execute(ConsoleCommand::parse("/kick bob")).await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            CommandOutcome::Continue(vec!["Unknown command: /kick bob".to_string()])
        );
        assert!(handle.is_running());
    }

    #[tokio::test]
    async fn test_exit_triggers_shutdown() {
        // テスト項目: /exit でシャットダウンが開始され、ループが終了する
        // given (前提条件):
        let (control, handle) = create_test_control_loop();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("/clients".to_string()).unwrap();
        tx.send("/exit".to_string()).unwrap();
        tx.send("/clients".to_string()).unwrap();

        // when (操作):
        control.run(rx).await;

        // then (期待する結果):
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_end_of_input_triggers_shutdown() {
        // テスト項目: コンソール入力の終了でもシャットダウンが開始される
        // given (前提条件):
        let (control, handle) = create_test_control_loop();
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);

        // when (操作):
        control.run(rx).await;

        // then (期待する結果):
        assert!(!handle.is_running());
    }
}
