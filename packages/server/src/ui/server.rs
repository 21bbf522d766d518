//! Server execution logic: listener setup and the accept loop.

use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use chatrelay_shared::framing::Framing;
use tokio::{
    io::AsyncRead,
    net::{TcpListener, tcp::OwnedReadHalf},
    task::JoinHandle,
};

use crate::{
    config::ServerConfig,
    domain::{BroadcastReport, ConnectionInfo, MessageSink},
    error::ServerError,
    infrastructure::{ConnectionRegistry, TcpSink, WriterSink},
    usecase::BroadcastUseCase,
};

use super::{
    session::{SessionContext, run_session},
    shutdown::ShutdownCoordinator,
};

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Shared state of a running server
///
/// Cheap to clone. The control loop and tests use it to inspect the registry,
/// broadcast as the operator and trigger shutdown.
pub struct ServerHandle<S = TcpSink> {
    registry: Arc<ConnectionRegistry<S>>,
    broadcaster: Arc<BroadcastUseCase<S>>,
    shutdown: ShutdownCoordinator,
    name: Arc<str>,
}

impl<S> Clone for ServerHandle<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            broadcaster: self.broadcaster.clone(),
            shutdown: self.shutdown.clone(),
            name: self.name.clone(),
        }
    }
}

impl<S: MessageSink> ServerHandle<S> {
    /// Create a new ServerHandle
    ///
    /// # Arguments
    ///
    /// * `registry` - Connection registry shared with every session worker
    /// * `name` - Display name used as the prefix of operator broadcasts
    /// * `shutdown` - Shutdown coordinator shared with the accept loop
    pub fn new(
        registry: Arc<ConnectionRegistry<S>>,
        name: impl Into<String>,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        let name: String = name.into();
        Self {
            broadcaster: Arc::new(BroadcastUseCase::new(registry.clone(), shutdown.token())),
            registry,
            shutdown,
            name: Arc::from(name),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry<S>> {
        &self.registry
    }

    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    pub async fn client_count(&self) -> usize {
        self.registry.len().await
    }

    pub async fn connections(&self) -> Vec<ConnectionInfo> {
        self.registry.connections().await
    }

    /// Broadcast operator text to every client with the server name prefix
    pub async fn broadcast(&self, text: &str) -> BroadcastReport {
        self.broadcaster.execute_from_operator(&self.name, text).await
    }

    /// Request shutdown of the accept loop and all session workers
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_shutting_down()
    }

    fn session_context(&self, buffer_size: usize, framing: Framing) -> SessionContext<S> {
        SessionContext {
            registry: self.registry.clone(),
            broadcaster: self.broadcaster.clone(),
            token: self.shutdown.token(),
            buffer_size,
            framing,
        }
    }
}

/// Chat relay server bound to its listening socket
///
/// # Example
///
/// ```ignore
/// let server = RelayServer::bind(ServerConfig::default()).await?;
/// let running = server.spawn()?;
/// running.handle().broadcast("hello").await;
/// running.shutdown().await?;
/// ```
pub struct RelayServer {
    config: ServerConfig,
    listener: TcpListener,
    handle: ServerHandle,
}

impl RelayServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound. This is a
    /// setup failure; callers are expected to exit.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        let handle = ServerHandle::new(
            Arc::new(ConnectionRegistry::new()),
            config.name.clone(),
            ShutdownCoordinator::new(),
        );

        tracing::info!(
            "Chat relay server listening on {} (framing: {})",
            listener.local_addr().map_err(ServerError::LocalAddr)?,
            config.framing
        );

        Ok(Self {
            config,
            listener,
            handle,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Start the accept loop on its own task.
    pub fn spawn(self) -> Result<RunningServer, ServerError> {
        let local_addr = self.local_addr()?;
        let handle = self.handle.clone();
        let worker_shutdown_timeout = self.config.worker_shutdown_timeout;
        let accept_loop = tokio::spawn(accept_loop(
            self.listener,
            self.handle,
            self.config.buffer_size,
            self.config.framing,
        ));

        Ok(RunningServer {
            handle,
            local_addr,
            accept_loop,
            worker_shutdown_timeout,
        })
    }
}

/// A server whose accept loop is running
pub struct RunningServer {
    handle: ServerHandle,
    local_addr: SocketAddr,
    accept_loop: JoinHandle<()>,
    worker_shutdown_timeout: Duration,
}

impl RunningServer {
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Trigger shutdown and wait for it to complete.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        self.handle.shutdown();
        self.wait().await
    }

    /// Wait for the accept loop to exit (after someone triggered shutdown),
    /// then give the session workers a bounded time to finish.
    pub async fn wait(self) -> Result<(), ServerError> {
        self.accept_loop.await?;

        let coordinator = self.handle.shutdown_coordinator();
        if !coordinator
            .wait_for_workers(self.worker_shutdown_timeout)
            .await
        {
            tracing::warn!(
                "{} session worker(s) still running after {:?}",
                coordinator.active_workers(),
                self.worker_shutdown_timeout
            );
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Source of new connections for the accept loop
///
/// Each accepted connection is split into the half read by its session
/// worker and the sink kept in the registry.
#[async_trait]
trait Acceptor: Send + 'static {
    type Reader: AsyncRead + Unpin + Send + 'static;
    type Sink: MessageSink;

    async fn accept(&mut self) -> io::Result<(Self::Reader, Self::Sink, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    type Reader = OwnedReadHalf;
    type Sink = TcpSink;

    async fn accept(&mut self) -> io::Result<(OwnedReadHalf, TcpSink, SocketAddr)> {
        let (stream, peer_addr) = TcpListener::accept(self).await?;
        let (reader, writer) = stream.into_split();
        Ok((reader, WriterSink::new(writer), peer_addr))
    }
}

async fn accept_loop<A: Acceptor>(
    mut acceptor: A,
    handle: ServerHandle<A::Sink>,
    buffer_size: usize,
    framing: Framing,
) {
    let token = handle.shutdown.token();

    loop {
        let accepted = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            accepted = acceptor.accept() => accepted,
        };

        match accepted {
            Ok((reader, sink, peer_addr)) => {
                let id = handle.registry.register(peer_addr, sink).await;
                tracing::info!("New client connected: {} ({})", id, peer_addr);

                let ctx = handle.session_context(buffer_size, framing);
                handle
                    .shutdown
                    .spawn_worker(run_session(id, reader, ctx));
            }
            Err(_) if token.is_cancelled() => break,
            Err(e) => {
                tracing::warn!("Accept failed: {}", e);
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }

    drop(acceptor);
    let closed = handle.registry.close_all().await;
    tracing::info!("Accept loop stopped, closed {} connection(s)", closed);
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use tokio::io::DuplexStream;

    use super::*;
    use crate::infrastructure::registry::test_support::{RecordingSink, peer};

    type Accepted = io::Result<(DuplexStream, RecordingSink, SocketAddr)>;

    /// Hands out scripted accept results, then waits forever
    struct ScriptedAcceptor {
        results: VecDeque<Accepted>,
    }

    #[async_trait]
    impl Acceptor for ScriptedAcceptor {
        type Reader = DuplexStream;
        type Sink = RecordingSink;

        async fn accept(&mut self) -> Accepted {
            match self.results.pop_front() {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }
    }

    #[tokio::test]
    async fn test_accept_loop_retries_after_accept_error() {
        // テスト項目: シャットダウン中でない accept エラーの後も待ち受けを継続する
        // given (前提条件):
        let handle = ServerHandle::new(
            Arc::new(ConnectionRegistry::new()),
            "Server",
            ShutdownCoordinator::new(),
        );
        let sink = RecordingSink::default();
        let (_client, server_side) = tokio::io::duplex(64);
        let acceptor = ScriptedAcceptor {
            results: VecDeque::from([
                Err(io::Error::new(io::ErrorKind::ConnectionAborted, "aborted")),
                Ok((server_side, sink.clone(), peer(1001))),
            ]),
        };

        // when (操作):
        let running = tokio::spawn(accept_loop(acceptor, handle.clone(), 64, Framing::Raw));

        // then (期待する結果): バックオフ後に次の接続が登録される
        tokio::time::timeout(Duration::from_secs(1), async {
            while handle.client_count().await != 1 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("connection after the failed accept should be registered");
        assert!(handle.is_running());

        // シャットダウンで accept ループが終了し、接続がクローズされる
        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .expect("accept loop should stop after shutdown")
            .unwrap();
        assert_eq!(sink.close_count(), 1);
        assert_eq!(handle.client_count().await, 0);
    }
}
