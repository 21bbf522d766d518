//! Server configuration.

use std::time::Duration;

use chatrelay_shared::framing::Framing;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 27015;
pub const DEFAULT_BUFFER_SIZE: usize = 8192;
pub const DEFAULT_SERVER_NAME: &str = "Server";
pub const DEFAULT_WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime configuration of the relay server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IPv4 address to bind to
    pub host: String,
    /// Port to listen on (`0` picks an ephemeral port)
    pub port: u16,
    /// Size of the receive buffer, i.e. the largest message one read can produce
    pub buffer_size: usize,
    /// Display name prefixed to operator broadcasts
    pub name: String,
    pub framing: Framing,
    /// How long shutdown waits for session workers to finish
    pub worker_shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            name: DEFAULT_SERVER_NAME.to_string(),
            framing: Framing::Raw,
            worker_shutdown_timeout: DEFAULT_WORKER_SHUTDOWN_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: デフォルト設定が元のサーバーと同じポート・バッファサイズになる
        // given (前提条件):
        let config = ServerConfig::default();

        // when (操作):
        let addr = config.bind_addr();

        // then (期待する結果):
        assert_eq!(addr, "0.0.0.0:27015");
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.name, "Server");
        assert_eq!(config.framing, Framing::Raw);
    }
}
