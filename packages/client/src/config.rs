//! Client configuration.

use chatrelay_shared::framing::Framing;

use crate::error::ClientError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 27015;
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Runtime configuration of the chat client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server IPv4 address
    pub host: String,
    pub port: u16,
    /// Display name prefixed to every sent line
    pub name: String,
    /// Size of the receive buffer
    pub buffer_size: usize,
    /// Must match the server's framing
    pub framing: Framing,
}

impl ClientConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            name: name.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            framing: Framing::Raw,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject configurations that cannot produce a usable session
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::InvalidName(self.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        // テスト項目: デフォルト設定で元のクライアントと同じポートに接続する
        // given (前提条件):
        let config = ClientConfig::new("alice");

        // when (操作):
        let addr = config.server_addr();

        // then (期待する結果):
        assert_eq!(addr, "127.0.0.1:27015");
        assert_eq!(config.framing, Framing::Raw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        // テスト項目: 空白のみの名前はエラーになる
        // given (前提条件):
        let config = ClientConfig::new("  ");

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidName(_))));
    }
}
