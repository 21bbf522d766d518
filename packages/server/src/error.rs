//! Error types for the relay server.

use std::io;

use thiserror::Error;

/// Server-specific errors
///
/// Everything here is a setup or supervision failure. Per-connection I/O
/// errors stay inside the session worker that hit them.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created or bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The bound address could not be read back
    #[error("Failed to read local address: {0}")]
    LocalAddr(#[source] io::Error),

    /// The accept loop task panicked or was cancelled
    #[error("Accept loop terminated abnormally: {0}")]
    AcceptLoop(#[from] tokio::task::JoinError),
}
