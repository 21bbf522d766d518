//! Error types for the chat client.

use std::io;

use thiserror::Error;

/// Client setup errors
///
/// A lost connection after setup is not an error; it ends the session
/// (see `SessionEnd`).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached
    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Display name is empty
    #[error("Invalid display name '{0}'")]
    InvalidName(String),
}
