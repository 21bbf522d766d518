//! Connection identity.

use std::{fmt, net::SocketAddr};

use uuid::Uuid;

/// Opaque handle identifying one accepted connection.
///
/// Ids are generated at registration time and are unique by construction,
/// so the registry never needs a duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a new random ConnectionId
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time description of a registered connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer_addr: SocketAddr,
    /// Unix timestamp when the connection was registered (milliseconds)
    pub connected_at: i64,
}
