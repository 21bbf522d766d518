//! Relayed message and fan-out result.

use std::{borrow::Cow, fmt};

/// Immutable byte sequence captured from one receive call.
///
/// There is no length prefix and no terminator guarantee: a message may hold
/// several chat lines, exactly one, or only a fragment of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(Vec<u8>);

impl Message {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Build an operator-originated message (`"<name>: <text>"`)
    pub fn from_operator(name: &str, text: &str) -> Self {
        Self(format!("{}: {}", name, text).into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text view for console output; invalid UTF-8 is replaced.
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text_lossy())
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients that accepted the full message
    pub delivered: usize,
    /// Recipients whose transmission failed (logged and skipped)
    pub failed: usize,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}
