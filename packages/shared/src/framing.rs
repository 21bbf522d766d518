//! Optional message framing on top of the raw TCP byte stream.
//!
//! The relay protocol has no framing: a message is whatever one receive call
//! returns, and one send on the peer does not necessarily arrive as one
//! receive. `Framing::Raw` keeps that behavior. `Framing::Line` is an opt-in
//! upgrade where peers terminate each message with `\n` and the receiver
//! reassembles complete lines before relaying them.
//!
//! Both ends must agree on the framing; nothing on the wire announces it.

use std::fmt;

/// Line delimiter used by [`Framing::Line`]
pub const LINE_DELIMITER: u8 = b'\n';

/// Message framing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Framing {
    /// One receive call is one message (no framing)
    #[default]
    Raw,
    /// Messages are terminated by `\n`
    Line,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Raw => write!(f, "raw"),
            Framing::Line => write!(f, "line"),
        }
    }
}

impl Framing {
    /// Encode one outgoing payload for the wire.
    ///
    /// In line mode the delimiter is appended unless the payload already ends
    /// with one.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut bytes = payload.to_vec();
        if *self == Framing::Line && bytes.last() != Some(&LINE_DELIMITER) {
            bytes.push(LINE_DELIMITER);
        }
        bytes
    }
}

/// Splits received chunks into messages according to a [`Framing`].
///
/// In line mode a line that grows beyond `max_frame_len` bytes without a
/// delimiter is emitted as-is, so a misbehaving peer cannot grow the buffer
/// without bound.
#[derive(Debug)]
pub struct FrameDecoder {
    framing: Framing,
    max_frame_len: usize,
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new(framing: Framing, max_frame_len: usize) -> Self {
        Self {
            framing,
            max_frame_len: max_frame_len.max(1),
            pending: Vec::new(),
        }
    }

    /// Feed one received chunk and collect every complete message.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        if chunk.is_empty() {
            return Vec::new();
        }

        match self.framing {
            Framing::Raw => vec![chunk.to_vec()],
            Framing::Line => {
                self.pending.extend_from_slice(chunk);
                let mut frames = Vec::new();

                while let Some(pos) = self.pending.iter().position(|b| *b == LINE_DELIMITER) {
                    let rest = self.pending.split_off(pos + 1);
                    frames.push(std::mem::replace(&mut self.pending, rest));
                }

                while self.pending.len() > self.max_frame_len {
                    let rest = self.pending.split_off(self.max_frame_len);
                    frames.push(std::mem::replace(&mut self.pending, rest));
                }

                frames
            }
        }
    }

    /// Flush an unterminated trailing line, if any (called when the peer closes).
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}
