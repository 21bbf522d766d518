//! Shared building blocks for the chatrelay server and client.
//!
//! - `logger`: tracing subscriber setup
//! - `time`: timestamp helpers
//! - `framing`: optional message framing on top of the raw byte stream
//! - `console`: rustyline reader thread feeding an async channel

pub mod console;
pub mod framing;
pub mod logger;
pub mod time;
