//! CLI chat client for the chatrelay server.
//!
//! One task prints whatever the server sends; the input loop sends each
//! non-empty console line as `"<name>: <line>"`. `/exit` disconnects.

pub mod config;
pub mod error;
pub mod input;
pub mod session;
pub mod ui;

pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{SessionEnd, connect, run_session};
