//! Multi-client TCP chat relay server.
//!
//! Every byte received from one client is relayed, unchanged, to every other
//! connected client. The operator drives the server from a console
//! (`/clients`, `/broadcast <text>`, `/exit`).
//!
//! The wire protocol has no framing by default: a relayed message is exactly
//! what one receive call returned. See `chatrelay_shared::framing` for the
//! opt-in line framing.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::{ControlLoop, RelayServer, RunningServer, ServerHandle};
