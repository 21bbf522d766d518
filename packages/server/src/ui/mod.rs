//! Relay server runtime: accept loop, session workers, operator console.

pub mod console;
mod server;
pub mod session;
pub mod shutdown;

pub use console::{CommandOutcome, ConsoleCommand, ControlLoop};
pub use server::{RelayServer, RunningServer, ServerHandle};
pub use session::{SessionEnd, run_session};
pub use shutdown::ShutdownCoordinator;
