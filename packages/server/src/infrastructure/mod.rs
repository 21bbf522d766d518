//! Infrastructure layer
//!
//! - `registry`: in-memory connection registry guarded by a single mutex
//! - `writer_sink`: `MessageSink` over any async writer (TCP write half in production)

pub mod registry;
pub mod writer_sink;

pub use registry::ConnectionRegistry;
pub use writer_sink::{TcpSink, WriterSink};
