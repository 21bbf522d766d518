//! Multi-client TCP chat relay server.
//!
//! Receives bytes from clients and relays them to all other connected clients.
//! Operator commands are read from the console: `/clients`, `/broadcast <text>`, `/exit`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatrelay-server
//! cargo run --bin chatrelay-server -- --port 27015 --framing line
//! ```

use chatrelay_server::{ControlLoop, RelayServer, ServerConfig};
use chatrelay_shared::{console::spawn_line_reader, framing::Framing, logger::setup_logger};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatrelay-server")]
#[command(about = "Multi-client TCP chat relay server", long_about = None)]
struct Args {
    /// IPv4 address to bind the server to
    #[arg(short = 'H', long, default_value = chatrelay_server::config::DEFAULT_HOST)]
    host: String,

    /// Port number to listen on
    #[arg(short = 'p', long, default_value_t = chatrelay_server::config::DEFAULT_PORT)]
    port: u16,

    /// Receive buffer size in bytes
    #[arg(short = 'b', long, default_value_t = chatrelay_server::config::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Name prefixed to operator broadcasts
    #[arg(short = 'n', long, default_value = chatrelay_server::config::DEFAULT_SERVER_NAME)]
    name: String,

    /// Message framing (raw relays each read as-is, line relays complete lines)
    #[arg(short = 'f', long, value_enum, default_value_t = Framing::Raw)]
    framing: Framing,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            buffer_size: args.buffer_size,
            name: args.name,
            framing: args.framing,
            ..Self::default()
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&["chatrelay-server", "chatrelay-shared"], "info");

    let args = Args::parse();

    let server = match RelayServer::bind(ServerConfig::from(args)).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    let running = match server.spawn() {
        Ok(running) => running,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };
    println!("Server listening on port {}", running.local_addr().port());

    let handle = running.handle();
    let control = ControlLoop::new(handle.clone());
    tokio::select! {
        _ = control.run(spawn_line_reader("")) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C");
            handle.shutdown();
        }
    }

    if let Err(e) = running.wait().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    println!("Server stopped.");
}
