//! CLI chat client for the chatrelay server.
//!
//! Connects to the relay server, sends each console line prefixed with the
//! display name, and prints everything the server relays back.
//! Type `/exit` to disconnect.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatrelay-client -- --name Alice
//! cargo run --bin chatrelay-client -- -H 192.168.0.10 -n Bob --framing line
//! ```

use chatrelay_client::{
    ClientConfig, SessionEnd,
    config::{DEFAULT_BUFFER_SIZE, DEFAULT_HOST, DEFAULT_PORT},
    connect, run_session,
    ui::print_received,
};
use chatrelay_shared::{console::spawn_line_reader, framing::Framing, logger::setup_logger};
use clap::Parser;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "chatrelay-client")]
#[command(about = "TCP chat client for the chatrelay server", long_about = None)]
struct Args {
    /// Display name prefixed to every message
    #[arg(short = 'n', long)]
    name: String,

    /// Server IPv4 address
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Receive buffer size in bytes
    #[arg(short = 'b', long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Message framing (must match the server)
    #[arg(short = 'f', long, value_enum, default_value_t = Framing::Raw)]
    framing: Framing,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            name: args.name,
            buffer_size: args.buffer_size,
            framing: args.framing,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&["chatrelay-client", "chatrelay-shared"], "warn");

    let config = ClientConfig::from(Args::parse());

    let stream = match connect(&config).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Client error: {}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!("Connected to server.");

    let (output_tx, mut output_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let name = config.name.clone();
    let printer = tokio::spawn(async move {
        while let Some(bytes) = output_rx.recv().await {
            print_received(&bytes, &name);
        }
    });

    let input = spawn_line_reader(format!("{}> ", config.name));
    match run_session(stream, &config, input, output_tx).await {
        SessionEnd::UserExit | SessionEnd::InputClosed => {}
        SessionEnd::ServerClosed => eprintln!("\nConnection closed"),
        SessionEnd::ConnectionLost(e) => eprintln!("\nConnection lost: {}", e),
    }

    printer.abort();
    println!("Client disconnected.");
}
