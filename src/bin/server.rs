//! ReelDB Server Binary
//!
//! Starts the TCP server for ReelDB.

use clap::Parser;
use reeldb::network::Server;
use reeldb::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// ReelDB Server
#[derive(Parser, Debug)]
#[command(name = "reeldb-server")]
#[command(about = "Networked film catalog server")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(short, long, default_value = "streaming.db")]
    db: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:7080")]
    listen: String,

    /// Maximum concurrent connections (0 = unbounded)
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Close connections idle for this long mid-request, in ms (0 = never)
    #[arg(short, long, default_value = "0")]
    read_timeout_ms: u64,

    /// How long a store handle waits on a locked database, in ms
    #[arg(short, long, default_value = "5000")]
    busy_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reeldb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("ReelDB Server v{}", reeldb::VERSION);
    tracing::info!("Database: {}", args.db);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .db_path(&args.db)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .busy_timeout_ms(args.busy_timeout_ms)
        .build();

    let server = match Server::bind(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
