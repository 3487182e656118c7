//! ws2mpd Server Binary
//!
//! Starts the WebSocket to MPD bridge.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use ws2mpd::{Config, Server};

/// ws2mpd Server
#[derive(Parser, Debug)]
#[command(name = "ws2mpd")]
#[command(about = "Bridge WebSocket clients to the Music Player Daemon")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// MPD host used when a client does not pass ?server=
    #[arg(long, default_value = "127.0.0.1")]
    daemon_host: String,

    /// MPD port used when a client does not pass ?server=
    #[arg(long, default_value = "6600")]
    daemon_port: u16,

    /// Only accept clients whose Origin matches this regular expression
    #[arg(short, long)]
    origin: Option<String>,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// WebSocket poll interval in milliseconds
    #[arg(long, default_value = "10")]
    poll_interval_ms: u64,

    /// Only log warnings and errors unless RUST_LOG says otherwise
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging
    let default_filter = if args.quiet { "warn" } else { "info,ws2mpd=debug" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("ws2mpd v{}", ws2mpd::VERSION);
    tracing::info!("Listen address: {}", args.listen);
    tracing::info!("Default mpd: {}:{}", args.daemon_host, args.daemon_port);

    // Build config from args
    let mut builder = Config::builder()
        .listen_addr(&args.listen)
        .daemon_host(&args.daemon_host)
        .daemon_port(args.daemon_port)
        .max_connections(args.max_connections)
        .poll_interval_ms(args.poll_interval_ms);
    if let Some(origin) = &args.origin {
        tracing::info!("Origin pattern: {}", origin);
        builder = builder.origin_pattern(origin);
    }
    let config = builder.build();

    let mut server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
