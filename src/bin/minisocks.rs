use anyhow::Result;
use clap::Parser;
use minisocks::Socks5Server;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "A minimal SOCKS5 proxy", long_about = None)]
struct Args {
    /// Listener address
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    listen: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse args
    let args = Args::parse();

    // Initialize tracing subscriber
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    // Instantiate server
    let mut server = Socks5Server::new(args.listen);

    // Run it
    info!("Starting SOCKS5 proxy: {}", server.listen_addr);
    server.run().await
}
