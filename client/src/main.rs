use clap::Parser;
use client::network::Client;
use log::info;
use shared::DEFAULT_PORT;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay URL to connect to
    #[arg(short = 's', long, default_value_t = format!("ws://127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Wander around randomly instead of reading commands from stdin
    #[arg(long)]
    wander: bool,

    /// Milliseconds between wander steps
    #[arg(long, default_value = "500")]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut client = Client::connect(&args.server).await?;

    if args.wander {
        info!("Wandering every {}ms", args.interval_ms);
        client
            .run_wander(Duration::from_millis(args.interval_ms.max(1)))
            .await?;
    } else {
        info!("Commands: /move <x> <y>, /who, /quit; anything else is chat");
        client.run_interactive().await?;
    }

    Ok(())
}
