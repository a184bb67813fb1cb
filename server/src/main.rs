use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig};
use shared::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Refuse new clients once this many are connected
    #[arg(long)]
    max_clients: Option<usize>,

    /// Frames queued per client before further frames to it are dropped
    #[arg(long, default_value = "64")]
    send_buffer: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        max_clients: args.max_clients,
        send_buffer: args.send_buffer,
    };
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, config).await?;

    info!("WebSocket server starting at port: {}", args.port);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
