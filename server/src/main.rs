use clap::Parser;
use log::{error, info};
use server::config::Args;
use server::network::Server;
use server::room::RoomRegistry;

/// Main-method of the application.
/// Parses command-line arguments, then runs the WebSocket server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let resolver = args.resolver()?;
    let registry = RoomRegistry::new(args.room_settings());
    info!(
        "Readiness policy: {:?}, combat log retention: {}",
        args.readiness, args.max_log_lines
    );

    let server = Server::bind(&args.address(), registry, resolver).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
