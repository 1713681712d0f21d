use clap::Parser;
use client::network::Client;
use log::info;
use shared::{GUEST_PLAYER_ID, HOST_PLAYER_ID};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Room code to join
    #[arg(short = 'r', long)]
    room: String,

    /// Seat token for the room
    #[arg(short = 't', long, default_value = "host")]
    token: String,

    /// Player id the token seats you as (guessed from the token when omitted)
    #[arg(long)]
    player_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let player_id = args.player_id.unwrap_or_else(|| {
        if args.token == "guest" {
            GUEST_PLAYER_ID.to_string()
        } else {
            HOST_PLAYER_ID.to_string()
        }
    });

    info!("Joining room {} on {} as {}", args.room, args.server, player_id);

    let client = Client::new(&args.server, &args.room, &args.token, &player_id);
    client.run().await?;

    Ok(())
}
