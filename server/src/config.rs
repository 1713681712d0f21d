//! Command line configuration for the battle server

use crate::battle::ReadinessPolicy;
use crate::error::ServerError;
use crate::identity::{IdentityResolver, OpenRooms, StaticRooms};
use crate::room::RoomSettings;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Who must be ready before a phase advances
    #[arg(long, value_enum, default_value_t = ReadinessPolicy::AllPlayers)]
    pub readiness: ReadinessPolicy,

    /// Seed for wild encounters (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Combat log lines kept per room, 0 keeps everything
    #[arg(long, default_value = "200")]
    pub max_log_lines: usize,

    /// Keep a room's battle after its last player disconnects
    #[arg(long)]
    pub retain_empty_rooms: bool,

    /// JSON file mapping room codes to host and guest tokens
    #[arg(long)]
    pub rooms_file: Option<PathBuf>,

    /// Seat unrecognised tokens as the host
    #[arg(long)]
    pub allow_unknown_tokens: bool,
}

impl Args {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn room_settings(&self) -> RoomSettings {
        RoomSettings {
            readiness: self.readiness,
            seed: self.seed,
            max_log_lines: self.max_log_lines,
            retain_empty_rooms: self.retain_empty_rooms,
        }
    }

    /// Builds the identity resolver: the rooms file when given, open rooms otherwise.
    pub fn resolver(&self) -> Result<Arc<dyn IdentityResolver>, ServerError> {
        match &self.rooms_file {
            Some(path) => {
                let rooms = StaticRooms::from_file(path, self.allow_unknown_tokens)?;
                info!("Loaded {} rooms from {}", rooms.len(), path.display());
                Ok(Arc::new(rooms))
            }
            None => {
                info!("No rooms file given, accepting any room code");
                Ok(Arc::new(OpenRooms::new(self.allow_unknown_tokens)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["server"]).unwrap();
        assert_eq!(args.address(), "127.0.0.1:8080");
        assert_eq!(args.readiness, ReadinessPolicy::AllPlayers);
        assert_eq!(args.max_log_lines, 200);
        assert!(args.seed.is_none());
        assert!(!args.retain_empty_rooms);
        assert!(!args.allow_unknown_tokens);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "server",
            "-H",
            "0.0.0.0",
            "-p",
            "9001",
            "--readiness",
            "host",
            "--seed",
            "17",
            "--max-log-lines",
            "0",
            "--retain-empty-rooms",
        ])
        .unwrap();

        assert_eq!(args.address(), "0.0.0.0:9001");
        let settings = args.room_settings();
        assert_eq!(settings.readiness, ReadinessPolicy::HostOnly);
        assert_eq!(settings.seed, Some(17));
        assert_eq!(settings.max_log_lines, 0);
        assert!(settings.retain_empty_rooms);
    }

    #[test]
    fn test_invalid_readiness_rejected() {
        assert!(Args::try_parse_from(["server", "--readiness", "some"]).is_err());
    }

    #[test]
    fn test_open_resolver_without_rooms_file() {
        let args = Args::try_parse_from(["server"]).unwrap();
        let resolver = args.resolver().unwrap();
        assert!(resolver.resolve("anything", Some("host")).is_ok());
    }

    #[test]
    fn test_missing_rooms_file_is_an_error() {
        let args =
            Args::try_parse_from(["server", "--rooms-file", "/definitely/not/here.json"]).unwrap();
        assert!(args.resolver().is_err());
    }
}
