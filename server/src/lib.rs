//! # Battle Server Library
//!
//! This library provides the authoritative server for a turn-based,
//! phase-driven two-player creature battle. It owns the canonical battle
//! state of every room, applies player commands, and pushes a full snapshot
//! to every connection in the room after each change.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Rules
//! All rule decisions are made here. Clients only send intents (`READY` or
//! an `ACTION`) and render whatever `STATE_UPDATE` arrives next.
//!
//! ### Turn Cycle
//! A battle moves through `SETUP -> SUPPLY -> TACTICS -> COMBAT` and then
//! loops back to `SUPPLY`, once per turn, until one side has no standing
//! creatures left:
//! - **Supply** hands out potions and offers each player a wild creature
//! - **Tactics** accepts swaps, item use and evolutions immediately, and
//!   queues attacks without revealing them
//! - **Combat** resolves both attack queues in one pass
//!
//! ### Heal-to-Evolve
//! Healing always counts toward evolution, including healing that does not
//! fit under max hp. That excess is banked and paid out when the creature
//! evolves.
//!
//! ## Architecture Design
//!
//! ### One Task Per Room
//! Every room is owned by a single tokio task. Connections send it commands
//! over a channel and it applies them strictly one at a time, so no two
//! commands can interleave on the same battle. Rooms never wait on each
//! other.
//!
//! ### WebSocket Transport
//! Clients connect to `/ws/{room_id}?token=...`. The token is resolved to a
//! seat once, at connection time, and trusted afterwards.
//!
//! ## Module Organization
//!
//! - `progression`: healing, overheal and evolution
//! - `supply`: per-turn items and wild encounters
//! - `actions`: validation and application of player commands
//! - `combat`: resolution of queued attacks
//! - `battle`: battle creation and the phase state machine
//! - `room`: per-room actor and the registry of live rooms
//! - `identity`: token to seat resolution
//! - `network`: WebSocket listener and per-connection tasks
//! - `config`: command line options
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::identity::OpenRooms;
//! use server::network::Server;
//! use server::room::{RoomRegistry, RoomSettings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = RoomRegistry::new(RoomSettings::default());
//!     let resolver = Arc::new(OpenRooms::new(false));
//!
//!     let server = Server::bind("127.0.0.1:8080", registry, resolver).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod battle;
pub mod combat;
pub mod config;
pub mod error;
pub mod identity;
pub mod network;
pub mod progression;
pub mod room;
pub mod supply;
