//! # Battle Client Library
//!
//! A terminal client for the battle server. It reads commands from stdin,
//! sends them to a room over WebSocket and prints every `STATE_UPDATE` it
//! receives as a short text summary.
//!
//! The client keeps no game state of its own. The server is authoritative
//! and every snapshot replaces the previous one wholesale.
//!
//! ## Module Organization
//!
//! - `commands`: parses lines like `attack 0 tackle 1` into `ClientMessage`s
//! - `render`: turns a `BattleState` into text for one viewer
//! - `network`: the connection loop

pub mod commands;
pub mod network;
pub mod render;
