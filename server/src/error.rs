//! Error types for the battle server.
//!
//! Only [`ServerError`] ever reaches `main`. Action failures are rendered into
//! the combat log, identity failures close the offending socket, and room
//! failures end the connection that hit them.

use shared::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Why a player command was refused. The `Display` text is written to the
/// room's combat log, prefixed with the acting player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{action} is not allowed during the {phase} phase")]
    WrongPhase { action: &'static str, phase: Phase },

    #[error("missing {field}")]
    MissingField { field: &'static str },

    #[error("invalid {field} {index} (have {len})")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("capture needs a bench slot between 2 and {max}, got {index}")]
    ProtectedSlot { index: usize, max: usize },

    #[error("not enough progress ({progress}/{threshold})")]
    NotEnoughProgress { progress: u32, threshold: u32 },

    #[error("unknown player")]
    UnknownPlayer,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("room {0} does not exist")]
    UnknownRoom(String),

    #[error("token rejected for room {0}")]
    InvalidToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room {0} is no longer running")]
    Closed(String),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("could not load rooms file {path}: {message}")]
    RoomsFile { path: PathBuf, message: String },
}
