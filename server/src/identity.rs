//! Token to player resolution at connection time.
//!
//! Room codes and their tokens are issued elsewhere. The server only needs
//! to turn `(room_id, token)` into one of the two seats, and trusts that
//! answer for the lifetime of the connection.

use crate::error::{IdentityError, ServerError};
use serde::Deserialize;
use shared::{GUEST_PLAYER_ID, HOST_PLAYER_ID};
use std::collections::HashMap;
use std::path::Path;

pub trait IdentityResolver: Send + Sync {
    /// Returns the player id seated by `token` in `room_id`.
    fn resolve(&self, room_id: &str, token: Option<&str>) -> Result<String, IdentityError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoomTokens {
    pub host_token: String,
    pub guest_token: String,
}

impl RoomTokens {
    fn seat(&self, token: Option<&str>) -> Option<&'static str> {
        match token {
            Some(t) if t == self.host_token => Some(HOST_PLAYER_ID),
            Some(t) if t == self.guest_token => Some(GUEST_PLAYER_ID),
            _ => None,
        }
    }
}

/// Rooms known up front, read from a JSON file of
/// `{ "<room>": { "host_token": "...", "guest_token": "..." } }`.
#[derive(Debug, Clone)]
pub struct StaticRooms {
    rooms: HashMap<String, RoomTokens>,
    allow_unknown_tokens: bool,
}

impl StaticRooms {
    pub fn new(rooms: HashMap<String, RoomTokens>, allow_unknown_tokens: bool) -> Self {
        Self {
            rooms,
            allow_unknown_tokens,
        }
    }

    pub fn from_file(path: &Path, allow_unknown_tokens: bool) -> Result<Self, ServerError> {
        let rooms_file_error = |message: String| ServerError::RoomsFile {
            path: path.to_path_buf(),
            message,
        };
        let contents = std::fs::read_to_string(path).map_err(|e| rooms_file_error(e.to_string()))?;
        let rooms = serde_json::from_str(&contents).map_err(|e| rooms_file_error(e.to_string()))?;
        Ok(Self::new(rooms, allow_unknown_tokens))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl IdentityResolver for StaticRooms {
    fn resolve(&self, room_id: &str, token: Option<&str>) -> Result<String, IdentityError> {
        let tokens = self
            .rooms
            .get(room_id)
            .ok_or_else(|| IdentityError::UnknownRoom(room_id.to_string()))?;

        match tokens.seat(token) {
            Some(player_id) => Ok(player_id.to_string()),
            None if self.allow_unknown_tokens => Ok(HOST_PLAYER_ID.to_string()),
            None => Err(IdentityError::InvalidToken(room_id.to_string())),
        }
    }
}

/// Accepts every room code. Seats are picked by the literal tokens
/// `host` and `guest`.
#[derive(Debug, Clone, Default)]
pub struct OpenRooms {
    allow_unknown_tokens: bool,
}

impl OpenRooms {
    pub fn new(allow_unknown_tokens: bool) -> Self {
        Self {
            allow_unknown_tokens,
        }
    }
}

impl IdentityResolver for OpenRooms {
    fn resolve(&self, room_id: &str, token: Option<&str>) -> Result<String, IdentityError> {
        let tokens = RoomTokens {
            host_token: "host".to_string(),
            guest_token: "guest".to_string(),
        };
        match tokens.seat(token) {
            Some(player_id) => Ok(player_id.to_string()),
            None if self.allow_unknown_tokens => Ok(HOST_PLAYER_ID.to_string()),
            None => Err(IdentityError::InvalidToken(room_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms(allow_unknown_tokens: bool) -> StaticRooms {
        let mut rooms = HashMap::new();
        rooms.insert(
            "ABCD".to_string(),
            RoomTokens {
                host_token: "h-123".to_string(),
                guest_token: "g-456".to_string(),
            },
        );
        StaticRooms::new(rooms, allow_unknown_tokens)
    }

    #[test]
    fn test_static_rooms_seat_by_token() {
        let resolver = rooms(false);
        assert_eq!(resolver.resolve("ABCD", Some("h-123")).unwrap(), HOST_PLAYER_ID);
        assert_eq!(resolver.resolve("ABCD", Some("g-456")).unwrap(), GUEST_PLAYER_ID);
    }

    #[test]
    fn test_static_rooms_reject_unknown() {
        let resolver = rooms(false);
        assert_eq!(
            resolver.resolve("ZZZZ", Some("h-123")),
            Err(IdentityError::UnknownRoom("ZZZZ".to_string()))
        );
        assert_eq!(
            resolver.resolve("ABCD", Some("nope")),
            Err(IdentityError::InvalidToken("ABCD".to_string()))
        );
        assert!(resolver.resolve("ABCD", None).is_err());
    }

    #[test]
    fn test_unknown_token_fallback_to_host() {
        let resolver = rooms(true);
        assert_eq!(resolver.resolve("ABCD", None).unwrap(), HOST_PLAYER_ID);
        // an unknown room is still refused
        assert!(resolver.resolve("ZZZZ", None).is_err());
    }

    #[test]
    fn test_open_rooms() {
        let resolver = OpenRooms::new(false);
        assert_eq!(resolver.resolve("any", Some("host")).unwrap(), HOST_PLAYER_ID);
        assert_eq!(resolver.resolve("any", Some("guest")).unwrap(), GUEST_PLAYER_ID);
        assert!(resolver.resolve("any", Some("other")).is_err());
        assert_eq!(
            OpenRooms::new(true).resolve("any", None).unwrap(),
            HOST_PLAYER_ID
        );
    }

    #[test]
    fn test_rooms_file_parsing() {
        let path = std::env::temp_dir().join(format!("rooms-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "ROOM": { "host_token": "a", "guest_token": "b" } }"#,
        )
        .unwrap();

        let resolver = StaticRooms::from_file(&path, false).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.resolve("ROOM", Some("b")).unwrap(), GUEST_PLAYER_ID);
    }

    #[test]
    fn test_rooms_file_missing() {
        let result = StaticRooms::from_file(Path::new("/definitely/not/here.json"), false);
        assert!(matches!(result, Err(ServerError::RoomsFile { .. })));
    }
}
