//! Server network layer handling WebSocket connections and room dispatch

use crate::error::{IdentityError, RoomError, ServerError};
use crate::identity::IdentityResolver;
use crate::room::{RoomHandle, RoomRegistry};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use percent_encoding::percent_decode_str;
use shared::ClientMessage;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{StatusCode, Uri};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

pub const INVALID_ROOM_CLOSE_CODE: u16 = 4000;
pub const INVALID_TOKEN_CLOSE_CODE: u16 = 4001;

/// Room and token a client asked for in its upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub room_id: String,
    pub token: Option<String>,
}

/// Parses `/ws/{room_id}?token=...`. Anything else is not a battle route.
///
/// The room segment is percent-decoded and the query is read as
/// `application/x-www-form-urlencoded`.
pub fn parse_route(uri: &Uri) -> Option<ConnectRequest> {
    let segment = uri.path().strip_prefix("/ws/")?.trim_end_matches('/');
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    let room_id = percent_decode_str(segment).decode_utf8().ok()?.into_owned();

    let token = uri.query().and_then(|query| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
    });

    Some(ConnectRequest { room_id, token })
}

fn not_found() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("unknown route".to_string()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn rejection_frame(err: &IdentityError) -> CloseFrame<'static> {
    let (code, reason) = match err {
        IdentityError::UnknownRoom(_) => (INVALID_ROOM_CLOSE_CODE, "Invalid Room"),
        IdentityError::InvalidToken(_) => (INVALID_TOKEN_CLOSE_CODE, "Invalid Token"),
    };
    CloseFrame {
        code: CloseCode::from(code),
        reason: reason.into(),
    }
}

/// WebSocket front door for every room
pub struct Server {
    listener: TcpListener,
    registry: Arc<RoomRegistry>,
    resolver: Arc<dyn IdentityResolver>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        registry: Arc<RoomRegistry>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            registry,
            resolver,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever, one task per connection.
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let connection = Connection {
                        addr,
                        registry: Arc::clone(&self.registry),
                        resolver: Arc::clone(&self.resolver),
                    };
                    tokio::spawn(async move {
                        if let Err(e) = connection.serve(stream).await {
                            warn!("Connection from {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

struct Connection {
    addr: SocketAddr,
    registry: Arc<RoomRegistry>,
    resolver: Arc<dyn IdentityResolver>,
}

impl Connection {
    async fn serve(self, stream: TcpStream) -> Result<(), ServerError> {
        let mut route = None;
        let callback = |request: &Request, response: Response| match parse_route(request.uri()) {
            Some(requested) => {
                route = Some(requested);
                Ok(response)
            }
            None => Err(not_found()),
        };

        let mut socket = accept_hdr_async(stream, callback).await?;
        let Some(route) = route else {
            return Ok(());
        };

        let player_id = match self
            .resolver
            .resolve(&route.room_id, route.token.as_deref())
        {
            Ok(player_id) => player_id,
            Err(e) => {
                warn!("Rejected {} for room {}: {}", self.addr, route.room_id, e);
                socket.close(Some(rejection_frame(&e))).await?;
                return Ok(());
            }
        };

        let (room, subscription) = match self.registry.join(&route.room_id, &player_id).await {
            Ok(joined) => joined,
            Err(e) => {
                error!("{} could not join room {}: {}", self.addr, route.room_id, e);
                socket.close(None).await?;
                return Ok(());
            }
        };
        info!(
            "Player {} connected to room {} from {}",
            player_id, route.room_id, self.addr
        );

        let (mut sink, mut incoming) = socket.split();
        let connection_id = subscription.connection_id;
        let mut frames = subscription.frames;

        // Writes the newest snapshot, then waits for the next one. The room
        // holds the only sender; it goes away when we leave.
        let writer = tokio::spawn(async move {
            loop {
                let frame = frames.borrow_and_update().clone();
                if !frame.is_empty() {
                    if let Err(e) = sink.send(Message::Text(frame)).await {
                        debug!("Failed to send frame: {}", e);
                        break;
                    }
                }
                if frames.changed().await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        while let Some(message) = incoming.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Err(e) = route_message(&room, &player_id, &text).await {
                        warn!("{}", e);
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => {
                    warn!("[{}] ignoring binary frame from {}", route.room_id, player_id);
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("[{}] read error from {}: {}", route.room_id, player_id, e);
                    break;
                }
            }
        }

        info!("[{}] Player {} disconnected", route.room_id, player_id);
        if room.leave(connection_id).await.is_err() {
            debug!("[{}] room already closed", route.room_id);
        }
        let _ = writer.await;
        Ok(())
    }
}

/// Forwards one inbound text frame to the room. Malformed frames are
/// logged and dropped.
async fn route_message(room: &RoomHandle, player_id: &str, text: &str) -> Result<(), RoomError> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ready) => room.ready(player_id).await,
        Ok(ClientMessage::Action { payload }) => room.action(player_id, payload).await,
        Err(e) => {
            warn!(
                "[{}] malformed message from {}: {}",
                room.room_id(),
                player_id,
                e
            );
            Ok(())
        }
    }
}
