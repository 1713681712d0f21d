use crate::commands::{parse_command, Command, USAGE};
use crate::render::render_state;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use shared::ServerMessage;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("server closed the connection ({code}): {reason}")]
    Rejected { code: u16, reason: String },
}

/// Everything but RFC 3986 unreserved characters gets escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// WebSocket URL of a room on `server` (`host:port`).
pub fn room_url(server: &str, room_id: &str, token: &str) -> String {
    format!(
        "ws://{}/ws/{}?token={}",
        server,
        utf8_percent_encode(room_id, COMPONENT),
        utf8_percent_encode(token, COMPONENT)
    )
}

pub struct Client {
    url: String,
    player_id: String,
}

impl Client {
    pub fn new(server: &str, room_id: &str, token: &str, player_id: &str) -> Self {
        Client {
            url: room_url(server, room_id, token),
            player_id: player_id.to_string(),
        }
    }

    /// Connects, then relays typed commands and prints snapshots until
    /// either side hangs up.
    pub async fn run(&self) -> Result<(), ClientError> {
        info!("Connecting to {}", self.url);
        let (socket, _) = connect_async(self.url.as_str()).await?;
        info!("Connected. {}", USAGE);

        let (mut sink, mut incoming) = socket.split();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_command(&line) {
                        Ok(Command::Send(message)) => {
                            let frame = serde_json::to_string(&message)?;
                            sink.send(Message::Text(frame)).await?;
                        }
                        Ok(Command::Quit) => break,
                        Err(e) => println!("{}\n{}", e, USAGE),
                    }
                }
                message = incoming.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.show(&text),
                        Some(Ok(Message::Close(frame))) => {
                            if let Some(frame) = frame {
                                return Err(ClientError::Rejected {
                                    code: u16::from(frame.code),
                                    reason: frame.reason.into_owned(),
                                });
                            }
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => break,
                    }
                }
            }
        }

        let _ = sink.close().await;
        info!("Disconnected");
        Ok(())
    }

    fn show(&self, text: &str) {
        match serde_json::from_str::<ServerMessage>(text) {
            Ok(ServerMessage::StateUpdate { payload }) => {
                debug!("Snapshot for turn {}", payload.turn_count);
                println!("{}", render_state(&payload, &self.player_id));
            }
            Err(e) => warn!("Unreadable frame from server: {}", e),
        }
    }
}
