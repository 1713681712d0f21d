//! Room coordination.
//!
//! Each room is a single tokio task that owns its [`BattleState`] and its
//! subscriber set. Connections never touch either directly: they send
//! [`RoomCommand`]s through a [`RoomHandle`], and the task applies them one
//! at a time, publishing the resulting snapshot to every subscriber's
//! outbound slot before it takes the next command.
//!
//! An outbound slot only holds the newest snapshot. A connection that falls
//! behind skips intermediate frames but always ends on the current state.

use crate::actions::handle_player_action;
use crate::battle::{initialize_battle, mark_ready, try_advance_phase, ReadinessPolicy};
use crate::error::RoomError;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Action, BattleState, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch, RwLock};

pub type ConnectionId = u64;

const COMMAND_BUFFER: usize = 256;
const JOIN_ATTEMPTS: usize = 3;

/// Per-room behaviour shared by every room the registry creates.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub readiness: ReadinessPolicy,
    /// Supply RNG seed. Every room starts from the same seed when set.
    pub seed: Option<u64>,
    /// Combat log retention, zero for unbounded.
    pub max_log_lines: usize,
    pub retain_empty_rooms: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            readiness: ReadinessPolicy::default(),
            seed: None,
            max_log_lines: 200,
            retain_empty_rooms: false,
        }
    }
}

/// A connection's membership in a room.
#[derive(Debug)]
pub struct Subscription {
    pub connection_id: ConnectionId,
    /// Newest `STATE_UPDATE` frame for this connection. Starts with the
    /// snapshot taken at join time, marked as already seen.
    pub frames: watch::Receiver<String>,
}

/// Current state of a room as seen by an observer outside it.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub state: BattleState,
    pub subscribers: usize,
}

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        player_id: String,
        reply: oneshot::Sender<Subscription>,
    },
    Leave {
        connection_id: ConnectionId,
    },
    Ready {
        player_id: String,
    },
    Action {
        player_id: String,
        action: Action,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// Cheap, cloneable sender side of a room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: String,
    commands: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    pub async fn ready(&self, player_id: &str) -> Result<(), RoomError> {
        self.send(RoomCommand::Ready {
            player_id: player_id.to_string(),
        })
        .await
    }

    pub async fn action(&self, player_id: &str, action: Action) -> Result<(), RoomError> {
        self.send(RoomCommand::Action {
            player_id: player_id.to_string(),
            action,
        })
        .await
    }

    pub async fn leave(&self, connection_id: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { connection_id }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        response
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }
}

struct Subscriber {
    player_id: String,
    outbound: watch::Sender<String>,
}

/// The task-owned side of a room.
struct Room {
    state: BattleState,
    subscribers: HashMap<ConnectionId, Subscriber>,
    next_connection_id: ConnectionId,
    settings: RoomSettings,
    rng: StdRng,
}

impl Room {
    fn new(room_id: &str, settings: RoomSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: initialize_battle(room_id),
            subscribers: HashMap::new(),
            next_connection_id: 1,
            settings,
            rng,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<RoomCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);

            if self.subscribers.is_empty() && !self.settings.retain_empty_rooms {
                info!("[{}] last connection left, closing room", self.state.room_id);
                break;
            }
        }
    }

    fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Join { player_id, reply } => {
                let connection_id = self.next_connection_id;
                self.next_connection_id += 1;

                let initial = self.frame_for(&player_id).unwrap_or_default();
                let (outbound, frames) = watch::channel(initial);
                let subscription = Subscription {
                    connection_id,
                    frames,
                };
                if reply.send(subscription).is_err() {
                    debug!("[{}] joiner went away before its reply", self.state.room_id);
                    return;
                }

                info!(
                    "[{}] {} joined as connection {}",
                    self.state.room_id, player_id, connection_id
                );
                self.subscribers.insert(
                    connection_id,
                    Subscriber {
                        player_id,
                        outbound,
                    },
                );
            }

            RoomCommand::Leave { connection_id } => {
                if let Some(subscriber) = self.subscribers.remove(&connection_id) {
                    info!(
                        "[{}] {} disconnected (connection {})",
                        self.state.room_id, subscriber.player_id, connection_id
                    );
                }
            }

            RoomCommand::Ready { player_id } => {
                info!("[{}] {} is ready", self.state.room_id, player_id);
                if !mark_ready(&mut self.state, &player_id) {
                    warn!("[{}] READY from unknown player {}", self.state.room_id, player_id);
                }
                self.advance_and_broadcast();
            }

            RoomCommand::Action { player_id, action } => {
                info!("[{}] {} sent {:?}", self.state.room_id, player_id, action);
                // refusals are already in the combat log
                let _ = handle_player_action(&mut self.state, &player_id, &action);
                self.advance_and_broadcast();
            }

            RoomCommand::Snapshot { reply } => {
                let snapshot = RoomSnapshot {
                    state: self.state.clone(),
                    subscribers: self.subscribers.len(),
                };
                let _ = reply.send(snapshot);
            }
        }
    }

    fn advance_and_broadcast(&mut self) {
        try_advance_phase(&mut self.state, self.settings.readiness, &mut self.rng);
        self.state.trim_log(self.settings.max_log_lines);
        self.broadcast();
    }

    fn frame_for(&self, viewer: &str) -> Option<String> {
        let message = ServerMessage::StateUpdate {
            payload: self.state.view_for(viewer),
        };
        match serde_json::to_string(&message) {
            Ok(frame) => Some(frame),
            Err(e) => {
                error!("[{}] failed to serialize state: {}", self.state.room_id, e);
                None
            }
        }
    }

    /// Publishes the current snapshot to every subscriber, dropping those
    /// whose connection has gone away.
    fn broadcast(&mut self) {
        let mut frames: HashMap<String, String> = HashMap::new();
        let mut closed = Vec::new();

        for (connection_id, subscriber) in &self.subscribers {
            let frame = match frames.get(&subscriber.player_id) {
                Some(frame) => frame.clone(),
                None => match self.frame_for(&subscriber.player_id) {
                    Some(frame) => {
                        frames.insert(subscriber.player_id.clone(), frame.clone());
                        frame
                    }
                    None => continue,
                },
            };

            // replaces any frame the connection has not written out yet
            if subscriber.outbound.send(frame).is_err() {
                closed.push(*connection_id);
            }
        }

        for connection_id in closed {
            self.subscribers.remove(&connection_id);
            debug!(
                "[{}] dropped closed connection {}",
                self.state.room_id, connection_id
            );
        }
    }
}

/// All live rooms, keyed by room code.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomHandle>>,
    settings: RoomSettings,
}

impl RoomRegistry {
    pub fn new(settings: RoomSettings) -> Arc<Self> {
        Arc::new(Self {
            rooms: RwLock::new(HashMap::new()),
            settings,
        })
    }

    /// Subscribes `player_id` to `room_id`, creating the room on first use.
    ///
    /// The returned subscription already holds the current snapshot.
    pub async fn join(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
    ) -> Result<(RoomHandle, Subscription), RoomError> {
        for _ in 0..JOIN_ATTEMPTS {
            let handle = self.get_or_spawn(room_id).await;
            let (reply, response) = oneshot::channel();
            let join = RoomCommand::Join {
                player_id: player_id.to_string(),
                reply,
            };

            if handle.send(join).await.is_ok() {
                if let Ok(subscription) = response.await {
                    return Ok((handle, subscription));
                }
            }

            // the room closed between lookup and join
            self.forget_closed(room_id).await;
        }

        Err(RoomError::Closed(room_id.to_string()))
    }

    async fn get_or_spawn(self: &Arc<Self>, room_id: &str) -> RoomHandle {
        {
            let rooms = self.rooms.read().await;
            if let Some(handle) = rooms.get(room_id) {
                if !handle.is_closed() {
                    return handle.clone();
                }
            }
        }

        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(room_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        info!("Initializing new battle for room {}", room_id);
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let handle = RoomHandle {
            room_id: room_id.to_string(),
            commands,
        };
        rooms.insert(room_id.to_string(), handle.clone());

        let room = Room::new(room_id, self.settings.clone());
        let registry = Arc::clone(self);
        let room_id = room_id.to_string();
        tokio::spawn(async move {
            room.run(receiver).await;
            registry.forget_closed(&room_id).await;
        });

        handle
    }

    async fn forget_closed(&self, room_id: &str) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(room_id).is_some_and(RoomHandle::is_closed) {
            rooms.remove(room_id);
            info!("Room {} torn down", room_id);
        }
    }

    pub async fn room(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.read().await.get(room_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
