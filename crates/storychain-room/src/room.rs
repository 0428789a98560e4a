//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and is reached only through an mpsc
//! channel, so every mutation of a room is serialized without any lock
//! around the room itself. Different rooms never wait on each other.
//!
//! The actor also publishes the room's broadcast events to the hub from
//! inside that serialized step. Two commands can't interleave, so neither
//! can their broadcasts: subscribers see a room's events in commit order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use storychain_hub::{BroadcastHub, EventSender, SubscriberId};
use storychain_protocol::{
    Player, PlayerId, RoomCode, RoomSnapshot, RoundProgress, ServerEvent, StoryEntry,
};
use tokio::sync::{mpsc, oneshot};

use crate::engine::{JoinStatus, Room};
use crate::StoryError;

/// Shared room code → handle index. The actor removes its own entry when
/// its last player leaves.
pub(crate) type RoomIndex = Arc<Mutex<HashMap<RoomCode, RoomHandle>>>;

/// A connection's outbound queue, attached to the room's hub channel when
/// a command succeeds.
pub type Subscriber = (SubscriberId, EventSender);

/// Result of a join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// The seated player. For a repeat join this is the original record.
    pub player: Player,
    /// `false` if the player was already seated and nothing changed.
    pub newly_joined: bool,
    pub room: RoomSnapshot,
}

/// Result of a leave.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub player: Player,
    /// `None` when the room emptied and was deleted.
    pub room: Option<RoomSnapshot>,
    /// Set when the leave closed the current round.
    pub progress: Option<RoundProgress>,
}

impl LeaveOutcome {
    pub fn room_deleted(&self) -> bool {
        self.room.is_none()
    }
}

/// Result of an accepted turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub entry: StoryEntry,
    pub progress: RoundProgress,
    pub room: RoomSnapshot,
}

/// Result of an appended twist.
#[derive(Debug, Clone)]
pub struct TwistOutcome {
    pub twist: StoryEntry,
    pub room: RoomSnapshot,
}

type Reply<T> = oneshot::Sender<Result<T, StoryError>>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `reply` are request/response: the caller waits on the
/// oneshot. `origin` identifies the requesting connection so broadcasts
/// can skip it where the protocol says so.
pub(crate) enum RoomCommand {
    Join {
        player: Player,
        subscriber: Option<Subscriber>,
        reply: Reply<JoinOutcome>,
    },
    Leave {
        player_id: PlayerId,
        origin: Option<SubscriberId>,
        reply: Reply<LeaveOutcome>,
    },
    SubmitTurn {
        player_id: PlayerId,
        content: String,
        reply: Reply<TurnOutcome>,
    },
    Shuffle {
        reply: Reply<RoomSnapshot>,
    },
    AppendTwist {
        content: String,
        reply: Reply<TwistOutcome>,
    },
    /// Subscribe a connection without seating anyone (create on an
    /// existing code).
    Attach {
        subscriber: Subscriber,
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the room code. Every
/// method fails with [`StoryError::Unavailable`] if the actor has already
/// shut down (the room was deleted after the handle was looked up).
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Join { .. } => "Join",
            Self::Leave { .. } => "Leave",
            Self::SubmitTurn { .. } => "SubmitTurn",
            Self::Shuffle { .. } => "Shuffle",
            Self::AppendTwist { .. } => "AppendTwist",
            Self::Attach { .. } => "Attach",
            Self::Snapshot { .. } => "Snapshot",
        };
        f.write_str(name)
    }
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    fn unavailable(&self) -> StoryError {
        StoryError::Unavailable(self.code.clone())
    }

    /// Sends a command built around a fresh reply channel and awaits the
    /// reply.
    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, StoryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Seats a player, subscribing `subscriber` to the room on success.
    pub async fn join(
        &self,
        player: Player,
        subscriber: Option<Subscriber>,
    ) -> Result<JoinOutcome, StoryError> {
        self.request(|reply| RoomCommand::Join {
            player,
            subscriber,
            reply,
        })
        .await
    }

    /// Removes a player, unsubscribing `origin` from the room on success.
    pub async fn leave(
        &self,
        player_id: PlayerId,
        origin: Option<SubscriberId>,
    ) -> Result<LeaveOutcome, StoryError> {
        self.request(|reply| RoomCommand::Leave {
            player_id,
            origin,
            reply,
        })
        .await
    }

    pub async fn submit_turn(
        &self,
        player_id: PlayerId,
        content: String,
    ) -> Result<TurnOutcome, StoryError> {
        self.request(|reply| RoomCommand::SubmitTurn {
            player_id,
            content,
            reply,
        })
        .await
    }

    pub async fn shuffle(&self) -> Result<RoomSnapshot, StoryError> {
        self.request(|reply| RoomCommand::Shuffle { reply }).await
    }

    pub async fn append_twist(&self, content: String) -> Result<TwistOutcome, StoryError> {
        self.request(|reply| RoomCommand::AppendTwist { content, reply })
            .await
    }

    pub async fn attach(&self, subscriber: Subscriber) -> Result<RoomSnapshot, StoryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Attach {
                subscriber,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, StoryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    hub: Arc<BroadcastHub>,
    index: RoomIndex,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room's last player leaves.
    async fn run(mut self) {
        let code = self.room.code().clone();
        tracing::debug!(room = %code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            tracing::trace!(room = %code, ?cmd, "room command");
            match cmd {
                RoomCommand::Join {
                    player,
                    subscriber,
                    reply,
                } => {
                    let _ = reply.send(self.handle_join(player, subscriber));
                }
                RoomCommand::Leave {
                    player_id,
                    origin,
                    reply,
                } => {
                    let result = self.handle_leave(&player_id, origin);
                    let deleted = matches!(&result, Ok(outcome) if outcome.room_deleted());
                    let _ = reply.send(result);
                    if deleted {
                        break;
                    }
                }
                RoomCommand::SubmitTurn {
                    player_id,
                    content,
                    reply,
                } => {
                    let _ = reply.send(self.handle_submit(&player_id, &content));
                }
                RoomCommand::Shuffle { reply } => {
                    let _ = reply.send(Ok(self.handle_shuffle()));
                }
                RoomCommand::AppendTwist { content, reply } => {
                    let _ = reply.send(self.handle_twist(content));
                }
                RoomCommand::Attach { subscriber, reply } => {
                    let (id, sender) = subscriber;
                    self.hub.subscribe(&code, id, sender);
                    let _ = reply.send(self.room.snapshot());
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.room.snapshot());
                }
            }
        }

        tracing::debug!(room = %code, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player: Player,
        subscriber: Option<Subscriber>,
    ) -> Result<JoinOutcome, StoryError> {
        let id = player.id.clone();
        let status = self.room.join(player)?;
        let code = self.room.code().clone();

        let origin = subscriber.as_ref().map(|(id, _)| *id);
        if let Some((sub_id, sender)) = subscriber {
            self.hub.subscribe(&code, sub_id, sender);
        }

        let seated = self
            .room
            .player(&id)
            .cloned()
            .ok_or_else(|| StoryError::PlayerNotFound(id.clone()))?;
        let room = self.room.snapshot();
        let newly_joined = status == JoinStatus::Added;

        if newly_joined {
            tracing::info!(
                room = %code,
                player = %seated.id,
                players = room.players.len(),
                "player joined"
            );
            self.hub.broadcast(
                &code,
                ServerEvent::PlayerJoined {
                    player: seated.clone(),
                    room: room.clone(),
                },
                origin,
            );
        }

        Ok(JoinOutcome {
            player: seated,
            newly_joined,
            room,
        })
    }

    fn handle_leave(
        &mut self,
        player_id: &PlayerId,
        origin: Option<SubscriberId>,
    ) -> Result<LeaveOutcome, StoryError> {
        let departure = self.room.leave(player_id)?;
        let player = departure.player;
        let code = self.room.code().clone();

        if let Some(origin) = origin {
            self.hub.unsubscribe(&code, origin);
        }

        tracing::info!(
            room = %code,
            player = %player.id,
            players = self.room.players().len(),
            "player left"
        );

        if self.room.is_empty() {
            // Removed before replying, so by the time the caller hears
            // "deleted" no lookup can find this room.
            self.index
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&code);
            self.hub.remove_room(&code);
            tracing::info!(room = %code, "room deleted (no players left)");
            return Ok(LeaveOutcome {
                player,
                room: None,
                progress: None,
            });
        }

        let room = self.room.snapshot();
        self.hub.broadcast(
            &code,
            ServerEvent::PlayerLeft {
                player_id: player.id.clone(),
                room: room.clone(),
            },
            None,
        );
        if let Some(progress) = departure.progress {
            tracing::debug!(room = %code, round = progress.round, "round closed by leave");
            if progress.finished {
                self.hub.broadcast(
                    &code,
                    ServerEvent::StoryFinished {
                        room_id: code.clone(),
                        final_round: progress.round,
                        story: room.story.clone(),
                    },
                    None,
                );
            }
        }
        Ok(LeaveOutcome {
            player,
            room: Some(room),
            progress: departure.progress,
        })
    }

    fn handle_submit(
        &mut self,
        player_id: &PlayerId,
        content: &str,
    ) -> Result<TurnOutcome, StoryError> {
        let submission = self.room.submit_turn(player_id, content)?;
        let code = self.room.code().clone();
        let room = self.room.snapshot();

        tracing::debug!(
            room = %code,
            player = %player_id,
            round = submission.progress.round,
            "turn accepted"
        );

        self.hub.broadcast(
            &code,
            ServerEvent::StoryUpdated {
                story_part: submission.entry.clone(),
                progress: submission.progress,
                room: room.clone(),
            },
            None,
        );
        if submission.progress.finished {
            self.hub.broadcast(
                &code,
                ServerEvent::StoryFinished {
                    room_id: code.clone(),
                    final_round: submission.progress.round,
                    story: room.story.clone(),
                },
                None,
            );
        }

        Ok(TurnOutcome {
            entry: submission.entry,
            progress: submission.progress,
            room,
        })
    }

    fn handle_shuffle(&mut self) -> RoomSnapshot {
        let shuffled = self.room.shuffle();
        let room = self.room.snapshot();
        if shuffled {
            tracing::debug!(room = %room.id, "players shuffled");
        }
        self.hub.broadcast(
            &room.id,
            ServerEvent::PlayersShuffled { room: room.clone() },
            None,
        );
        room
    }

    fn handle_twist(&mut self, content: String) -> Result<TwistOutcome, StoryError> {
        let twist = self.room.append_twist(content)?;
        let room = self.room.snapshot();
        tracing::info!(room = %room.id, round = twist.round(), "twist added");
        self.hub.broadcast(
            &room.id,
            ServerEvent::AutomatedTwistAdded {
                twist: twist.clone(),
                room: room.clone(),
            },
            None,
        );
        Ok(TwistOutcome { twist, room })
    }
}

/// Spawns an actor for `room` and returns a handle to it.
///
/// `channel_size` bounds the command queue; callers wait when it's full.
pub(crate) fn spawn_room(
    room: Room,
    hub: Arc<BroadcastHub>,
    index: RoomIndex,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let handle = RoomHandle {
        code: room.code().clone(),
        sender: tx,
    };

    let actor = RoomActor {
        room,
        hub,
        index,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    handle
}
