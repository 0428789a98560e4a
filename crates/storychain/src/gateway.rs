//! Per-connection gateway: welcome, command routing, replies.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task draining the connection's outbound queue
//!   2. Queue the `connected` welcome event
//!   3. Loop: receive frames → decode a command → route it
//!
//! Direct replies and room broadcasts share the outbound queue, so a
//! connection sees them in the order they were produced. Failures are
//! answered with an `error` event to this connection only.

use std::sync::Arc;

use chrono::Utc;
use storychain_ai::ContentProvider;
use storychain_hub::{BroadcastHub, EventReceiver, EventSender, SubscriberId, outbound_channel};
use storychain_protocol::{
    ClientCommand, Codec, PlayerId, PlayerInfo, RoomCode, ServerEvent, decode_command,
};
use storychain_room::{RoomSettings, StoryError, Subscriber};
use storychain_transport::{Connection, WebSocketConnection};

use crate::StorychainError;
use crate::content;
use crate::server::ServerState;

/// Text of the `connected` event.
pub const WELCOME_MESSAGE: &str = "Welcome to AI Story Chain!";

/// Why a command was refused before or by the room.
#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error(transparent)]
    Story(#[from] StoryError),

    /// Switching rooms requires leaving first.
    #[error("already in room {0}; leave it before joining another")]
    AlreadyInRoom(RoomCode),

    /// The command targets a room this connection hasn't joined.
    #[error("not connected to room {0}")]
    NotInRoom(RoomCode),

    #[error("no room given and this connection hasn't joined one")]
    NoRoom,

    #[error("no player given and this connection hasn't joined as one")]
    NoPlayer,
}

impl Rejection {
    fn kind(&self) -> &'static str {
        match self {
            Self::Story(e) => e.kind(),
            Self::AlreadyInRoom(_) => "already_in_room",
            Self::NotInRoom(_) => "not_in_room",
            Self::NoRoom | Self::NoPlayer => "invalid_message",
        }
    }
}

/// Drop guard that removes the connection from every hub room when the
/// handler exits, panics included. The player keeps their seat.
struct SubscriptionGuard {
    subscriber: SubscriberId,
    hub: Arc<BroadcastHub>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let rooms = self.hub.unsubscribe_all(self.subscriber);
        tracing::debug!(subscriber = %self.subscriber, rooms, "connection unsubscribed");
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<P, C>>,
) -> Result<(), StorychainError>
where
    P: ContentProvider,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let subscriber = SubscriberId(conn_id.into_inner());
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (outbound, inbox) = outbound_channel();
    let writer = tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), inbox));
    let _guard = SubscriptionGuard {
        subscriber,
        hub: Arc::clone(state.hub()),
    };

    let mut session = Session {
        state: Arc::clone(&state),
        subscriber,
        outbound,
        room: None,
        player: None,
    };
    session.reply(ServerEvent::Connected {
        message: WELCOME_MESSAGE.to_owned(),
        timestamp: Utc::now(),
    });

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        match decode_command(&state.codec, &data) {
            Ok(command) => session.dispatch(command).await,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode command");
                session.reply(error_event(e.kind(), e.to_string()));
            }
        }
    }

    writer.abort();
    // The client may already be gone; a failed close changes nothing.
    let _ = conn.close().await;
    Ok(())
}

/// Encodes queued events onto the socket until the queue or socket closes.
async fn write_events<P, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<P, C>>,
    mut inbox: EventReceiver,
) where
    P: ContentProvider,
    C: Codec,
{
    while let Some(event) = inbox.recv().await {
        let bytes = match state.codec.encode(&*event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(kind = event.kind(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

fn error_event(kind: &str, message: String) -> ServerEvent {
    ServerEvent::Error {
        kind: kind.to_owned(),
        message,
    }
}

/// What this connection has joined as. Both unset until a create or join
/// succeeds, and cleared again by a successful leave.
struct Session<P: ContentProvider, C: Codec> {
    state: Arc<ServerState<P, C>>,
    subscriber: SubscriberId,
    outbound: EventSender,
    room: Option<RoomCode>,
    player: Option<PlayerId>,
}

impl<P, C> Session<P, C>
where
    P: ContentProvider,
    C: Codec,
{
    fn reply(&self, event: ServerEvent) {
        // Only fails once the writer is gone, and then nobody is listening.
        let _ = self.outbound.send(Arc::new(event));
    }

    fn subscription(&self) -> Subscriber {
        (self.subscriber, self.outbound.clone())
    }

    async fn dispatch(&mut self, command: ClientCommand) {
        tracing::debug!(subscriber = %self.subscriber, ?command, "routing command");
        if let Err(rejection) = self.route(command).await {
            tracing::debug!(
                subscriber = %self.subscriber,
                kind = rejection.kind(),
                error = %rejection,
                "command rejected"
            );
            self.reply(error_event(rejection.kind(), rejection.to_string()));
        }
    }

    async fn route(&mut self, command: ClientCommand) -> Result<(), Rejection> {
        let registry = &self.state.registry;

        match command {
            ClientCommand::CreateRoom {
                room_id,
                creator,
                max_rounds,
                ai_mode,
            } => {
                let code = room_id.as_deref().and_then(RoomCode::parse);
                self.ensure_free(code.as_ref())?;
                let settings = RoomSettings::resolve(
                    max_rounds,
                    ai_mode.as_deref(),
                    self.state.config.room_defaults,
                )?;

                let outcome = registry
                    .create(
                        code,
                        creator.map(PlayerInfo::into_player),
                        settings,
                        Some(self.subscription()),
                    )
                    .await?;

                self.room = Some(outcome.room.id.clone());
                if let Some(creator) = outcome.creator {
                    self.player = Some(creator.id);
                }
                self.reply(ServerEvent::RoomCreated { room: outcome.room });
            }

            ClientCommand::JoinRoom { room_id, player } => {
                let code = RoomCode::parse(&room_id).ok_or(Rejection::NoRoom)?;
                self.ensure_free(Some(&code))?;

                let outcome = registry
                    .join(&code, player.into_player(), Some(self.subscription()))
                    .await?;

                self.room = Some(code);
                self.player = Some(outcome.player.id.clone());
                self.reply(ServerEvent::JoinedRoom {
                    player: outcome.player,
                    room: outcome.room,
                });
            }

            ClientCommand::LeaveRoom { room_id, player_id } => {
                let code = self.joined_room(room_id)?;
                let player_id = self.acting_player(player_id)?;

                let outcome = registry.leave(&code, player_id, Some(self.subscriber)).await?;

                self.room = None;
                self.player = None;
                let eligible = outcome
                    .progress
                    .is_some_and(|progress| progress.automated_twist_eligible);
                if eligible && self.state.config.auto_twists {
                    content::spawn_automated_twist(Arc::clone(&self.state), code.clone());
                }
                let room_deleted = outcome.room_deleted();
                let message = if room_deleted {
                    "Left room - room was deleted as it became empty"
                } else {
                    "Successfully left room"
                };
                self.reply(ServerEvent::LeftRoom {
                    room_id: code,
                    room_deleted,
                    message: message.to_owned(),
                });
            }

            ClientCommand::SubmitTurn {
                room_id,
                player_id,
                content,
            } => {
                let code = self.joined_room(room_id)?;
                let player_id = self.acting_player(player_id)?;

                // The room broadcasts `story_updated` to everyone, sender included.
                let outcome = registry.submit_turn(&code, player_id, content).await?;

                if outcome.progress.automated_twist_eligible && self.state.config.auto_twists {
                    content::spawn_automated_twist(Arc::clone(&self.state), code);
                }
            }

            ClientCommand::RequestAutomatedTwist { room_id } => {
                let code = self.joined_room(room_id)?;
                content::inject_twist(&self.state, &code).await?;
            }

            ClientCommand::ShufflePlayers { room_id } => {
                let code = self.target_room(room_id)?;
                let room = registry.shuffle(&code).await?;
                // Subscribers hear `players_shuffled`; anyone else gets the
                // new order directly.
                if self.room.as_ref() != Some(&code) {
                    self.reply(ServerEvent::RoomInfo { room });
                }
            }

            ClientCommand::GetRoomInfo { room_id } => {
                let code = self.target_room(room_id)?;
                let room = registry.snapshot(&code).await?;
                self.reply(ServerEvent::RoomInfo { room });
            }

            ClientCommand::GetStoryHistory { room_id } => {
                let code = self.target_room(room_id)?;
                let room = registry.snapshot(&code).await?;
                self.reply(ServerEvent::StoryHistory {
                    room_id: room.id,
                    story: room.story,
                });
            }

            ClientCommand::GetPlayers { room_id } => {
                let code = self.target_room(room_id)?;
                let room = registry.snapshot(&code).await?;
                self.reply(ServerEvent::PlayersList {
                    room_id: room.id,
                    players: room.players,
                    current_turn: room.current_turn,
                    current_player: room.current_player,
                });
            }

            ClientCommand::GetCurrentTurn { room_id } => {
                let code = self.target_room(room_id)?;
                let room = registry.snapshot(&code).await?;
                self.reply(ServerEvent::CurrentTurn {
                    room_id: room.id,
                    current_player: room.current_player,
                });
            }

            ClientCommand::ListRooms => {
                let rooms = registry.list().await;
                self.reply(ServerEvent::RoomList { rooms });
            }

            ClientCommand::AiSuggestNextPlayer { room_id } => {
                let code = self.target_room(room_id)?;
                let (suggestion, current_player) =
                    content::suggest_next_player(&self.state, &code).await?;
                self.reply(ServerEvent::AiPlayerSuggestion {
                    room_id: code,
                    suggestion,
                    current_player,
                });
            }

            ClientCommand::GeneratePrompt { room_id } => {
                let code = self.target_room(room_id)?;
                let prompt = content::writing_prompt(&self.state, &code).await?;
                self.reply(ServerEvent::StoryPrompt {
                    room_id: code,
                    prompt,
                });
            }
        }

        Ok(())
    }

    /// Fails if this connection is already in a room other than `target`.
    /// With no target (a create with a generated code) any room counts.
    fn ensure_free(&self, target: Option<&RoomCode>) -> Result<(), Rejection> {
        match &self.room {
            Some(current) if Some(current) != target => {
                Err(Rejection::AlreadyInRoom(current.clone()))
            }
            _ => Ok(()),
        }
    }

    /// The explicit room if given, else the joined one.
    fn target_room(&self, room_id: Option<String>) -> Result<RoomCode, Rejection> {
        room_id
            .as_deref()
            .and_then(RoomCode::parse)
            .or_else(|| self.room.clone())
            .ok_or(Rejection::NoRoom)
    }

    /// Like [`target_room`](Self::target_room), but the room must be the
    /// one this connection joined.
    fn joined_room(&self, room_id: Option<String>) -> Result<RoomCode, Rejection> {
        let code = self.target_room(room_id)?;
        match &self.room {
            Some(current) if *current == code => Ok(code),
            _ => Err(Rejection::NotInRoom(code)),
        }
    }

    fn acting_player(&self, player_id: Option<PlayerId>) -> Result<PlayerId, Rejection> {
        player_id
            .filter(|id| !id.as_str().trim().is_empty())
            .or_else(|| self.player.clone())
            .ok_or(Rejection::NoPlayer)
    }
}
