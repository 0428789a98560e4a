//! Events the server sends: direct replies and room broadcasts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Player, PlayerId, RoomCode, RoomSnapshot, RoomSummary, RoundProgress, StoryEntry};

/// Every outbound event, tagged by its `type` field.
///
/// Events marked *broadcast* are fanned out to the room's subscribers by
/// the hub; the rest are direct replies to the connection that asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent once when a connection opens.
    Connected {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Reply to `create_room`.
    RoomCreated { room: RoomSnapshot },

    /// Reply to `join_room`, carrying the player as seated (with any
    /// generated id).
    JoinedRoom { player: Player, room: RoomSnapshot },

    /// *Broadcast* to everyone else in the room when a player joins.
    PlayerJoined { player: Player, room: RoomSnapshot },

    /// Reply to `leave_room`.
    LeftRoom {
        room_id: RoomCode,
        room_deleted: bool,
        message: String,
    },

    /// *Broadcast* to the remaining players when someone leaves.
    PlayerLeft {
        player_id: PlayerId,
        room: RoomSnapshot,
    },

    /// *Broadcast* to the whole room after a turn is accepted.
    StoryUpdated {
        story_part: StoryEntry,
        progress: RoundProgress,
        room: RoomSnapshot,
    },

    /// *Broadcast* once the final round completes.
    StoryFinished {
        room_id: RoomCode,
        final_round: u32,
        story: Vec<StoryEntry>,
    },

    /// *Broadcast* after the turn order is shuffled.
    PlayersShuffled { room: RoomSnapshot },

    /// *Broadcast* after a twist is appended.
    AutomatedTwistAdded { twist: StoryEntry, room: RoomSnapshot },

    RoomInfo { room: RoomSnapshot },

    StoryHistory {
        room_id: RoomCode,
        story: Vec<StoryEntry>,
    },

    PlayersList {
        room_id: RoomCode,
        players: Vec<Player>,
        current_turn: usize,
        current_player: Option<Player>,
    },

    CurrentTurn {
        room_id: RoomCode,
        current_player: Option<Player>,
    },

    RoomList { rooms: Vec<RoomSummary> },

    AiPlayerSuggestion {
        room_id: RoomCode,
        suggestion: String,
        current_player: Option<Player>,
    },

    StoryPrompt { room_id: RoomCode, prompt: String },

    /// A failed command. Only ever sent to the connection that issued it.
    ///
    /// `kind` is stable and machine-readable (`not_your_turn`,
    /// `room_not_found`, ...); `message` is for humans.
    Error { kind: String, message: String },
}

impl ServerEvent {
    /// The wire `type` tag, handy for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::RoomCreated { .. } => "room_created",
            Self::JoinedRoom { .. } => "joined_room",
            Self::PlayerJoined { .. } => "player_joined",
            Self::LeftRoom { .. } => "left_room",
            Self::PlayerLeft { .. } => "player_left",
            Self::StoryUpdated { .. } => "story_updated",
            Self::StoryFinished { .. } => "story_finished",
            Self::PlayersShuffled { .. } => "players_shuffled",
            Self::AutomatedTwistAdded { .. } => "automated_twist_added",
            Self::RoomInfo { .. } => "room_info",
            Self::StoryHistory { .. } => "story_history",
            Self::PlayersList { .. } => "players_list",
            Self::CurrentTurn { .. } => "current_turn",
            Self::RoomList { .. } => "room_list",
            Self::AiPlayerSuggestion { .. } => "ai_player_suggestion",
            Self::StoryPrompt { .. } => "story_prompt",
            Self::Error { .. } => "error",
        }
    }
}
