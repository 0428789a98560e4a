//! Commands a client can send over the persistent channel.

use serde::{Deserialize, Serialize};

use crate::{Codec, PlayerId, PlayerInfo, ProtocolError};

/// Every inbound command, tagged by its `type` field.
///
/// `#[serde(tag = "type")]` makes the JSON flat:
/// `{ "type": "submit_turn", "roomId": "K7QX2M", "content": "..." }`.
/// Being a closed enum, the gateway's `match` is exhaustive: adding a
/// command without handling it is a compile error.
///
/// Most commands take an optional `roomId`/`playerId`. When omitted the
/// gateway uses the room and player the connection joined with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientCommand {
    /// Create a room (or fetch it, if the code already exists).
    ///
    /// `maxRounds` is signed so a non-positive value reaches validation
    /// and is reported as invalid settings instead of a decode error.
    CreateRoom {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
        #[serde(default)]
        creator: Option<PlayerInfo>,
        #[serde(default, alias = "max_rounds")]
        max_rounds: Option<i64>,
        #[serde(default, alias = "ai_mode")]
        ai_mode: Option<String>,
    },

    /// Take a seat in an existing room.
    JoinRoom {
        #[serde(alias = "room_id")]
        room_id: String,
        #[serde(default)]
        player: PlayerInfo,
    },

    /// Give up a seat.
    LeaveRoom {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
        #[serde(default, alias = "player_id")]
        player_id: Option<PlayerId>,
    },

    /// Append a part to the story. Must be the sender's turn.
    #[serde(alias = "add_story_part")]
    SubmitTurn {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
        #[serde(default, alias = "player_id")]
        player_id: Option<PlayerId>,
        #[serde(default)]
        content: String,
    },

    /// Ask the content provider for a twist and append it.
    #[serde(alias = "add_ai_twist")]
    RequestAutomatedTwist {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },

    /// Randomize the turn order.
    ShufflePlayers {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },

    GetRoomInfo {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },

    GetStoryHistory {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },

    GetPlayers {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },

    GetCurrentTurn {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },

    ListRooms,

    /// Ask the content provider who should go next (advisory text only).
    AiSuggestNextPlayer {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },

    /// Ask the content provider for a writing prompt.
    GeneratePrompt {
        #[serde(default, alias = "room_id")]
        room_id: Option<String>,
    },
}

impl ClientCommand {
    /// Every `type` tag the server accepts, aliases included.
    pub const KINDS: &'static [&'static str] = &[
        "create_room",
        "join_room",
        "leave_room",
        "submit_turn",
        "add_story_part",
        "request_automated_twist",
        "add_ai_twist",
        "shuffle_players",
        "get_room_info",
        "get_story_history",
        "get_players",
        "get_current_turn",
        "list_rooms",
        "ai_suggest_next_player",
        "generate_prompt",
    ];
}

/// Just the tag, for telling "unknown command" apart from "bad payload".
#[derive(Deserialize)]
struct TagOnly {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Decodes an inbound frame into a [`ClientCommand`].
///
/// # Errors
/// - [`ProtocolError::Decode`]: not valid for the codec at all, or a
///   known command with a bad payload
/// - [`ProtocolError::InvalidMessage`]: no `type` tag
/// - [`ProtocolError::UnknownCommand`]: a `type` tag this server doesn't know
pub fn decode_command<C: Codec>(codec: &C, data: &[u8]) -> Result<ClientCommand, ProtocolError> {
    let tag: TagOnly = codec.decode(data)?;
    let kind = tag
        .kind
        .ok_or_else(|| ProtocolError::InvalidMessage("missing `type` field".into()))?;
    if !ClientCommand::KINDS.contains(&kind.as_str()) {
        return Err(ProtocolError::UnknownCommand(kind));
    }
    codec.decode(data)
}
