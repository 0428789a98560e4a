//! Error types for the room layer.

use storychain_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// Every variant has a stable [`kind`](Self::kind) string that clients
/// can match on; the `Display` text is for humans.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoryError {
    /// No room with this code exists.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room's story is finished, so it can't be joined.
    #[error("room {0} is no longer active")]
    RoomInactive(RoomCode),

    /// The room's story is finished, so nothing more can be written.
    #[error("the story in room {0} is finished")]
    GameFinished(RoomCode),

    /// The player isn't seated in the room.
    #[error("player {0} is not in this room")]
    PlayerNotFound(PlayerId),

    /// Someone tried to write out of turn.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The submitted content was blank after trimming.
    #[error("story content cannot be empty")]
    EmptyContent,

    /// Room settings failed validation at creation.
    #[error("invalid room settings: {0}")]
    InvalidSettings(String),

    /// The room's actor stopped between lookup and command delivery,
    /// which only happens when the room was just deleted.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl StoryError {
    /// Stable, machine-readable kind sent to clients in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) | Self::Unavailable(_) => "room_not_found",
            Self::RoomInactive(_) => "room_inactive",
            Self::GameFinished(_) => "game_finished",
            Self::PlayerNotFound(_) => "player_not_found",
            Self::NotYourTurn(_) => "not_your_turn",
            Self::EmptyContent => "empty_content",
            Self::InvalidSettings(_) => "invalid_settings",
        }
    }
}
