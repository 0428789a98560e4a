//! Data records shared by every surface: players, story entries, room
//! snapshots.
//!
//! Field names are camelCase on the wire (`joinedAt`, `authorId`,
//! `currentTurn`) because the browser client is JavaScript.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlayerId, RoomCode};

/// Author marker stamped on every automated twist.
pub const AI_AUTHOR: &str = "AI";

/// Display name given to players who join without one.
const ANONYMOUS: &str = "Anonymous";

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A seated player. Insertion order in the room is turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    /// Creates a player who joins right now.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            joined_at: Utc::now(),
        }
    }
}

/// The `{ id?, name }` descriptor clients send when creating or joining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub id: Option<PlayerId>,
    #[serde(default)]
    pub name: Option<String>,
}

impl PlayerInfo {
    /// Turns the descriptor into a [`Player`], generating an id and
    /// defaulting the name when they're missing or blank.
    pub fn into_player(self) -> Player {
        let id = self
            .id
            .filter(|id| !id.as_str().trim().is_empty())
            .unwrap_or_else(PlayerId::generate);
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| ANONYMOUS.to_owned());
        Player::new(id, name)
    }
}

// ---------------------------------------------------------------------------
// Story entries
// ---------------------------------------------------------------------------

/// One entry of the append-only story.
///
/// Internally tagged by `type`, so a part looks like
/// `{ "type": "story_part", "content": "...", "authorId": "p1", ... }`.
/// Both variants carry the round they were written in; only
/// `StoryPart` entries count toward round completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum StoryEntry {
    /// A human player's contribution.
    StoryPart {
        content: String,
        author: String,
        author_id: PlayerId,
        round: u32,
        timestamp: DateTime<Utc>,
    },

    /// An automated twist. `author` is always [`AI_AUTHOR`].
    AiTwist {
        content: String,
        author: String,
        round: u32,
        timestamp: DateTime<Utc>,
    },
}

impl StoryEntry {
    /// A part written by `author` during `round`.
    pub fn story_part(content: String, author: &Player, round: u32) -> Self {
        Self::StoryPart {
            content,
            author: author.name.clone(),
            author_id: author.id.clone(),
            round,
            timestamp: Utc::now(),
        }
    }

    /// A twist injected during `round`.
    pub fn ai_twist(content: String, round: u32) -> Self {
        Self::AiTwist {
            content,
            author: AI_AUTHOR.to_owned(),
            round,
            timestamp: Utc::now(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::StoryPart { content, .. } | Self::AiTwist { content, .. } => content,
        }
    }

    pub fn round(&self) -> u32 {
        match self {
            Self::StoryPart { round, .. } | Self::AiTwist { round, .. } => *round,
        }
    }

    /// Returns `true` for entries written by a human player.
    pub fn is_human(&self) -> bool {
        matches!(self, Self::StoryPart { .. })
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How often automated twists become eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiMode {
    /// After every completed round.
    #[serde(rename = "every_round")]
    EveryRound,
    /// After every even-numbered completed round.
    #[serde(rename = "every_2_rounds")]
    EveryTwoRounds,
    /// Only when a client asks for one.
    #[default]
    #[serde(rename = "manual_only")]
    ManualOnly,
}

impl AiMode {
    /// Every accepted wire name, in a stable order (used in error messages).
    pub const NAMES: [&'static str; 3] = ["every_round", "every_2_rounds", "manual_only"];

    /// Parses a wire name. Returns `None` for anything unrecognized.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "every_round" => Some(Self::EveryRound),
            "every_2_rounds" => Some(Self::EveryTwoRounds),
            "manual_only" => Some(Self::ManualOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EveryRound => "every_round",
            Self::EveryTwoRounds => "every_2_rounds",
            Self::ManualOnly => "manual_only",
        }
    }
}

impl fmt::Display for AiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// A full copy of a room's state at one instant.
///
/// Snapshots are what travel in events and HTTP responses; the live room
/// never leaves its actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomCode,
    pub players: Vec<Player>,
    pub story: Vec<StoryEntry>,
    pub current_turn: usize,
    pub current_player: Option<Player>,
    pub current_round: u32,
    pub max_rounds: u32,
    pub ai_mode: AiMode,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub round_started_at: DateTime<Utc>,
}

impl RoomSnapshot {
    /// The story as plain text, entries joined by single spaces.
    pub fn story_text(&self) -> String {
        self.story
            .iter()
            .map(StoryEntry::content)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Seated player names in turn order.
    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }
}

/// A one-line summary of a room for room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomCode,
    pub player_count: usize,
    pub current_round: u32,
    pub max_rounds: u32,
    pub ai_mode: AiMode,
    pub is_active: bool,
}

impl From<&RoomSnapshot> for RoomSummary {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            id: room.id.clone(),
            player_count: room.players.len(),
            current_round: room.current_round,
            max_rounds: room.max_rounds,
            ai_mode: room.ai_mode,
            is_active: room.is_active,
        }
    }
}

/// Round bookkeeping after a turn submission, or after a leave that
/// closed a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundProgress {
    /// The round the submitted part was tagged with.
    pub round: u32,
    /// `true` if this submission completed `round`.
    pub round_complete: bool,
    /// The room's round after the submission (may exceed `max_rounds`
    /// once the story is finished).
    pub current_round: u32,
    /// `true` if this submission completed the final round.
    pub finished: bool,
    /// `true` if the room's AI mode makes a twist eligible now.
    pub automated_twist_eligible: bool,
}
