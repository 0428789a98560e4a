//! Room settings and lifecycle state.

use serde::{Deserialize, Serialize};
use storychain_protocol::AiMode;

use crate::StoryError;

/// Default number of rounds in a story.
pub const DEFAULT_MAX_ROUNDS: u32 = 5;

// ---------------------------------------------------------------------------
// RoomSettings
// ---------------------------------------------------------------------------

/// Per-room settings, fixed when the room is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Number of rounds before the story is finished. Always `>= 1`.
    pub max_rounds: u32,

    /// When automated twists become eligible.
    pub ai_mode: AiMode,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            ai_mode: AiMode::default(),
        }
    }
}

impl RoomSettings {
    /// Validates settings as a client sent them, falling back to
    /// `defaults` for anything omitted.
    ///
    /// `max_rounds` arrives signed so negative values can be reported
    /// rather than rejected by the decoder.
    ///
    /// # Errors
    /// Returns [`StoryError::InvalidSettings`] for a non-positive round
    /// count or an unrecognized AI mode name.
    pub fn resolve(
        max_rounds: Option<i64>,
        ai_mode: Option<&str>,
        defaults: RoomSettings,
    ) -> Result<Self, StoryError> {
        let max_rounds = match max_rounds {
            None => defaults.max_rounds,
            Some(n) => u32::try_from(n)
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| {
                    StoryError::InvalidSettings(format!(
                        "maxRounds must be a positive integer, got {n}"
                    ))
                })?,
        };

        let ai_mode = match ai_mode {
            None => defaults.ai_mode,
            Some(name) => AiMode::from_name(name).ok_or_else(|| {
                StoryError::InvalidSettings(format!(
                    "unknown aiMode `{name}`, expected one of: {}",
                    AiMode::NAMES.join(", ")
                ))
            })?,
        };

        Ok(Self {
            max_rounds,
            ai_mode,
        })
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Active ──(final round completes)──→ Finished
/// ```
///
/// There is no way back: a finished story stays finished until every
/// player leaves and the room is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomState {
    /// Accepting joins and turns.
    #[default]
    Active,
    /// All rounds are done. Reads still work; joins and turns don't.
    Finished,
}

impl RoomState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
