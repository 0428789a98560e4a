//! Content provider flows shared by the gateway and the HTTP API.
//!
//! None of these hold a room while the provider runs. The room is read in
//! one actor step, the provider is awaited with no room involvement, and a
//! twist is appended in a second actor step. Turns submitted in between are
//! kept; the twist simply lands after them.

use std::sync::Arc;

use storychain_ai::ContentProvider;
use storychain_protocol::{Codec, Player, RoomCode};
use storychain_room::{StoryError, TwistOutcome};

use crate::server::ServerState;

/// Generates a twist for the room's story and appends it.
///
/// The room actor broadcasts `automated_twist_added` to every subscriber.
///
/// # Errors
/// - [`StoryError::RoomNotFound`] if the room doesn't exist, or
///   [`StoryError::Unavailable`] if it's deleted while the provider runs
/// - [`StoryError::GameFinished`] if the story is finished before or after
///   the provider call
pub(crate) async fn inject_twist<P, C>(
    state: &ServerState<P, C>,
    code: &RoomCode,
) -> Result<TwistOutcome, StoryError>
where
    P: ContentProvider,
    C: Codec,
{
    let room = state.registry.snapshot(code).await?;
    if !room.is_active {
        return Err(StoryError::GameFinished(code.clone()));
    }

    let text = state.storyteller.twist(&room.story_text()).await;

    state.registry.append_twist(code, text).await
}

/// Runs [`inject_twist`] in the background.
///
/// Used after a submission completes an eligible round, so the submitter
/// isn't kept waiting on the provider. Failures are only logged: the room
/// may legitimately have emptied or finished in the meantime.
pub(crate) fn spawn_automated_twist<P, C>(state: Arc<ServerState<P, C>>, code: RoomCode)
where
    P: ContentProvider,
    C: Codec,
{
    tokio::spawn(async move {
        match inject_twist(&state, &code).await {
            Ok(outcome) => {
                tracing::info!(room = %code, round = outcome.twist.round(), "automated twist added");
            }
            Err(e) => {
                tracing::debug!(room = %code, error = %e, "automated twist skipped");
            }
        }
    });
}

/// An advisory note on who should write next, plus whose turn it really is.
pub(crate) async fn suggest_next_player<P, C>(
    state: &ServerState<P, C>,
    code: &RoomCode,
) -> Result<(String, Option<Player>), StoryError>
where
    P: ContentProvider,
    C: Codec,
{
    let room = state.registry.snapshot(code).await?;
    let suggestion = state
        .storyteller
        .suggest_next_player(&room.player_names())
        .await;
    Ok((suggestion, room.current_player))
}

/// A writing prompt for the room's story so far.
pub(crate) async fn writing_prompt<P, C>(
    state: &ServerState<P, C>,
    code: &RoomCode,
) -> Result<String, StoryError>
where
    P: ContentProvider,
    C: Codec,
{
    let room = state.registry.snapshot(code).await?;
    Ok(state
        .storyteller
        .prompt(&room.story_text(), &room.player_names())
        .await)
}
