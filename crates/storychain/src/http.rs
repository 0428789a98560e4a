//! HTTP JSON API over the same rooms the WebSocket gateway serves.
//!
//! Every mutating route goes through the room actors, so WebSocket
//! subscribers see HTTP-driven changes as ordinary broadcasts.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storychain_ai::ContentProvider;
use storychain_protocol::{
    Codec, Player, PlayerId, PlayerInfo, RoomCode, RoomSnapshot, RoomSummary, RoundProgress,
    StoryEntry,
};
use storychain_room::{RoomSettings, StoryError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::content;
use crate::server::ServerState;

type AppState<P, C> = State<Arc<ServerState<P, C>>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON body returned for error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind, the same one WebSocket clients see.
    pub error: String,
    pub message: String,
}

/// HTTP-layer wrapper around [`StoryError`] that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub StoryError);

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoryError::RoomNotFound(_)
            | StoryError::Unavailable(_)
            | StoryError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            StoryError::NotYourTurn(_) => StatusCode::FORBIDDEN,
            StoryError::RoomInactive(_) | StoryError::GameFinished(_) => StatusCode::CONFLICT,
            StoryError::EmptyContent | StoryError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
        };

        let body = ErrorBody {
            error: self.0.kind().to_owned(),
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /rooms`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default, alias = "room_id")]
    pub room_id: Option<String>,
    #[serde(default)]
    pub creator: Option<PlayerInfo>,
    #[serde(default, alias = "max_rounds")]
    pub max_rounds: Option<i64>,
    #[serde(default, alias = "ai_mode")]
    pub ai_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[serde(alias = "player_id")]
    pub player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(alias = "player_id")]
    pub player_id: PlayerId,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub rooms: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room: RoomSnapshot,
    pub creator: Option<Player>,
    /// `false` when the code already existed.
    pub created: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub player: Player,
    pub room: RoomSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResponse {
    pub player: Player,
    pub room_deleted: bool,
    pub room: Option<RoomSnapshot>,
    /// Present when the departure closed the current round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<RoundProgress>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersResponse {
    pub room_id: RoomCode,
    pub players: Vec<Player>,
    pub current_turn: usize,
    pub current_player: Option<Player>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    pub room_id: RoomCode,
    pub story: Vec<StoryEntry>,
    pub current_round: u32,
    pub max_rounds: u32,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub story_part: StoryEntry,
    pub progress: RoundProgress,
    pub room: RoomSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwistResponse {
    pub twist: StoryEntry,
    pub room: RoomSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub room_id: RoomCode,
    pub suggestion: String,
    pub current_player: Option<Player>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub room_id: RoomCode,
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Builds the API router over `state`, with permissive CORS and request
/// tracing.
pub(crate) fn router<P, C>(state: Arc<ServerState<P, C>>) -> Router
where
    P: ContentProvider,
    C: Codec,
{
    Router::new()
        .route("/health", get(health::<P, C>))
        .route("/rooms", post(create_room::<P, C>).get(list_rooms::<P, C>))
        .route("/rooms/{id}", get(get_room::<P, C>))
        .route("/rooms/{id}/join", post(join_room::<P, C>))
        .route("/rooms/{id}/leave", post(leave_room::<P, C>))
        .route("/rooms/{id}/players", get(get_players::<P, C>))
        .route("/rooms/{id}/shuffle", post(shuffle_players::<P, C>))
        .route(
            "/rooms/{id}/story",
            get(get_story::<P, C>).post(submit_turn::<P, C>),
        )
        .route("/rooms/{id}/twist", post(request_twist::<P, C>))
        .route("/rooms/{id}/suggestion", get(suggest_next_player::<P, C>))
        .route("/rooms/{id}/prompt", get(generate_prompt::<P, C>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health
async fn health<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rooms: state.registry.room_count(),
        timestamp: Utc::now(),
    })
}

/// POST /rooms
#[instrument(skip(state, request))]
async fn create_room<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let settings = RoomSettings::resolve(
        request.max_rounds,
        request.ai_mode.as_deref(),
        state.config.room_defaults,
    )?;
    let code = request.room_id.as_deref().and_then(RoomCode::parse);

    let outcome = state
        .registry
        .create(
            code,
            request.creator.map(PlayerInfo::into_player),
            settings,
            None,
        )
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(CreateRoomResponse {
            room: outcome.room,
            creator: outcome.creator,
            created: outcome.created,
        }),
    ))
}

/// GET /rooms
async fn list_rooms<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
) -> Json<Vec<RoomSummary>> {
    Json(state.registry.list().await)
}

/// GET /rooms/{id}
async fn get_room<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let room = state.registry.snapshot(&RoomCode::new(&id)).await?;
    Ok(Json(room))
}

/// POST /rooms/{id}/join
#[instrument(skip(state, player))]
async fn join_room<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
    Json(player): Json<PlayerInfo>,
) -> Result<Json<JoinResponse>, ApiError> {
    let outcome = state
        .registry
        .join(&RoomCode::new(&id), player.into_player(), None)
        .await?;
    Ok(Json(JoinResponse {
        player: outcome.player,
        room: outcome.room,
    }))
}

/// POST /rooms/{id}/leave
#[instrument(skip(state, request), fields(player = %request.player_id))]
async fn leave_room<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
    Json(request): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let code = RoomCode::new(&id);
    let outcome = state.registry.leave(&code, request.player_id, None).await?;

    let eligible = outcome
        .progress
        .is_some_and(|progress| progress.automated_twist_eligible);
    if eligible && state.config.auto_twists {
        content::spawn_automated_twist(Arc::clone(&state), code);
    }

    Ok(Json(LeaveResponse {
        room_deleted: outcome.room_deleted(),
        player: outcome.player,
        room: outcome.room,
        progress: outcome.progress,
    }))
}

/// GET /rooms/{id}/players
async fn get_players<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
) -> Result<Json<PlayersResponse>, ApiError> {
    let room = state.registry.snapshot(&RoomCode::new(&id)).await?;
    Ok(Json(PlayersResponse {
        room_id: room.id,
        players: room.players,
        current_turn: room.current_turn,
        current_player: room.current_player,
    }))
}

/// POST /rooms/{id}/shuffle
#[instrument(skip(state))]
async fn shuffle_players<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let room = state.registry.shuffle(&RoomCode::new(&id)).await?;
    Ok(Json(room))
}

/// GET /rooms/{id}/story
async fn get_story<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
) -> Result<Json<StoryResponse>, ApiError> {
    let room = state.registry.snapshot(&RoomCode::new(&id)).await?;
    Ok(Json(StoryResponse {
        room_id: room.id,
        story: room.story,
        current_round: room.current_round,
        max_rounds: room.max_rounds,
        is_active: room.is_active,
    }))
}

/// POST /rooms/{id}/story
#[instrument(skip(state, request), fields(player = %request.player_id))]
async fn submit_turn<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let code = RoomCode::new(&id);
    let outcome = state
        .registry
        .submit_turn(&code, request.player_id, request.content)
        .await?;

    if outcome.progress.automated_twist_eligible && state.config.auto_twists {
        content::spawn_automated_twist(Arc::clone(&state), code);
    }

    Ok(Json(SubmitResponse {
        story_part: outcome.entry,
        progress: outcome.progress,
        room: outcome.room,
    }))
}

/// POST /rooms/{id}/twist
#[instrument(skip(state))]
async fn request_twist<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
) -> Result<Json<TwistResponse>, ApiError> {
    let outcome = content::inject_twist(&state, &RoomCode::new(&id)).await?;
    Ok(Json(TwistResponse {
        twist: outcome.twist,
        room: outcome.room,
    }))
}

/// GET /rooms/{id}/suggestion
async fn suggest_next_player<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let code = RoomCode::new(&id);
    let (suggestion, current_player) = content::suggest_next_player(&state, &code).await?;
    Ok(Json(SuggestionResponse {
        room_id: code,
        suggestion,
        current_player,
    }))
}

/// GET /rooms/{id}/prompt
async fn generate_prompt<P: ContentProvider, C: Codec>(
    State(state): AppState<P, C>,
    Path(id): Path<String>,
) -> Result<Json<PromptResponse>, ApiError> {
    let code = RoomCode::new(&id);
    let prompt = content::writing_prompt(&state, &code).await?;
    Ok(Json(PromptResponse {
        room_id: code,
        prompt,
    }))
}
