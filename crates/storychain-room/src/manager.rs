//! Room registry: creates, tracks, and routes commands to rooms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storychain_hub::{BroadcastHub, SubscriberId};
use storychain_protocol::{Player, PlayerId, PlayerInfo, RoomCode, RoomSnapshot, RoomSummary};

use crate::engine::Room;
use crate::room::{RoomIndex, spawn_room};
use crate::{
    JoinOutcome, LeaveOutcome, RoomHandle, RoomSettings, StoryError, Subscriber,
    TurnOutcome, TwistOutcome,
};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Result of [`RoomRegistry::create`].
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub room: RoomSnapshot,
    /// The seated creator. `None` only when an existing room was returned.
    pub creator: Option<Player>,
    /// `false` if the code already existed and the existing room was
    /// returned unchanged.
    pub created: bool,
}

/// Owns every live room, keyed by room code.
///
/// This is the entry point for room operations from the gateway and the
/// HTTP API. It's cheap to clone (two `Arc`s) and every clone sees the
/// same rooms; there is no global registry.
///
/// The index lock is only held to look up, insert, or remove a handle,
/// never while talking to a room. Commands go to the room's actor after
/// the lock is released, so rooms never wait on each other.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: RoomIndex,
    hub: Arc<BroadcastHub>,
}

impl RoomRegistry {
    /// Creates an empty registry publishing room events to `hub`.
    pub fn new(hub: Arc<BroadcastHub>) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            hub,
        }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    fn index(&self) -> MutexGuard<'_, HashMap<RoomCode, RoomHandle>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a room, or returns the existing one with this code.
    ///
    /// With no `code`, a fresh 6-character code is generated (retrying on
    /// the rare collision). With no `creator`, a new room seats an
    /// anonymous player, so no room ever exists empty. An existing room is
    /// returned unchanged: `creator` and `settings` are ignored, though
    /// `subscriber` is still attached to it.
    ///
    /// # Errors
    /// Only [`StoryError::Unavailable`], and only if an existing room is
    /// deleted and the retry races again.
    pub async fn create(
        &self,
        code: Option<RoomCode>,
        creator: Option<Player>,
        settings: RoomSettings,
        subscriber: Option<Subscriber>,
    ) -> Result<CreateOutcome, StoryError> {
        let code = code.unwrap_or_else(|| self.unused_code());
        let creator = creator.unwrap_or_else(|| PlayerInfo::default().into_player());

        // A found room can be deleted before we reach its actor; one
        // retry then creates it fresh.
        for _ in 0..2 {
            let existing = {
                let mut rooms = self.index();
                match rooms.get(&code) {
                    Some(handle) => handle.clone(),
                    None => {
                        let (handle, outcome) = self.spawn_new(
                            code.clone(),
                            creator.clone(),
                            settings,
                            subscriber.clone(),
                        );
                        rooms.insert(code.clone(), handle);
                        return Ok(outcome);
                    }
                }
            };

            let attached = match subscriber.clone() {
                Some(sub) => existing.attach(sub).await,
                None => existing.snapshot().await,
            };
            match attached {
                Ok(room) => {
                    tracing::debug!(room = %code, "create on existing room");
                    return Ok(CreateOutcome {
                        room,
                        creator: None,
                        created: false,
                    });
                }
                Err(StoryError::Unavailable(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(StoryError::Unavailable(code))
    }

    /// Builds and spawns a new room. Called with the index locked.
    fn spawn_new(
        &self,
        code: RoomCode,
        creator: Player,
        settings: RoomSettings,
        subscriber: Option<Subscriber>,
    ) -> (RoomHandle, CreateOutcome) {
        let mut room = Room::new(code.clone(), settings);
        // A fresh room is active, so this can't fail.
        let _ = room.join(creator.clone());
        if let Some((id, sender)) = subscriber {
            self.hub.subscribe(&code, id, sender);
        }
        let snapshot = room.snapshot();

        tracing::info!(
            room = %code,
            max_rounds = settings.max_rounds,
            ai_mode = %settings.ai_mode,
            "room created"
        );

        let handle = spawn_room(
            room,
            Arc::clone(&self.hub),
            Arc::clone(&self.rooms),
            DEFAULT_CHANNEL_SIZE,
        );
        let outcome = CreateOutcome {
            room: snapshot,
            creator: Some(creator),
            created: true,
        };
        (handle, outcome)
    }

    fn unused_code(&self) -> RoomCode {
        let rooms = self.index();
        loop {
            let code = RoomCode::generate();
            if !rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Looks up a room's handle.
    ///
    /// # Errors
    /// [`StoryError::RoomNotFound`] if no room has this code.
    pub fn get(&self, code: &RoomCode) -> Result<RoomHandle, StoryError> {
        self.index()
            .get(code)
            .cloned()
            .ok_or_else(|| StoryError::RoomNotFound(code.clone()))
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.index().contains_key(code)
    }

    /// A copy of the room's current state.
    pub async fn snapshot(&self, code: &RoomCode) -> Result<RoomSnapshot, StoryError> {
        self.get(code)?.snapshot().await
    }

    /// Seats `player` in the room. See [`RoomHandle::join`].
    pub async fn join(
        &self,
        code: &RoomCode,
        player: Player,
        subscriber: Option<Subscriber>,
    ) -> Result<JoinOutcome, StoryError> {
        self.get(code)?.join(player, subscriber).await
    }

    /// Removes a player; deletes the room when it empties.
    pub async fn leave(
        &self,
        code: &RoomCode,
        player_id: PlayerId,
        origin: Option<SubscriberId>,
    ) -> Result<LeaveOutcome, StoryError> {
        self.get(code)?.leave(player_id, origin).await
    }

    pub async fn submit_turn(
        &self,
        code: &RoomCode,
        player_id: PlayerId,
        content: String,
    ) -> Result<TurnOutcome, StoryError> {
        self.get(code)?.submit_turn(player_id, content).await
    }

    pub async fn shuffle(&self, code: &RoomCode) -> Result<RoomSnapshot, StoryError> {
        self.get(code)?.shuffle().await
    }

    pub async fn append_twist(
        &self,
        code: &RoomCode,
        content: String,
    ) -> Result<TwistOutcome, StoryError> {
        self.get(code)?.append_twist(content).await
    }

    /// Summaries of every live room, ordered by code.
    ///
    /// Rooms deleted while the list is being built are skipped.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.index().values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(room) = handle.snapshot().await {
                summaries.push(RoomSummary::from(&room));
            }
        }
        summaries.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        summaries
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.index().len()
    }
}
