//! The broadcast hub: room code → subscribers → outbound queues.
//!
//! # Concurrency note
//!
//! The registry sits behind a `std::sync::Mutex`, not a tokio one. Every
//! operation is a handful of map edits plus non-blocking `send`s on
//! unbounded queues, so the lock is never held across an `.await`.
//!
//! Because `broadcast` enqueues to every subscriber while holding the
//! lock, two broadcasts for the same room can't interleave: every
//! subscriber sees a room's events in the order they were published.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storychain_protocol::{RoomCode, ServerEvent};

use crate::{EventSender, SubscriberId};

type Subscribers = HashMap<SubscriberId, EventSender>;

/// Fans room events out to every subscribed connection.
///
/// ## Lifecycle
///
/// ```text
/// subscribe(room, id, tx) ──→ broadcast(room, ..) ──→ unsubscribe(room, id)
///                                    │                       │
///                        closed tx?  ▼                       ▼
///                              pruned silently      room entry dropped
///                                                   when it empties
/// ```
#[derive(Debug, Default)]
pub struct BroadcastHub {
    rooms: Mutex<HashMap<RoomCode, Subscribers>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the registry. A panic in another holder can't leave the maps
    /// half-edited (every edit is a single insert/remove), so a poisoned
    /// lock is still safe to use.
    fn rooms(&self) -> MutexGuard<'_, HashMap<RoomCode, Subscribers>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `sender` to receive `room`'s events as `id`.
    ///
    /// Subscribing the same id twice replaces the earlier queue.
    pub fn subscribe(&self, room: &RoomCode, id: SubscriberId, sender: EventSender) {
        let mut rooms = self.rooms();
        let subscribers = rooms.entry(room.clone()).or_default();
        subscribers.insert(id, sender);
        tracing::debug!(%room, subscriber = %id, count = subscribers.len(), "subscribed");
    }

    /// Stops delivering `room`'s events to `id`.
    ///
    /// Idempotent: returns `false` if `id` wasn't subscribed. A room left
    /// with no subscribers is removed from the registry.
    pub fn unsubscribe(&self, room: &RoomCode, id: SubscriberId) -> bool {
        let mut rooms = self.rooms();
        let Some(subscribers) = rooms.get_mut(room) else {
            return false;
        };
        let removed = subscribers.remove(&id).is_some();
        if subscribers.is_empty() {
            rooms.remove(room);
        }
        if removed {
            tracing::debug!(%room, subscriber = %id, "unsubscribed");
        }
        removed
    }

    /// Removes `id` from every room. Used when a connection closes.
    ///
    /// Returns how many subscriptions were dropped.
    pub fn unsubscribe_all(&self, id: SubscriberId) -> usize {
        let mut rooms = self.rooms();
        let mut dropped = 0;
        rooms.retain(|_, subscribers| {
            if subscribers.remove(&id).is_some() {
                dropped += 1;
            }
            !subscribers.is_empty()
        });
        dropped
    }

    /// Forgets every subscriber of `room`, e.g. after the room is deleted.
    pub fn remove_room(&self, room: &RoomCode) {
        if let Some(subscribers) = self.rooms().remove(room) {
            tracing::debug!(%room, count = subscribers.len(), "room channel removed");
        }
    }

    /// Delivers `event` to every subscriber of `room` except `exclude`.
    ///
    /// Returns the number of queues the event was delivered to. Queues
    /// whose receiver is gone are skipped and pruned; a room nobody is
    /// subscribed to is a no-op.
    pub fn broadcast(
        &self,
        room: &RoomCode,
        event: ServerEvent,
        exclude: Option<SubscriberId>,
    ) -> usize {
        let event = Arc::new(event);
        let mut rooms = self.rooms();
        let Some(subscribers) = rooms.get_mut(room) else {
            return 0;
        };

        let mut delivered = 0;
        subscribers.retain(|id, sender| {
            if Some(*id) == exclude {
                return true;
            }
            match sender.send(Arc::clone(&event)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::debug!(%room, subscriber = %id, "dropping closed subscriber");
                    false
                }
            }
        });
        if subscribers.is_empty() {
            rooms.remove(room);
        }

        tracing::trace!(%room, kind = event.kind(), delivered, "broadcast");
        delivered
    }

    /// Number of live subscriptions for `room`.
    pub fn subscriber_count(&self, room: &RoomCode) -> usize {
        self.rooms().get(room).map_or(0, HashMap::len)
    }

    /// Returns `true` if `id` is subscribed to `room`.
    pub fn is_subscribed(&self, room: &RoomCode, id: SubscriberId) -> bool {
        self.rooms()
            .get(room)
            .is_some_and(|subscribers| subscribers.contains_key(&id))
    }

    /// Number of rooms with at least one subscriber.
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }
}

// =========================================================================
// Tests
// =========================================================================
