//! Rooms for Storychain: state, rules, and lifecycle.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! players, its story, and its turn/round bookkeeping. The registry maps
//! room codes to actor handles and deletes rooms as they empty.
//!
//! # Key types
//!
//! - [`Room`]: a room's state and the turn/round engine, as plain methods
//! - [`RoomRegistry`]: creates rooms, looks them up, lists them
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomSettings`]: round count and AI mode, fixed at creation
//! - [`RoomState`]: `Active` or `Finished`
//! - [`StoryError`]: everything a room operation can reject

mod config;
mod engine;
mod error;
mod manager;
mod room;

pub use config::{DEFAULT_MAX_ROUNDS, RoomSettings, RoomState};
pub use engine::{Departure, JoinStatus, Room, Submission};
pub use error::StoryError;
pub use manager::{CreateOutcome, RoomRegistry};
pub use room::{JoinOutcome, LeaveOutcome, RoomHandle, Subscriber, TurnOutcome, TwistOutcome};
