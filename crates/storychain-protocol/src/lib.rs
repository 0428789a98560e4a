//! Wire protocol for Storychain.
//!
//! This crate defines the "language" that story clients and the server
//! speak:
//!
//! - **Records** ([`Player`], [`StoryEntry`], [`RoomSnapshot`], etc.):
//!   the data shapes every surface (WebSocket and HTTP) serializes.
//! - **Commands** ([`ClientCommand`]): what a client can ask for, a closed
//!   set of variants tagged by a `type` field.
//! - **Events** ([`ServerEvent`]): what the server pushes back, either as
//!   a direct reply or as a room broadcast.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer. It doesn't know about connections or room actors; it only knows
//! how messages look.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand) → Gateway → Room actor
//! ```

mod codec;
mod command;
mod error;
mod event;
mod ids;
mod records;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{ClientCommand, decode_command};
pub use error::ProtocolError;
pub use event::ServerEvent;
pub use ids::{PlayerId, RoomCode};
pub use records::{
    AI_AUTHOR, AiMode, Player, PlayerInfo, RoomSnapshot, RoomSummary,
    RoundProgress, StoryEntry,
};
