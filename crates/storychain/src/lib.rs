//! # Storychain
//!
//! Collaborative, turn-based storytelling server.
//!
//! Players gather in rooms and take turns adding to a shared story. A
//! content provider adds twists between rounds and offers prompts and
//! suggestions. Every room operation is reachable both over a WebSocket
//! channel of tagged commands and events, and over an HTTP JSON API; both
//! fan out changes to the room's subscribers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storychain::prelude::*;
//!
//! # async fn run() -> Result<(), StorychainError> {
//! let config = ServerConfig::from_env()?;
//! let provider = GeminiProvider::new(config.gemini_api_key.clone());
//! let server = StorychainServerBuilder::new()
//!     .config(config)
//!     .build(provider)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod content;
mod error;
mod gateway;
mod http;
mod server;

pub use config::ServerConfig;
pub use error::StorychainError;
pub use gateway::WELCOME_MESSAGE;
pub use http::{ApiError, ErrorBody};
pub use server::{StorychainServer, StorychainServerBuilder};

/// Re-exports of the types most callers need.
pub mod prelude {
    pub use crate::{ServerConfig, StorychainError, StorychainServer, StorychainServerBuilder};

    pub use storychain_ai::{
        ContentError, ContentProvider, GeminiProvider, OfflineProvider, Storyteller,
    };
    pub use storychain_protocol::{
        AiMode, ClientCommand, Player, PlayerId, PlayerInfo, RoomCode, RoomSnapshot,
        RoomSummary, RoundProgress, ServerEvent, StoryEntry,
    };
    pub use storychain_room::{RoomRegistry, RoomSettings, StoryError};
}
