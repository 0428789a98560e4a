//! Unified error type for the Storychain server.

use storychain_ai::ContentError;
use storychain_protocol::ProtocolError;
use storychain_room::StoryError;
use storychain_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Server code deals with this single type instead of importing errors
/// from each sub-crate. The `#[from]` attribute on each variant generates
/// the `From` impls, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum StorychainError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown command).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room rule was broken (not your turn, room not found, ...).
    #[error(transparent)]
    Story(#[from] StoryError),

    /// The content provider failed. Normally absorbed by the storyteller.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Binding or serving the HTTP API failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration value couldn't be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}
