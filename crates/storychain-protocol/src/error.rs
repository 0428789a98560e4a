//! Error types for the protocol layer.
//!
//! Each crate in Storychain defines its own error enum. When you see a
//! `ProtocolError`, the problem is in the shape of a message, not in the
//! network or in room rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or wrong
    /// data types for a known command.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is structurally invalid, e.g. it has no `type` tag.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The `type` tag names a command this server doesn't know.
    #[error("unknown command type: {0}")]
    UnknownCommand(String),
}

impl ProtocolError {
    /// Stable, machine-readable kind sent to clients in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            #[cfg(feature = "json")]
            Self::Encode(_) => "internal_error",
            _ => "invalid_message",
        }
    }
}
