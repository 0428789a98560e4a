//! Error types for the transport layer.

/// Errors that can occur while accepting or talking to a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed (peer went away, socket closed).
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding, accepting, or the WebSocket upgrade failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
