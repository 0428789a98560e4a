//! Subscriber identity and the outbound queue type.

use std::fmt;
use std::sync::Arc;

use storychain_protocol::ServerEvent;
use tokio::sync::mpsc;

/// Identifies one subscriber (in practice, one WebSocket connection).
///
/// The gateway derives it from the transport's connection id, so the same
/// number shows up in transport and hub logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Sending half of a subscriber's outbound queue.
///
/// Events are wrapped in `Arc` so a broadcast to N subscribers clones a
/// pointer N times instead of the whole room snapshot.
pub type EventSender = mpsc::UnboundedSender<Arc<ServerEvent>>;

/// Receiving half, drained by the connection's writer task.
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<ServerEvent>>;

/// Creates a fresh outbound queue.
pub fn outbound_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
