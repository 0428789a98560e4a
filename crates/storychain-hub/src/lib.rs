//! Broadcast hub for Storychain.
//!
//! This crate answers one question: "who should hear about an event in
//! room X?" Each subscriber registers an outbound queue for a room; the
//! hub pushes a shared copy of every room event onto each queue.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room actors (above)  ← publish events after every state change
//!     ↕
//! Hub (this crate)     ← room code → subscriber → outbound queue
//!     ↕
//! Gateway (below)      ← drains each connection's queue onto its socket
//! ```
//!
//! The hub holds no game state and never blocks: the queues are
//! unbounded, and a closed queue is skipped and pruned.

mod hub;
mod subscriber;

pub use hub::BroadcastHub;
pub use subscriber::{EventReceiver, EventSender, SubscriberId, outbound_channel};
