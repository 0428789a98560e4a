//! Generated story content for Storychain.
//!
//! The server never talks to a text generator directly. It goes through
//! a [`Storyteller`], which wraps any [`ContentProvider`] with a timeout,
//! fixed fallback text, and the keyword [`screen`]. A storyteller call
//! always produces usable text, so provider outages never reach players
//! as errors.
//!
//! ```text
//! Gateway / HTTP ──→ Storyteller ──timeout──→ ContentProvider (Gemini, mock, ...)
//!                        │
//!                 fallback + screen
//! ```
//!
//! Providers:
//!
//! - [`GeminiProvider`]: Google's `generateContent` REST API via `reqwest`
//! - [`OfflineProvider`]: always fails, so every call uses its fallback

mod error;
mod gemini;
mod prompts;
mod provider;
mod screen;
mod storyteller;

pub use error::ContentError;
pub use gemini::{DEFAULT_GEMINI_URL, GeminiProvider};
pub use provider::{ContentProvider, OfflineProvider};
pub use screen::{BLOCKED_KEYWORDS, SCREENED_REPLACEMENT, is_flagged, screen};
pub use storyteller::{
    DEFAULT_TIMEOUT, FALLBACK_PROMPT, FALLBACK_SUGGESTION, FALLBACK_TWIST, Storyteller,
};
