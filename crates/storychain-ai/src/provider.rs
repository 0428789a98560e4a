//! The content provider seam.
//!
//! Storychain doesn't care where generated text comes from. It defines
//! the [`ContentProvider`] trait (three methods, one per kind of text) and
//! the server is generic over it. Production uses
//! [`GeminiProvider`](crate::GeminiProvider); tests plug in mocks.

use std::future::Future;

use crate::ContentError;

/// Generates story text on request.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one provider is shared by every connection
///   task for the life of the server.
/// - The returned futures are `Send` so calls can run inside
///   `tokio::spawn`ed tasks (automatic twists run detached).
///
/// Implementations may simply write `async fn`; the compiler checks the
/// `Send` bound on each one.
///
/// # Example
///
/// ```rust
/// use storychain_ai::{ContentError, ContentProvider};
///
/// /// Always proposes the same twist.
/// struct Scripted;
///
/// impl ContentProvider for Scripted {
///     async fn generate_twist(&self, _story: &str) -> Result<String, ContentError> {
///         Ok("A door appears in the wall.".into())
///     }
///
///     async fn suggest_next_player(&self, names: &[String]) -> Result<String, ContentError> {
///         Ok(format!("{} should go next!", names.join(" or ")))
///     }
///
///     async fn generate_prompt(
///         &self,
///         _story: &str,
///         _names: &[String],
///     ) -> Result<String, ContentError> {
///         Err(ContentError::NotConfigured)
///     }
/// }
/// ```
pub trait ContentProvider: Send + Sync + 'static {
    /// A one or two sentence twist for the story so far.
    fn generate_twist(
        &self,
        story_text: &str,
    ) -> impl Future<Output = Result<String, ContentError>> + Send;

    /// An advisory note on who should write next.
    fn suggest_next_player(
        &self,
        player_names: &[String],
    ) -> impl Future<Output = Result<String, ContentError>> + Send;

    /// A writing prompt to get players unstuck.
    fn generate_prompt(
        &self,
        story_text: &str,
        player_names: &[String],
    ) -> impl Future<Output = Result<String, ContentError>> + Send;
}

/// A provider with nothing behind it. Every call fails with
/// [`ContentError::NotConfigured`], so a [`Storyteller`](crate::Storyteller)
/// wrapping it always returns fallback text.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl ContentProvider for OfflineProvider {
    async fn generate_twist(&self, _story_text: &str) -> Result<String, ContentError> {
        Err(ContentError::NotConfigured)
    }

    async fn suggest_next_player(&self, _player_names: &[String]) -> Result<String, ContentError> {
        Err(ContentError::NotConfigured)
    }

    async fn generate_prompt(
        &self,
        _story_text: &str,
        _player_names: &[String],
    ) -> Result<String, ContentError> {
        Err(ContentError::NotConfigured)
    }
}
