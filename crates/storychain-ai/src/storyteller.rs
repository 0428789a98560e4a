//! Timeout, fallback, and screening around a [`ContentProvider`].

use std::future::Future;
use std::time::Duration;

use crate::{ContentError, ContentProvider, screen};

/// Default provider timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Used when a twist can't be generated.
pub const FALLBACK_TWIST: &str =
    "Suddenly, the story takes an unexpected turn that no one saw coming!";

/// Used when a next-player suggestion can't be generated.
pub const FALLBACK_SUGGESTION: &str = "The story continues with the next player's turn!";

/// Used when a writing prompt can't be generated.
pub const FALLBACK_PROMPT: &str = "Continue the story with your own creative addition!";

/// Wraps a provider so every call returns usable, screened text.
///
/// Each call is bounded by `timeout`. A provider error, a timeout, or a
/// blank answer is logged at `warn` and replaced by the matching
/// `FALLBACK_*` constant. Whatever text survives is trimmed and passed
/// through the keyword [`screen`].
#[derive(Debug, Clone)]
pub struct Storyteller<P> {
    provider: P,
    timeout: Duration,
}

impl<P: ContentProvider> Storyteller<P> {
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A twist for `story_text`.
    pub async fn twist(&self, story_text: &str) -> String {
        self.resolve(
            "twist",
            self.provider.generate_twist(story_text),
            FALLBACK_TWIST,
        )
        .await
    }

    /// An advisory next-player suggestion.
    pub async fn suggest_next_player(&self, player_names: &[String]) -> String {
        self.resolve(
            "suggestion",
            self.provider.suggest_next_player(player_names),
            FALLBACK_SUGGESTION,
        )
        .await
    }

    /// A writing prompt for the story so far.
    pub async fn prompt(&self, story_text: &str, player_names: &[String]) -> String {
        self.resolve(
            "prompt",
            self.provider.generate_prompt(story_text, player_names),
            FALLBACK_PROMPT,
        )
        .await
    }

    async fn resolve(
        &self,
        what: &'static str,
        call: impl Future<Output = Result<String, ContentError>>,
        fallback: &str,
    ) -> String {
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ContentError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) if !text.trim().is_empty() => screen(text.trim()),
            Ok(_) => {
                tracing::warn!(what, "content provider returned blank text, using fallback");
                fallback.to_owned()
            }
            Err(error) => {
                tracing::warn!(what, %error, "content provider failed, using fallback");
                fallback.to_owned()
            }
        }
    }
}
