//! Error types for content providers.
//!
//! None of these reach clients: the [`Storyteller`](crate::Storyteller)
//! logs them and substitutes fallback text.

use std::time::Duration;

/// Errors a [`ContentProvider`](crate::ContentProvider) call can produce.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// No API key (or other credentials) were configured.
    #[error("content provider is not configured")]
    NotConfigured,

    /// The request failed: connection, TLS, non-2xx status, or body read.
    #[error("content provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered, but without any usable text.
    #[error("invalid response from content provider: {0}")]
    InvalidResponse(String),

    /// The provider didn't answer in time.
    #[error("content provider timed out after {0:?}")]
    Timeout(Duration),
}
