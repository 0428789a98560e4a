//! [`ContentProvider`] backed by Google's Gemini `generateContent` API.

use serde::{Deserialize, Serialize};

use crate::{ContentError, ContentProvider, prompts};

/// The public `gemini-pro` endpoint. The API key is appended as `?key=`.
pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str, max_output_tokens: u32) -> Self {
        Self {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens,
                temperature: 0.8,
                top_p: 0.9,
                top_k: 40,
            },
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// The first candidate's first text part.
    fn into_text(self) -> Result<String, ContentError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ContentError::InvalidResponse("no candidate text".into()))
    }
}

// ---------------------------------------------------------------------------
// GeminiProvider
// ---------------------------------------------------------------------------

/// Calls Gemini over HTTPS.
///
/// Without an API key every call fails fast with
/// [`ContentError::NotConfigured`], which the storyteller turns into
/// fallback text. That keeps a keyless development server fully playable.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    url: String,
}

impl GeminiProvider {
    /// Creates a provider for the default endpoint. Blank keys count as
    /// missing.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            url: DEFAULT_GEMINI_URL.to_owned(),
        }
    }

    /// Points the provider at a different endpoint (a proxy, another model).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String, ContentError> {
        let api_key = self.api_key.as_deref().ok_or(ContentError::NotConfigured)?;

        let response: GenerateResponse = self
            .client
            .post(&self.url)
            .query(&[("key", api_key)])
            .json(&GenerateRequest::new(prompt, max_output_tokens))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_text()
    }
}

impl ContentProvider for GeminiProvider {
    async fn generate_twist(&self, story_text: &str) -> Result<String, ContentError> {
        self.generate(&prompts::twist(story_text), prompts::TWIST_MAX_TOKENS)
            .await
    }

    async fn suggest_next_player(&self, player_names: &[String]) -> Result<String, ContentError> {
        self.generate(&prompts::suggestion(player_names), prompts::SUGGESTION_MAX_TOKENS)
            .await
    }

    async fn generate_prompt(
        &self,
        story_text: &str,
        player_names: &[String],
    ) -> Result<String, ContentError> {
        self.generate(
            &prompts::story_prompt(story_text, player_names),
            prompts::PROMPT_MAX_TOKENS,
        )
        .await
    }
}
