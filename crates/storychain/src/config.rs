//! Server configuration: defaults, and overrides from the environment.

use std::time::Duration;

use storychain_ai::DEFAULT_TIMEOUT;
use storychain_room::RoomSettings;

use crate::StorychainError;

/// Everything the server needs to know before it binds.
///
/// `Default` gives a local development setup: WebSocket on `127.0.0.1:3001`,
/// HTTP on `127.0.0.1:3000`, 5-round manual-only rooms, automatic twists on
/// and no content provider key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub ws_addr: String,
    /// Address the HTTP API binds to.
    pub http_addr: String,
    /// Settings used when a create request leaves them out.
    pub room_defaults: RoomSettings,
    /// Upper bound on each content provider call.
    pub content_timeout: Duration,
    /// Inject a twist automatically after an eligible round.
    pub auto_twists: bool,
    pub gemini_api_key: Option<String>,
    /// Overrides the Gemini endpoint.
    pub gemini_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: "127.0.0.1:3001".to_owned(),
            http_addr: "127.0.0.1:3000".to_owned(),
            room_defaults: RoomSettings::default(),
            content_timeout: DEFAULT_TIMEOUT,
            auto_twists: true,
            gemini_api_key: None,
            gemini_url: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `HOST` | `127.0.0.1` |
    /// | `PORT` (HTTP) | `3000` |
    /// | `WS_PORT` | `3001` |
    /// | `DEFAULT_MAX_ROUNDS` | `5` |
    /// | `DEFAULT_AI_MODE` | `manual_only` |
    /// | `AI_TIMEOUT_SECS` | `10` |
    /// | `AUTO_TWISTS` | `true` |
    /// | `GEMINI_API_KEY` | unset |
    /// | `GEMINI_API_URL` | the public endpoint |
    ///
    /// # Errors
    /// [`StorychainError::Config`] when a variable is set but can't be
    /// parsed.
    pub fn from_env() -> Result<Self, StorychainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`. Blank values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StorychainError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let http_port: u16 = parse_var("PORT", var("PORT"))?.unwrap_or(3000);
        let ws_port: u16 = parse_var("WS_PORT", var("WS_PORT"))?.unwrap_or(3001);

        let max_rounds: Option<i64> = parse_var("DEFAULT_MAX_ROUNDS", var("DEFAULT_MAX_ROUNDS"))?;
        let ai_mode = var("DEFAULT_AI_MODE");
        let room_defaults =
            RoomSettings::resolve(max_rounds, ai_mode.as_deref(), defaults.room_defaults)
                .map_err(|e| StorychainError::Config(e.to_string()))?;

        let content_timeout = parse_var::<u64>("AI_TIMEOUT_SECS", var("AI_TIMEOUT_SECS"))?
            .map_or(defaults.content_timeout, Duration::from_secs);

        let auto_twists = match var("AUTO_TWISTS") {
            None => defaults.auto_twists,
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                StorychainError::Config(format!("AUTO_TWISTS must be true or false, got `{raw}`"))
            })?,
        };

        Ok(Self {
            ws_addr: format!("{host}:{ws_port}"),
            http_addr: format!("{host}:{http_port}"),
            room_defaults,
            content_timeout,
            auto_twists,
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_url: var("GEMINI_API_URL"),
        })
    }
}

fn parse_var<T>(key: &str, raw: Option<String>) -> Result<Option<T>, StorychainError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|raw| {
        raw.trim()
            .parse()
            .map_err(|e| StorychainError::Config(format!("{key}: `{raw}` is invalid: {e}")))
    })
    .transpose()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
