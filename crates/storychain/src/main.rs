//! Storychain server binary.

use storychain::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), StorychainError> {
    // A missing .env file is fine; real environment variables still apply.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let mut provider = GeminiProvider::new(config.gemini_api_key.clone());
    if let Some(url) = &config.gemini_url {
        provider = provider.with_url(url);
    }
    if !provider.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set, generated text will use fallbacks");
    }

    let server = StorychainServerBuilder::new()
        .config(config)
        .build(provider)
        .await?;
    server.run().await
}
