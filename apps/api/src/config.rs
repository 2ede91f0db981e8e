use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Loaded once at startup; the AI credential is additionally validated at
/// LLM client construction so no call can run without one.
#[derive(Debug, Clone)]
pub struct Config {
    pub ai_base_url: String,
    pub ai_api_key: String,
    pub ai_model: String,
    pub storage_base_url: String,
    pub storage_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            ai_base_url: std::env::var("REFINECV_AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            ai_api_key: require_env("REFINECV_AI_API_KEY")?,
            ai_model: std::env::var("REFINECV_AI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            storage_base_url: require_env("REFINECV_STORAGE_URL")?,
            storage_api_key: require_env("REFINECV_STORAGE_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
