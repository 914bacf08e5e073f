//! Chat assistant configuration

use std::env;

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for the completion API
#[derive(Clone)]
pub struct AssistantConfig {
    /// API key sent as a Bearer token
    pub api_key: String,
    /// Base URL, without the trailing `/chat/completions`
    pub base_url: String,
    /// Model name
    pub model: String,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl AssistantConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create an AssistantConfig from environment variables
    ///
    /// Returns `None` when no API key is available, which disables the
    /// assistants without failing start-up.
    ///
    /// # Environment Variables
    /// - `OPENAI_API_KEY`: API key (required to enable the assistants)
    /// - `OPENAI_BASE_URL`: API base URL (default: `https://api.openai.com/v1`)
    /// - `ASSISTANT_MODEL`: Model name (default: `gpt-4o-mini`)
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;

        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("ASSISTANT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Some(Self {
            api_key,
            base_url,
            model,
        })
    }

    /// Full URL of the chat completion endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
