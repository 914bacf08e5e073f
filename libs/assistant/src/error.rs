//! Error type for the chat assistant client

use thiserror::Error;

/// Errors raised while talking to the completion API
#[derive(Error, Debug)]
pub enum AssistantError {
    /// No API key was configured
    #[error("Assistant is not configured: OPENAI_API_KEY is not set")]
    NotConfigured,

    /// Transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The API answered with something we could not read
    #[error("Malformed completion response: {0}")]
    Parse(String),
}

/// Type alias for Result with AssistantError
pub type AssistantResult<T> = Result<T, AssistantError>;
