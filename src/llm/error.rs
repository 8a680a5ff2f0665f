use thiserror::Error;

/// Failures of a chat request. `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("API key is not configured. Please set OPENROUTER_API_KEY in your environment.")]
    NotConfigured,

    #[error("API key is invalid or expired. Please check your configuration.")]
    InvalidCredential,

    #[error("Network error. Please check your internet connection and try again.")]
    Network,

    #[error(
        "The free model is temporarily rate-limited. Please try again in a few minutes, or consider upgrading to a paid plan for better availability."
    )]
    ModelRateLimited,

    #[error("Rate limit exceeded. Please try again in a few minutes.")]
    RateLimited,

    #[error("The AI service is temporarily unavailable. Please try again in a moment.")]
    ServiceUnavailable { status: u16 },

    #[error("Server error. Please try again later.")]
    Server { status: u16 },

    #[error("Received an invalid response from the AI service. Please try again.")]
    MalformedResponse,

    #[error("Something went wrong. Please try again.")]
    Unexpected,
}

const MODEL_RATE_LIMIT_MARKER: &str = "rate-limited";

impl ChatError {
    /// Maps a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ChatError::InvalidCredential,
            429 => {
                if is_model_rate_limited(body) {
                    ChatError::ModelRateLimited
                } else {
                    ChatError::RateLimited
                }
            }
            400..=499 => ChatError::ServiceUnavailable { status },
            500..=599 => ChatError::Server { status },
            _ => ChatError::Unexpected,
        }
    }

    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::MalformedResponse
        } else if err.is_builder() {
            ChatError::Unexpected
        } else {
            ChatError::Network
        }
    }
}

/// OpenRouter reports per-model throttling in `error.metadata.raw`; plain bodies are searched too.
fn is_model_rate_limited(body: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .pointer("/error/metadata/raw")
            .and_then(|raw| raw.as_str())
            .map(|raw| raw.contains(MODEL_RATE_LIMIT_MARKER))
            .unwrap_or(false),
        Err(_) => body.contains(MODEL_RATE_LIMIT_MARKER),
    }
}
