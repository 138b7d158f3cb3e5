use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Perception error: {0}")]
    Perception(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Decision error: {0}")]
    Decision(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Whether an error's text indicates a provider rate-limit or quota
/// condition. The loop uses this to pick the backoff path for errors that
/// escape the decision client's own classification (transport failures,
/// discovery calls).
pub fn is_rate_limit_text(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429")
        || lower.contains("quota")
        || lower.contains("rate limit")
        || lower.contains("resource_exhausted")
        || lower.contains("resource exhausted")
}
