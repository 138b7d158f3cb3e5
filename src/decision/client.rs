use async_trait::async_trait;
use thiserror::Error;

/// Failure classes for a decision call. Each class has distinct handling
/// in the loop: rate limits cool the pacing down, not-found walks the
/// fallback chain, anything else yields no decision for the cycle.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Remote vision-capable model behind a narrow seam: given a prompt and a
/// PNG frame, return raw text. Selection and fallback over models live in
/// the engine, not here.
#[async_trait]
pub trait DecisionClient: Send + Sync {
    /// Provider model catalog, used once at startup for discovery.
    async fn list_models(&self) -> Result<Vec<String>, DecisionError>;

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image_png: &[u8],
    ) -> Result<String, DecisionError>;
}
