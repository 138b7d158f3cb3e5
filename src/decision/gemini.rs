use async_trait::async_trait;
use base64::Engine as _;

use crate::config::DecisionConfig;
use crate::decision::client::{DecisionClient, DecisionError};
use crate::errors::AgentResult;

/// Google Generative Language API client (`models` catalog +
/// `generateContent` with an inline PNG part).
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }

    pub fn from_config(config: &DecisionConfig) -> AgentResult<Self> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(config.api_base.clone(), api_key))
    }

    /// Maps an HTTP failure onto the decision error taxonomy. The
    /// provider signals quota exhaustion with 429/RESOURCE_EXHAUSTED and
    /// unknown or region-locked models with 404/NOT_FOUND.
    fn classify(status: reqwest::StatusCode, body: &str) -> DecisionError {
        let message = format!("{status}: {body}");
        if status.as_u16() == 429
            || body.contains("RESOURCE_EXHAUSTED")
            || body.to_lowercase().contains("quota")
        {
            DecisionError::RateLimited(message)
        } else if status.as_u16() == 404 || body.to_lowercase().contains("not found") {
            DecisionError::ModelNotFound(message)
        } else {
            DecisionError::Other(message)
        }
    }
}

#[async_trait]
impl DecisionClient for GeminiClient {
    async fn list_models(&self) -> Result<Vec<String>, DecisionError> {
        let url = format!("{}/models?key={}", self.api_base, self.api_key);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DecisionError::Other(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status, &body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DecisionError::Other(e.to_string()))?;

        let names = json["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str())
                    .map(|n| n.trim_start_matches("models/").to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        tracing::info!(count = names.len(), "model catalog fetched");
        Ok(names)
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image_png: &[u8],
    ) -> Result<String, DecisionError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, model, self.api_key
        );
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_png);
        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": { "mime_type": "image/png", "data": image_b64 } },
                ],
            }],
        });

        tracing::debug!(
            model = model,
            prompt_len = prompt.len(),
            image_bytes = image_png.len(),
            "sending decision request"
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DecisionError::Other(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status, &err_body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DecisionError::Other(e.to_string()))?;

        let text = json["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DecisionError::Other(format!(
                "empty response from {model}"
            )));
        }

        tracing::debug!(model = model, response_len = text.len(), "decision received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limit() {
        let err = GeminiClient::classify(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert!(matches!(err, DecisionError::RateLimited(_)));
    }

    #[test]
    fn test_classify_quota_text_on_other_status() {
        let err = GeminiClient::classify(
            reqwest::StatusCode::FORBIDDEN,
            "Quota exceeded for quota metric",
        );
        assert!(matches!(err, DecisionError::RateLimited(_)));
    }

    #[test]
    fn test_classify_model_not_found() {
        let err = GeminiClient::classify(
            reqwest::StatusCode::NOT_FOUND,
            "models/gemini-x is not found for API version v1beta",
        );
        assert!(matches!(err, DecisionError::ModelNotFound(_)));
    }

    #[test]
    fn test_classify_other() {
        let err = GeminiClient::classify(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "internal error",
        );
        assert!(matches!(err, DecisionError::Other(_)));
    }
}
