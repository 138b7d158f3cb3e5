use async_trait::async_trait;

use crate::notify::Narrator;

/// Sends narration to a Telegram chat via the Bot API. Only the send
/// path: the chat id is configured up front, not resolved from updates.
pub struct TelegramNarrator {
    http: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNarrator {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            chat_id,
        }
    }
}

#[async_trait]
impl Narrator for TelegramNarrator {
    async fn speak(&self, text: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(chat_id = %self.chat_id, "telegram message sent");
            }
            Ok(response) => {
                let status = response.status();
                let err_body = response.text().await.unwrap_or_default();
                tracing::warn!(status = %status, body = %err_body, "telegram send rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "telegram send failed");
            }
        }
    }

    fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }
}
