pub mod telegram;

use async_trait::async_trait;

pub use telegram::TelegramNarrator;

/// Side-channel for `speak` actions and operator-facing session
/// messages. Fire-and-forget: implementations log failures and never
/// raise them into the control loop.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn speak(&self, text: &str);

    /// Whether an external channel is actually wired up (the log
    /// fallback always is). Feeds the tool inventory.
    fn is_configured(&self) -> bool;
}

/// Default sink: narration goes to the log.
pub struct LogNarrator;

#[async_trait]
impl Narrator for LogNarrator {
    async fn speak(&self, text: &str) {
        tracing::info!(text = %text, "speak");
    }

    fn is_configured(&self) -> bool {
        true
    }
}
