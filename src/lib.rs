pub mod agent;
pub mod config;
pub mod decision;
pub mod errors;
pub mod executor;
pub mod notify;
pub mod perception;

use std::sync::Arc;

use crate::agent::engine::{Engine, DEFAULT_INSTRUCTION};
use crate::decision::gemini::GeminiClient;
use crate::errors::AgentResult;
use crate::executor::input::InputHandle;
use crate::executor::shell::SystemShell;
use crate::executor::windows::XcapWindowLister;
use crate::notify::{LogNarrator, Narrator, TelegramNarrator};
use crate::perception::screenshot::XcapFrameSource;

/// Wires the real collaborators together and runs one agent session to
/// completion. The session ends through a `stop` action, fallback
/// exhaustion, or Ctrl-C; the process itself never exits from inside the
/// loop.
pub async fn run(instruction: Option<String>) -> AgentResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let config = config::load_or_default()?;

    let client = Arc::new(GeminiClient::from_config(&config.decision)?);
    let frames = Arc::new(XcapFrameSource::new());
    let windows = Arc::new(XcapWindowLister::new());
    let input = Arc::new(InputHandle::spawn());
    let shell = Arc::new(SystemShell::new());

    let narrator: Arc<dyn Narrator> = match (
        config.notify.resolve_telegram_token(),
        config.notify.telegram_chat_id.clone(),
    ) {
        (Some(token), Some(chat_id)) => {
            tracing::info!(chat_id = %chat_id, "telegram narrator configured");
            Arc::new(TelegramNarrator::new(token, chat_id))
        }
        _ => Arc::new(LogNarrator),
    };

    let mut engine = Engine::new(&config, frames, client, windows, input, shell, narrator);

    let stop = engine.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current cycle");
            stop.stop();
        }
    });

    let instruction = instruction.unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string());
    engine.start(&instruction).await;

    Ok(())
}
