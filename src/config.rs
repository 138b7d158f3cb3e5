use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Static fallback chain, tried in order when the active model fails
    /// with a not-found error. Catalog discovery prepends its preferred
    /// candidate at startup.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    /// Optional API key stored in config.toml (falls back to the
    /// GEMINI_API_KEY environment variable).
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            fallback_models: default_fallback_models(),
            api_key: None,
        }
    }
}

impl DecisionConfig {
    /// Environment variable wins over the config file.
    pub fn resolve_api_key(&self) -> AgentResult<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                AgentError::Config(
                    "no API key: set GEMINI_API_KEY or [decision].api_key in config.toml".into(),
                )
            })
    }
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_fallback_models() -> Vec<String> {
    vec![
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-flash-latest".to_string(),
        "gemini-1.5-pro".to_string(),
        "gemini-pro-vision".to_string(),
    ]
}

/// Pacing knobs for the control loop. Defaults are tuned for the
/// provider's free tier (~15 requests/minute, so a 4 s base interval).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Hard floor on the inter-cycle sleep.
    #[serde(default = "default_floor_ms")]
    pub floor_ms: u64,
    /// Cap on the adaptive idle penalty; also the rate-limit cooldown.
    #[serde(default = "default_max_adaptive_ms")]
    pub max_adaptive_ms: u64,
    #[serde(default = "default_idle_penalty_ms")]
    pub idle_penalty_ms: u64,
    #[serde(default = "default_recovery_ms")]
    pub recovery_ms: u64,
    #[serde(default = "default_decay_ms")]
    pub decay_ms: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Minimum spacing between two decision-client calls.
    #[serde(default = "default_min_decision_interval_ms")]
    pub min_decision_interval_ms: u64,
    /// Nap length grows by this step per consecutive static frame.
    #[serde(default = "default_static_nap_step_ms")]
    pub static_nap_step_ms: u64,
    #[serde(default = "default_static_nap_cap_ms")]
    pub static_nap_cap_ms: u64,
    /// After this many consecutive static frames a decision cycle is
    /// forced even if the frame still looks unchanged.
    #[serde(default = "default_static_streak_cap")]
    pub static_streak_cap: u32,
    /// Poll interval while a previous action sequence is still running.
    #[serde(default = "default_exec_poll_ms")]
    pub exec_poll_ms: u64,
    /// Payload length delta (percent of average length) below which two
    /// frames are judged visually similar.
    #[serde(default = "default_similarity_threshold_pct")]
    pub similarity_threshold_pct: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            floor_ms: default_floor_ms(),
            max_adaptive_ms: default_max_adaptive_ms(),
            idle_penalty_ms: default_idle_penalty_ms(),
            recovery_ms: default_recovery_ms(),
            decay_ms: default_decay_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            backoff_factor: default_backoff_factor(),
            min_decision_interval_ms: default_min_decision_interval_ms(),
            static_nap_step_ms: default_static_nap_step_ms(),
            static_nap_cap_ms: default_static_nap_cap_ms(),
            static_streak_cap: default_static_streak_cap(),
            exec_poll_ms: default_exec_poll_ms(),
            similarity_threshold_pct: default_similarity_threshold_pct(),
        }
    }
}

fn default_base_delay_ms() -> u64 {
    4000
}

fn default_floor_ms() -> u64 {
    1000
}

fn default_max_adaptive_ms() -> u64 {
    10_000
}

fn default_idle_penalty_ms() -> u64 {
    2000
}

fn default_recovery_ms() -> u64 {
    1000
}

fn default_decay_ms() -> u64 {
    500
}

fn default_backoff_base_ms() -> u64 {
    5000
}

fn default_backoff_cap_ms() -> u64 {
    60_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_min_decision_interval_ms() -> u64 {
    4000
}

fn default_static_nap_step_ms() -> u64 {
    2000
}

fn default_static_nap_cap_ms() -> u64 {
    10_000
}

fn default_static_streak_cap() -> u32 {
    5
}

fn default_exec_poll_ms() -> u64 {
    250
}

fn default_similarity_threshold_pct() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Telegram chat id for spoken updates. When unset, narration goes to
    /// the log only. The bot token comes from TELEGRAM_BOT_TOKEN.
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
}

impl NotifyConfig {
    pub fn resolve_telegram_token(&self) -> Option<String> {
        std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    let cwd = std::env::current_dir().ok()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Some(candidate);
    }

    None
}

/// Loads config.toml from next to the executable or the working
/// directory; a missing file yields the built-in defaults so the agent
/// can run from just the environment.
pub fn load_or_default() -> AgentResult<AppConfig> {
    match resolve_config_path() {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let config: AppConfig = toml::from_str(&content)?;
            tracing::info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => {
            tracing::info!("no config.toml found, using defaults");
            Ok(AppConfig::default())
        }
    }
}
