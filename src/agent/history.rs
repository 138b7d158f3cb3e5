use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::action::Action;

/// Most recent executed actions kept as decision context. Older entries
/// are evicted first; nothing here is ever replayed.
pub const HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSummary {
    pub ts: i64,
    pub kind: String,
    pub detail: String,
}

impl ActionSummary {
    pub fn of(action: &Action) -> Self {
        Self {
            ts: chrono::Utc::now().timestamp_millis(),
            kind: action.kind().to_string(),
            detail: action.describe(),
        }
    }
}

pub struct History {
    entries: VecDeque<ActionSummary>,
    log: Option<SessionLog>,
}

impl History {
    /// In-memory only; used by tests and as a fallback when the session
    /// log directory cannot be created.
    pub fn in_memory() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_LIMIT),
            log: None,
        }
    }

    /// History backed by a per-session JSONL file under the platform data
    /// directory. Log failures are not fatal to the loop.
    pub fn with_session_log() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_LIMIT),
            log: SessionLog::create(),
        }
    }

    pub fn push(&mut self, summary: ActionSummary) {
        if self.entries.len() == HISTORY_LIMIT {
            self.entries.pop_front();
        }
        if let Some(log) = &self.log {
            if let Err(e) = log.append(&summary) {
                tracing::debug!(error = %e, "session log append failed");
            }
        }
        self.entries.push_back(summary);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest-first iteration over the retained entries.
    pub fn iter(&self) -> impl Iterator<Item = &ActionSummary> {
        self.entries.iter()
    }
}

struct SessionLog {
    session_id: String,
    path: PathBuf,
}

impl SessionLog {
    fn create() -> Option<Self> {
        let base = dirs::data_local_dir()?;
        let dir = base.join("deskpilot").join("sessions");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::debug!(error = %e, "could not create session log dir");
            return None;
        }
        let session_id = uuid::Uuid::new_v4().to_string();
        let path = dir.join(format!("session_{session_id}.jsonl"));
        tracing::info!(path = %path.display(), "session log created");
        Some(Self { session_id, path })
    }

    fn append(&self, summary: &ActionSummary) -> std::io::Result<()> {
        let line = serde_json::to_string(summary)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        tracing::trace!(session = %self.session_id, "history entry flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(n: usize) -> ActionSummary {
        ActionSummary {
            ts: n as i64,
            kind: "press".to_string(),
            detail: format!("press '{n}'"),
        }
    }

    #[test]
    fn test_history_never_exceeds_limit() {
        let mut history = History::in_memory();
        for n in 0..6 {
            history.push(summary(n));
        }
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_oldest_entry_is_evicted_first() {
        let mut history = History::in_memory();
        for n in 0..6 {
            history.push(summary(n));
        }
        let details: Vec<_> = history.iter().map(|s| s.detail.clone()).collect();
        assert_eq!(
            details,
            vec![
                "press '1'",
                "press '2'",
                "press '3'",
                "press '4'",
                "press '5'"
            ]
        );
    }
}
