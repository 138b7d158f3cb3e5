pub mod client;
pub mod gemini;
pub mod prompt;
pub mod roster;

use crate::agent::action::Directive;
use client::{DecisionClient, DecisionError};
use roster::ModelRoster;

/// What one decision attempt produced, after the per-call failure policy
/// has been applied.
#[derive(Debug)]
pub enum PlanOutcome {
    Plan(Vec<Directive>),
    /// Provider throttled us; keep the current model, let the loop cool
    /// down.
    RateLimited,
    /// Transient failure or unusable response; try again next cycle.
    NoDecision,
    /// Every candidate model failed with not-found. Fatal: the session
    /// must stop and tell the operator to check credentials/region.
    Exhausted,
}

/// One decision request with the fallback policy folded in: a not-found
/// error advances the roster and retries the same request immediately,
/// bounded by the candidate list (the source's unbounded recursion,
/// reframed as iteration).
pub async fn request_plan(
    client: &dyn DecisionClient,
    roster: &mut ModelRoster,
    prompt_text: &str,
    frame_png: &[u8],
) -> PlanOutcome {
    loop {
        let Some(model) = roster.active_model().map(String::from) else {
            return PlanOutcome::Exhausted;
        };

        match client.generate(&model, prompt_text, frame_png).await {
            Ok(raw) => match prompt::parse_plan(&raw) {
                Ok(plan) => return PlanOutcome::Plan(plan),
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "model response unusable");
                    return PlanOutcome::NoDecision;
                }
            },
            Err(DecisionError::RateLimited(message)) => {
                tracing::warn!(model = %model, message = %message, "rate limit hit, cooling down");
                return PlanOutcome::RateLimited;
            }
            Err(DecisionError::ModelNotFound(message)) => {
                tracing::warn!(model = %model, message = %message, "model unavailable, switching");
                match roster.advance() {
                    Some(next) => {
                        tracing::info!(model = %next, "retrying with next candidate");
                    }
                    None => return PlanOutcome::Exhausted,
                }
            }
            Err(DecisionError::Other(message)) => {
                tracing::warn!(model = %model, message = %message, "decision call failed");
                return PlanOutcome::NoDecision;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::action::Action;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, DecisionError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, DecisionError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DecisionClient for ScriptedClient {
        async fn list_models(&self) -> Result<Vec<String>, DecisionError> {
            Ok(Vec::new())
        }

        async fn generate(
            &self,
            model: &str,
            _prompt: &str,
            _image_png: &[u8],
        ) -> Result<String, DecisionError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DecisionError::Other("script exhausted".into())))
        }
    }

    fn roster(models: &[&str]) -> ModelRoster {
        ModelRoster::new(models.iter().map(|m| m.to_string()).collect())
    }

    #[tokio::test]
    async fn test_not_found_retries_next_candidate_within_one_call() {
        let client = ScriptedClient::new(vec![
            Err(DecisionError::ModelNotFound("404".into())),
            Ok(r#"[{"type":"wait"}]"#.to_string()),
        ]);
        let mut roster = roster(&["model-a", "model-b", "model-c"]);

        let outcome = request_plan(&client, &mut roster, "prompt", &[1, 2, 3]).await;

        assert!(matches!(outcome, PlanOutcome::Plan(ref p) if matches!(p[0].action, Action::Wait)));
        assert_eq!(client.calls(), vec!["model-a", "model-b"]);
        assert_eq!(roster.active_model(), Some("model-b"));
    }

    #[tokio::test]
    async fn test_exhausting_candidates_reports_fatal() {
        let client = ScriptedClient::new(vec![
            Err(DecisionError::ModelNotFound("404".into())),
            Err(DecisionError::ModelNotFound("404".into())),
        ]);
        let mut roster = roster(&["model-a", "model-b"]);

        let outcome = request_plan(&client, &mut roster, "prompt", &[]).await;

        assert!(matches!(outcome, PlanOutcome::Exhausted));
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_does_not_advance_roster() {
        let client = ScriptedClient::new(vec![Err(DecisionError::RateLimited("429".into()))]);
        let mut roster = roster(&["model-a", "model-b"]);

        let outcome = request_plan(&client, &mut roster, "prompt", &[]).await;

        assert!(matches!(outcome, PlanOutcome::RateLimited));
        assert_eq!(roster.active_model(), Some("model-a"));
    }

    #[tokio::test]
    async fn test_malformed_response_yields_no_decision() {
        let client = ScriptedClient::new(vec![Ok("sorry, I can't".to_string())]);
        let mut roster = roster(&["model-a"]);

        let outcome = request_plan(&client, &mut roster, "prompt", &[]).await;

        assert!(matches!(outcome, PlanOutcome::NoDecision));
        assert_eq!(roster.active_model(), Some("model-a"));
    }
}
