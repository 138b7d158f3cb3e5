use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::time::sleep;

use crate::agent::history::History;
use crate::agent::pacing::Pacing;
use crate::config::{AppConfig, PacingConfig};
use crate::decision::client::DecisionClient;
use crate::decision::prompt::build_prompt;
use crate::decision::roster::ModelRoster;
use crate::decision::{request_plan, PlanOutcome};
use crate::errors::{is_rate_limit_text, AgentResult};
use crate::executor::coordinate::ScreenScale;
use crate::executor::dispatcher::{DispatchOutcome, Dispatcher};
use crate::executor::input::{InputBackend, MouseButton};
use crate::executor::shell::ShellRunner;
use crate::executor::windows::WindowLister;
use crate::notify::Narrator;
use crate::perception::dedup::{frames_are_similar, static_nap};
use crate::perception::screenshot::{CaptureOptions, FrameSource};

pub const DEFAULT_INSTRUCTION: &str = "Play the game on the screen. Focus on the objective.";

/// Cooperative cancellation: flipping the flag takes effect at the next
/// loop-top check; an in-flight action sequence runs to completion.
#[derive(Clone)]
pub struct StopHandle {
    active: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Live state for one run. Exactly one writer — the loop itself — so no
/// locking beyond the shared active flag.
struct Session {
    active: Arc<AtomicBool>,
    /// Guards against starting a new perception cycle while a previous
    /// action sequence is still being carried out.
    executing: bool,
    instruction: String,
    history: History,
    last_frame: Option<Vec<u8>>,
    static_streak: u32,
    /// Discovered once at start; read-only afterward.
    tools: BTreeMap<String, bool>,
    scale: ScreenScale,
    roster: ModelRoster,
    pacing: Pacing,
}

impl Session {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    Acted,
    NoDecision,
    /// Static screen: the decision step was skipped and the nap already
    /// slept, substituting for the loop-bottom delay.
    Skipped,
    Stopped,
}

enum FrameJudgement {
    Changed,
    Static { streak: u32 },
    /// Similar again, but the streak cap was reached: decide anyway so a
    /// misjudged screen cannot stall the loop forever.
    Forced,
}

/// The perception-decision-action loop: capture, deduplicate, pace,
/// decide, act, recover. Owns the session state; collaborators sit
/// behind trait seams.
pub struct Engine {
    session: Session,
    pacing_config: PacingConfig,
    frames: Arc<dyn FrameSource>,
    client: Arc<dyn DecisionClient>,
    windows: Arc<dyn WindowLister>,
    input: Arc<dyn InputBackend>,
    narrator: Arc<dyn Narrator>,
    dispatcher: Dispatcher,
    last_decision_at: Option<Instant>,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &AppConfig,
        frames: Arc<dyn FrameSource>,
        client: Arc<dyn DecisionClient>,
        windows: Arc<dyn WindowLister>,
        input: Arc<dyn InputBackend>,
        shell: Arc<dyn ShellRunner>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        let dispatcher = Dispatcher::new(input.clone(), shell, narrator.clone());
        Self {
            session: Session {
                active: Arc::new(AtomicBool::new(false)),
                executing: false,
                instruction: String::new(),
                history: History::with_session_log(),
                last_frame: None,
                static_streak: 0,
                tools: BTreeMap::new(),
                scale: ScreenScale::identity(),
                roster: ModelRoster::new(config.decision.fallback_models.clone()),
                pacing: Pacing::new(config.pacing.clone()),
            },
            pacing_config: config.pacing.clone(),
            frames,
            client,
            windows,
            input,
            narrator,
            dispatcher,
            last_decision_at: None,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            active: self.session.active.clone(),
        }
    }

    /// Starts the session and runs until stopped. No-op while already
    /// running. Performs one-time model discovery, tool discovery and
    /// screen-scale derivation before entering the cycle.
    pub async fn start(&mut self, instruction: &str) {
        if self.session.active.swap(true, Ordering::SeqCst) {
            tracing::info!("agent already running, start ignored");
            return;
        }
        self.session.instruction = instruction.to_string();
        tracing::info!(instruction = %instruction, "agent starting");

        tracing::info!("discovering available models");
        match self.client.list_models().await {
            Ok(names) if !names.is_empty() => {
                tracing::info!(models = %names.join(", "), "available models");
                self.session.roster.adopt_catalog(&names);
            }
            Ok(_) => tracing::warn!("model catalog empty, keeping fallback list"),
            Err(e) => tracing::warn!(error = %e, "model discovery failed, keeping fallback list"),
        }

        self.session.tools = self.discover_tools();
        tracing::info!(tools = ?self.session.tools, "tool inventory discovered");

        let device = match self.frames.device_resolution() {
            Ok((w, h)) => {
                self.session.scale = ScreenScale::from_device(w, h);
                tracing::info!(width = w, height = h, "device resolution");
                Some((w, h))
            }
            Err(e) => {
                tracing::warn!(error = %e, "device resolution unavailable, assuming 1:1 scale");
                None
            }
        };

        // Give the foreground app focus before the first perception pass.
        if let Some((w, h)) = device {
            self.input.move_to(w as i32 / 2, h as i32 / 2);
            sleep(std::time::Duration::from_millis(100)).await;
            self.input.click(MouseButton::Left);
        }

        self.run_loop().await;
    }

    pub fn stop(&self) {
        self.session.active.store(false, Ordering::SeqCst);
        tracing::info!("agent stopped");
    }

    fn discover_tools(&self) -> BTreeMap<String, bool> {
        let mut tools = BTreeMap::new();
        tools.insert("input".to_string(), self.input.is_ready());
        tools.insert("shell".to_string(), true);
        tools.insert("windows".to_string(), true);
        tools.insert("speak".to_string(), self.narrator.is_configured());
        tools
    }

    // ── Run cycle ─────────────────────────────────────────────────────────

    async fn run_loop(&mut self) {
        while self.session.is_active() {
            if self.session.executing {
                // Perception never overlaps action execution.
                sleep(self.session.pacing.exec_poll()).await;
                continue;
            }

            match self.run_cycle().await {
                Ok(CycleOutcome::Stopped) => break,
                Ok(CycleOutcome::Skipped) => {
                    self.session.pacing.reset_backoff();
                    continue;
                }
                Ok(_) => self.session.pacing.reset_backoff(),
                Err(e) => {
                    let message = e.to_string();
                    if is_rate_limit_text(&message) {
                        let backoff = self.session.pacing.backoff();
                        tracing::warn!(
                            error = %message,
                            backoff_ms = backoff.as_millis() as u64,
                            "rate limit hit, backing off"
                        );
                        sleep(backoff).await;
                        self.session.pacing.grow_backoff();
                        self.session.pacing.penalize_to_max();
                    } else {
                        tracing::warn!(error = %message, "loop error");
                        self.session.pacing.reset_backoff();
                    }
                }
            }

            if !self.session.is_active() {
                break;
            }

            sleep(self.session.pacing.cycle_delay()).await;
            if !self.session.executing {
                self.session.pacing.decay();
            }
        }
        tracing::info!("agent loop ended");
    }

    async fn run_cycle(&mut self) -> AgentResult<CycleOutcome> {
        let frame = self.frames.capture(CaptureOptions::analysis()).await?;

        match self.judge_frame(&frame.png) {
            FrameJudgement::Static { streak } => {
                let nap = static_nap(&self.pacing_config, streak);
                tracing::debug!(
                    streak,
                    nap_ms = nap.as_millis() as u64,
                    "screen unchanged, skipping decision"
                );
                sleep(nap).await;
                return Ok(CycleOutcome::Skipped);
            }
            FrameJudgement::Forced => {
                tracing::debug!("static streak cap reached, forcing a decision cycle");
            }
            FrameJudgement::Changed => {}
        }

        self.enforce_decision_spacing().await;

        let window_titles: Vec<String> =
            self.windows.list().into_iter().map(|w| w.title).collect();
        let prompt_text = build_prompt(
            &self.session.instruction,
            &self.session.tools,
            &window_titles,
            &self.session.history,
        );

        self.last_decision_at = Some(Instant::now());
        let outcome = request_plan(
            self.client.as_ref(),
            &mut self.session.roster,
            &prompt_text,
            &frame.png,
        )
        .await;

        match outcome {
            PlanOutcome::Plan(plan) => {
                tracing::info!(actions = plan.len(), "plan received");
                self.session.executing = true;
                for directive in &plan {
                    let dispatched = self
                        .dispatcher
                        .dispatch(directive, &self.session.scale, &mut self.session.history)
                        .await;
                    if dispatched == DispatchOutcome::Stop {
                        self.session.executing = false;
                        self.narrator.speak("Session finished").await;
                        self.stop();
                        return Ok(CycleOutcome::Stopped);
                    }
                }
                self.session.executing = false;
                self.session.pacing.reward();
                Ok(CycleOutcome::Acted)
            }
            PlanOutcome::RateLimited => {
                self.session.pacing.penalize_to_max();
                Ok(CycleOutcome::NoDecision)
            }
            PlanOutcome::NoDecision => {
                self.session.pacing.penalize();
                Ok(CycleOutcome::NoDecision)
            }
            PlanOutcome::Exhausted => {
                let message = "All model candidates failed. Check API key and region.";
                tracing::error!("{message}");
                self.narrator.speak(message).await;
                self.stop();
                Ok(CycleOutcome::Stopped)
            }
        }
    }

    /// Compares the new frame against the previous one and updates the
    /// streak. A changed (or forced) frame becomes the new baseline.
    fn judge_frame(&mut self, png: &[u8]) -> FrameJudgement {
        let similar = match &self.session.last_frame {
            Some(last) => frames_are_similar(
                last,
                png,
                self.pacing_config.similarity_threshold_pct,
            ),
            None => false,
        };

        if similar && self.session.static_streak < self.pacing_config.static_streak_cap {
            self.session.static_streak += 1;
            return FrameJudgement::Static {
                streak: self.session.static_streak,
            };
        }

        let forced = similar;
        self.session.static_streak = 0;
        self.session.last_frame = Some(png.to_vec());
        if forced {
            FrameJudgement::Forced
        } else {
            FrameJudgement::Changed
        }
    }

    /// Pacing floor between decision-client calls, independent of the
    /// inter-cycle sleep.
    async fn enforce_decision_spacing(&self) {
        if let Some(last) = self.last_decision_at {
            let min = self.session.pacing.min_decision_interval();
            let elapsed = last.elapsed();
            if elapsed < min {
                sleep(min - elapsed).await;
            }
        }
    }
}
