use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::agent::action::{Action, Directive};
use crate::agent::history::{ActionSummary, History};
use crate::executor::coordinate::ScreenScale;
use crate::executor::input::{InputBackend, MouseButton};
use crate::executor::shell::ShellRunner;
use crate::notify::Narrator;

/// Settle delay between moving the pointer and clicking, so hover
/// effects have taken hold.
const CLICK_SETTLE: Duration = Duration::from_millis(100);
/// Pause between typed text and a trailing Enter keystroke.
const TYPE_ENTER_DELAY: Duration = Duration::from_millis(300);
/// OS search affordance: open search, let it focus, type, let results
/// populate, confirm, then give the app time to launch.
const SEARCH_OPEN_DELAY: Duration = Duration::from_millis(500);
const SEARCH_RESULTS_DELAY: Duration = Duration::from_millis(500);
const APP_LAUNCH_DELAY: Duration = Duration::from_millis(1500);
/// Run-dialog affordance timings.
const RUN_DIALOG_OPEN_DELAY: Duration = Duration::from_millis(400);
const RUN_DIALOG_CONFIRM_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    /// A `stop` action was executed; the control loop must end the
    /// session without dispatching the rest of the sequence.
    Stop,
}

/// Validates and executes one parsed action against the capability
/// providers. Stateless: session pieces (scale, history) are passed in by
/// the loop.
pub struct Dispatcher {
    input: Arc<dyn InputBackend>,
    shell: Arc<dyn ShellRunner>,
    narrator: Arc<dyn Narrator>,
}

impl Dispatcher {
    pub fn new(
        input: Arc<dyn InputBackend>,
        shell: Arc<dyn ShellRunner>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            input,
            shell,
            narrator,
        }
    }

    pub async fn dispatch(
        &self,
        directive: &Directive,
        scale: &ScreenScale,
        history: &mut History,
    ) -> DispatchOutcome {
        if let Some(thought) = &directive.thought {
            tracing::info!(thought = %thought, "model rationale");
        }

        let action = &directive.action;
        tracing::info!(kind = action.kind(), detail = %action.describe(), "dispatching action");

        match action {
            Action::Click { x, y } => {
                if let (Some(x), Some(y)) = (x, y) {
                    let (dx, dy) = scale.to_device(*x, *y);
                    tracing::debug!(model_x = x, model_y = y, device_x = dx, device_y = dy, "click scaled");
                    self.input.move_to(dx, dy);
                    sleep(CLICK_SETTLE).await;
                }
                self.input.click(MouseButton::Left);
            }

            Action::Press { key } => {
                if key.trim().is_empty() {
                    tracing::warn!("press action with empty key, skipping");
                    return DispatchOutcome::Continue;
                }
                self.input.press_key(key);
            }

            Action::Type { text, enter } => {
                self.input.type_text(text);
                if *enter {
                    sleep(TYPE_ENTER_DELAY).await;
                    self.input.press_key("enter");
                }
            }

            Action::Speak { text } => {
                self.narrator.speak(text).await;
            }

            Action::LaunchApp { app } => {
                if app.trim().is_empty() {
                    tracing::warn!("launch_app with empty name, skipping");
                    return DispatchOutcome::Continue;
                }
                self.input.press_key("win");
                sleep(SEARCH_OPEN_DELAY).await;
                self.input.type_text(app);
                sleep(SEARCH_RESULTS_DELAY).await;
                self.input.press_key("enter");
                sleep(APP_LAUNCH_DELAY).await;
            }

            Action::RunCommand { command } => {
                if command.trim().is_empty() {
                    tracing::warn!("run_command with empty command, skipping");
                    return DispatchOutcome::Continue;
                }
                self.input.press_key("win+r");
                sleep(RUN_DIALOG_OPEN_DELAY).await;
                self.input.type_text(command);
                sleep(RUN_DIALOG_CONFIRM_DELAY).await;
                self.input.press_key("enter");
            }

            Action::System { command, cwd } => {
                let result = self.shell.run(command, cwd.as_deref()).await;
                match result.exit_code {
                    Some(0) => tracing::info!(output = %result.output, "shell command succeeded"),
                    code => tracing::warn!(
                        exit_code = ?code,
                        output = %result.output,
                        "shell command did not succeed"
                    ),
                }
            }

            Action::Stop { reason } => {
                tracing::info!(reason = reason.as_deref().unwrap_or("none"), "stop requested");
                history.push(ActionSummary::of(action));
                return DispatchOutcome::Stop;
            }

            Action::Wait => {
                tracing::info!("model chose to wait this cycle");
            }

            Action::Unknown => {
                tracing::warn!("unrecognized action kind, ignoring");
                return DispatchOutcome::Continue;
            }
        }

        history.push(ActionSummary::of(action));
        DispatchOutcome::Continue
    }
}
