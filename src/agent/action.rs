use serde::{Deserialize, Serialize};

/// One directive parsed from the model's response: an action plus an
/// optional rationale. The rationale is logged, never executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    #[serde(default, alias = "reasoning", skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(flatten)]
    pub action: Action,
}

impl From<Action> for Directive {
    fn from(action: Action) -> Self {
        Self {
            thought: None,
            action,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Click at model-space coordinates, or at the current pointer
    /// position when no coordinates are given.
    Click {
        #[serde(default)]
        x: Option<i32>,
        #[serde(default)]
        y: Option<i32>,
    },
    /// Key or combo press ("space", "ctrl+c"). `press_key` is accepted
    /// as an alias for compatibility with the model's older output shape.
    #[serde(alias = "press_key")]
    Press { key: String },
    /// Type text; optionally follow with an Enter keystroke.
    Type {
        text: String,
        #[serde(default)]
        enter: bool,
    },
    /// Send free text to the narration side-channel.
    Speak { text: String },
    /// Launch an application through the OS search affordance.
    LaunchApp { app: String },
    /// Run a command through the OS run-dialog affordance.
    RunCommand { command: String },
    /// Execute a shell command; non-zero exit is logged, not fatal.
    System {
        command: String,
        #[serde(default)]
        cwd: Option<String>,
    },
    /// End the session.
    Stop {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Explicitly do nothing this cycle.
    Wait,
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Click { .. } => "click",
            Action::Press { .. } => "press",
            Action::Type { .. } => "type",
            Action::Speak { .. } => "speak",
            Action::LaunchApp { .. } => "launch_app",
            Action::RunCommand { .. } => "run_command",
            Action::System { .. } => "system",
            Action::Stop { .. } => "stop",
            Action::Wait => "wait",
            Action::Unknown => "unknown",
        }
    }

    /// Short description recorded into history and fed back to the model
    /// as context on later cycles.
    pub fn describe(&self) -> String {
        match self {
            Action::Click {
                x: Some(x),
                y: Some(y),
            } => format!("click at ({x}, {y})"),
            Action::Click { .. } => "click at current position".to_string(),
            Action::Press { key } => format!("press '{key}'"),
            Action::Type { text, enter } => {
                if *enter {
                    format!("type \"{text}\" then Enter")
                } else {
                    format!("type \"{text}\"")
                }
            }
            Action::Speak { text } => format!("speak \"{text}\""),
            Action::LaunchApp { app } => format!("launch app '{app}'"),
            Action::RunCommand { command } => format!("run command '{command}'"),
            Action::System { command, .. } => format!("shell: {command}"),
            Action::Stop { reason } => match reason {
                Some(r) => format!("stop ({r})"),
                None => "stop".to_string(),
            },
            Action::Wait => "wait".to_string(),
            Action::Unknown => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_click_with_coordinates() {
        let d: Directive = serde_json::from_str(r#"{"type":"click","x":100,"y":200}"#).unwrap();
        assert!(matches!(
            d.action,
            Action::Click {
                x: Some(100),
                y: Some(200)
            }
        ));
    }

    #[test]
    fn test_parse_click_without_coordinates() {
        let d: Directive = serde_json::from_str(r#"{"type":"click"}"#).unwrap();
        assert!(matches!(d.action, Action::Click { x: None, y: None }));
    }

    #[test]
    fn test_press_key_alias() {
        let d: Directive = serde_json::from_str(r#"{"type":"press_key","key":"enter"}"#).unwrap();
        assert!(matches!(d.action, Action::Press { ref key } if key == "enter"));

        let d: Directive = serde_json::from_str(r#"{"type":"press","key":"space"}"#).unwrap();
        assert!(matches!(d.action, Action::Press { ref key } if key == "space"));
    }

    #[test]
    fn test_parse_type_with_enter_flag() {
        let d: Directive =
            serde_json::from_str(r#"{"type":"type","text":"hello","enter":true}"#).unwrap();
        assert!(matches!(d.action, Action::Type { ref text, enter: true } if text == "hello"));
    }

    #[test]
    fn test_thought_is_captured_and_reasoning_aliased() {
        let d: Directive =
            serde_json::from_str(r#"{"type":"wait","thought":"nothing to do"}"#).unwrap();
        assert_eq!(d.thought.as_deref(), Some("nothing to do"));

        let d: Directive =
            serde_json::from_str(r#"{"type":"wait","reasoning":"screen loading"}"#).unwrap();
        assert_eq!(d.thought.as_deref(), Some("screen loading"));
    }

    #[test]
    fn test_unrecognized_kind_parses_as_unknown() {
        let d: Directive = serde_json::from_str(r#"{"type":"teleport","x":1}"#).unwrap();
        assert!(matches!(d.action, Action::Unknown));
    }

    #[test]
    fn test_stop_reason_optional() {
        let d: Directive = serde_json::from_str(r#"{"type":"stop"}"#).unwrap();
        assert!(matches!(d.action, Action::Stop { reason: None }));

        let d: Directive = serde_json::from_str(r#"{"type":"stop","reason":"done"}"#).unwrap();
        assert!(matches!(d.action, Action::Stop { reason: Some(ref r) } if r == "done"));
    }
}
