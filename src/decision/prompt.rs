use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::agent::action::Directive;
use crate::agent::history::History;
use crate::decision::client::DecisionError;
use crate::perception::screenshot::{ANALYSIS_HEIGHT, ANALYSIS_WIDTH};

/// Builds the text block sent alongside each frame. Its layout is the de
/// facto wire contract with the model: standing instruction, discovered
/// tools, open window titles, the last five action summaries, the fixed
/// action catalog with example shapes, and the JSON-only constraint.
pub fn build_prompt(
    instruction: &str,
    tools: &BTreeMap<String, bool>,
    window_titles: &[String],
    history: &History,
) -> String {
    let mut p = String::new();

    let _ = writeln!(
        p,
        "You are an autonomous agent controlling this computer through the screen."
    );
    let _ = writeln!(p, "Instruction: {instruction}");
    p.push('\n');

    let available: Vec<&str> = tools
        .iter()
        .filter(|(_, enabled)| **enabled)
        .map(|(name, _)| name.as_str())
        .collect();
    if !available.is_empty() {
        let _ = writeln!(p, "Available tools: {}", available.join(", "));
    }

    if !window_titles.is_empty() {
        let _ = writeln!(p, "Open windows: {}", window_titles.join(" | "));
    }

    if !history.is_empty() {
        let _ = writeln!(p, "Recent actions:");
        for entry in history.iter() {
            let _ = writeln!(p, "- {}", entry.detail);
        }
    }

    p.push('\n');
    let _ = writeln!(
        p,
        "Analyze the screenshot ({ANALYSIS_WIDTH}x{ANALYSIS_HEIGHT}) and decide the next \
         action(s) toward the instruction."
    );
    let _ = writeln!(p, "Available actions:");
    let _ = writeln!(p, r#"- {{ "type": "click", "x": 100, "y": 200 }}"#);
    let _ = writeln!(p, r#"- {{ "type": "press", "key": "ctrl+c" }}"#);
    let _ = writeln!(
        p,
        r#"- {{ "type": "type", "text": "hello", "enter": true }}"#
    );
    let _ = writeln!(p, r#"- {{ "type": "speak", "text": "status update" }}"#);
    let _ = writeln!(p, r#"- {{ "type": "launch_app", "app": "notepad" }}"#);
    let _ = writeln!(p, r#"- {{ "type": "run_command", "command": "calc" }}"#);
    let _ = writeln!(
        p,
        r#"- {{ "type": "system", "command": "dir", "cwd": "C:\\" }}"#
    );
    let _ = writeln!(p, r#"- {{ "type": "stop", "reason": "objective reached" }}"#);
    let _ = writeln!(p, r#"- {{ "type": "wait" }}"#);
    let _ = writeln!(
        p,
        "Each action may include a \"thought\" field with your reasoning."
    );
    let _ = writeln!(
        p,
        "IMPORTANT: Return ONLY a raw JSON array of actions. No markdown, no prose."
    );

    p
}

/// Parses the model's raw text into directives. Accepts a single action
/// object or an array; Markdown code fences are stripped first. Malformed
/// JSON is an ordinary recoverable error, never a crash.
pub fn parse_plan(raw: &str) -> Result<Vec<Directive>, DecisionError> {
    let cleaned = strip_code_fences(raw);

    if let Ok(list) = serde_json::from_str::<Vec<Directive>>(&cleaned) {
        return Ok(list);
    }
    match serde_json::from_str::<Directive>(&cleaned) {
        Ok(single) => Ok(vec![single]),
        Err(e) => Err(DecisionError::Other(format!(
            "unparseable model response: {e}"
        ))),
    }
}

fn strip_code_fences(raw: &str) -> String {
    // ```json ... ``` or bare ``` fences, anywhere in the response.
    let fence = regex::Regex::new(r"```(?:json)?").expect("static regex");
    fence.replace_all(raw, "").trim().to_string()
}
