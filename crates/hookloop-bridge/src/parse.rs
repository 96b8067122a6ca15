use std::fs;
use std::path::Path;

use serde_json::Value;

// ── Hook stdin parsing ──

/// Parse the stdin JSON from a hook invocation.
/// Empty or malformed input reads as `Null`, i.e. every field empty.
pub(crate) fn parse_hook_stdin(stdin: &str) -> Value {
    if stdin.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(stdin).unwrap_or(Value::Null)
}

/// String field by its snake_case name, falling back to the camelCase
/// spelling some hosts send. Missing or non-string reads as empty.
pub(crate) fn get_str(v: &Value, snake_key: &str) -> String {
    [snake_key.to_string(), snake_to_camel(snake_key)]
        .iter()
        .find_map(|key| v.get(key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// Get a string field nested under `tool_input`.
pub(crate) fn get_tool_input_str(v: &Value, key: &str) -> String {
    let tool_input = v
        .get("tool_input")
        .or_else(|| v.get("toolInput"))
        .unwrap_or(&Value::Null);
    get_str(tool_input, key)
}

pub(crate) fn snake_to_camel(s: &str) -> String {
    let mut words = s.split('_');
    let mut out = words.next().unwrap_or_default().to_string();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

// ── Stop payload ──

/// Stop reasons that end the turn without giving the loop a say.
const INTERRUPT_REASONS: &[&str] = &["user_interrupt", "max_tokens"];

#[derive(Debug, Default, Clone)]
pub(crate) struct StopInput {
    pub transcript: String,
    pub stop_reason: String,
    pub transcript_path: String,
}

impl StopInput {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            transcript: get_str(raw, "transcript"),
            stop_reason: get_str(raw, "stop_reason"),
            transcript_path: get_str(raw, "transcript_path"),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        INTERRUPT_REASONS.contains(&self.stop_reason.as_str())
    }

    /// Text to scan for signals: the inline transcript, or failing that the
    /// last assistant message of the JSONL transcript file.
    pub fn text(&self) -> String {
        if !self.transcript.is_empty() || self.transcript_path.is_empty() {
            return self.transcript.clone();
        }
        last_assistant_text(Path::new(&self.transcript_path)).unwrap_or_default()
    }
}

/// Text blocks of the last `assistant` record in a JSONL transcript.
fn last_assistant_text(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    content.lines().rev().find_map(|line| {
        let record: Value = serde_json::from_str(line).ok()?;
        if record.get("type").and_then(|t| t.as_str()) != Some("assistant") {
            return None;
        }
        let content = record.get("message")?.get("content")?;
        if let Some(s) = content.as_str() {
            return Some(s.to_string());
        }
        let texts: Vec<&str> = content
            .as_array()?
            .iter()
            .filter(|item| item.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    })
}
