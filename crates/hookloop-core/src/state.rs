//! Loop state document persisted at `.claude/agent-state.json`.
//!
//! Keys are camelCase on disk. Every field has a default so partially written
//! documents are back-filled on load, and keys this crate does not know about
//! (peer hooks keep `research` / `review` sub-documents here) survive a
//! load/save cycle untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoopError;

/// Iteration cap used when neither the state file nor settings supply one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 15;

// ── Mode ──

/// Which continuation semantics the loop follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Idle,
    /// Todo-driven: tasks come from `.claude/todo.md`.
    Ralph,
    /// Handoff-driven: tasks come from `.claude/HANDOFF.md`.
    Continuous,
    Research,
    Review,
    /// Detect from the project files. Unrecognised mode strings land here too.
    #[serde(other)]
    Auto,
}

impl LoopMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopMode::Idle => "idle",
            LoopMode::Ralph => "ralph",
            LoopMode::Continuous => "continuous",
            LoopMode::Research => "research",
            LoopMode::Review => "review",
            LoopMode::Auto => "auto",
        }
    }

    /// Explicit modes are sticky: they are never replaced by file detection.
    pub fn is_explicit(self) -> bool {
        !matches!(self, LoopMode::Idle | LoopMode::Auto)
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopMode {
    type Err = LoopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idle" => Ok(LoopMode::Idle),
            "ralph" | "todo" => Ok(LoopMode::Ralph),
            "continuous" | "handoff" => Ok(LoopMode::Continuous),
            "research" => Ok(LoopMode::Research),
            "review" => Ok(LoopMode::Review),
            "auto" => Ok(LoopMode::Auto),
            other => Err(LoopError::UnknownMode(other.to_string())),
        }
    }
}

// ── Status ──

/// Last phase the state machine reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    Running,
    Completed,
    Cancelled,
    MaxReached,
    /// Unrecognised status strings land here too.
    #[default]
    #[serde(other)]
    Idle,
}

impl LoopStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopStatus::Idle => "idle",
            LoopStatus::Running => "running",
            LoopStatus::Completed => "completed",
            LoopStatus::Cancelled => "cancelled",
            LoopStatus::MaxReached => "max_reached",
        }
    }
}

impl fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Mirrors ──

/// Snapshot of the Markdown checklist, bucketed by marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoList {
    pub pending: Vec<String>,
    pub in_progress: Vec<String>,
    pub completed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked: Vec<String>,
}

impl TodoList {
    /// Pending plus in-progress items.
    pub fn incomplete_count(&self) -> usize {
        self.pending.len() + self.in_progress.len()
    }

    pub fn has_open_items(&self) -> bool {
        self.incomplete_count() > 0
    }

    /// At least one item done and nothing left open.
    pub fn is_all_complete(&self) -> bool {
        !self.completed.is_empty() && !self.has_open_items()
    }

    /// First in-progress item, else first pending item.
    pub fn next_task(&self) -> Option<&str> {
        self.in_progress
            .first()
            .or_else(|| self.pending.first())
            .map(String::as_str)
    }
}

/// Snapshot of the handoff document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandoffMirror {
    pub run_number: u32,
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
}

impl HandoffMirror {
    pub fn next_step(&self) -> Option<&str> {
        self.next_steps.first().map(String::as_str)
    }
}

// ── LoopState ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoopState {
    pub mode: LoopMode,
    pub status: LoopStatus,
    pub active: bool,
    pub iteration: u32,
    pub max_iterations: u32,
    pub start_time: Option<String>,
    pub last_updated: Option<String>,
    pub todos: TodoList,
    pub handoff: HandoffMirror,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LoopState {
    fn default() -> Self {
        Self::with_max_iterations(DEFAULT_MAX_ITERATIONS)
    }
}

impl LoopState {
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self {
            mode: LoopMode::Idle,
            status: LoopStatus::Idle,
            active: false,
            iteration: 0,
            max_iterations: max_iterations.max(1),
            start_time: None,
            last_updated: None,
            todos: TodoList::default(),
            handoff: HandoffMirror::default(),
            extra: Map::new(),
        }
    }

    /// Repair values a hand-edited file can carry but the loop cannot run with.
    pub fn normalize(&mut self, default_max: u32) {
        if self.max_iterations == 0 {
            self.max_iterations = default_max.max(1);
        }
    }

    /// Start a fresh run: counters reset, clock restarted.
    pub fn activate(&mut self, mode: LoopMode, started_at: String) {
        self.mode = mode;
        self.status = LoopStatus::Running;
        self.active = true;
        self.iteration = 0;
        self.start_time = Some(started_at);
    }

    pub fn remaining(&self) -> u32 {
        self.max_iterations.saturating_sub(self.iteration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_are_back_filled() {
        let state: LoopState =
            serde_json::from_str(r#"{"mode":"ralph","iteration":4}"#).unwrap();
        assert_eq!(state.mode, LoopMode::Ralph);
        assert_eq!(state.iteration, 4);
        assert_eq!(state.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(!state.active);
        assert!(state.todos.pending.is_empty());
        assert_eq!(state.handoff.run_number, 0);
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let raw = r#"{"mode":"research","research":{"phase":"scan","papersFound":3}}"#;
        let state: LoopState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.mode, LoopMode::Research);
        assert_eq!(state.extra["research"]["papersFound"], 3);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["research"]["phase"], "scan");
        assert_eq!(json["maxIterations"], DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn unknown_mode_string_reads_as_auto() {
        let state: LoopState = serde_json::from_str(r#"{"mode":"turbo"}"#).unwrap();
        assert_eq!(state.mode, LoopMode::Auto);
    }

    #[test]
    fn on_disk_keys_are_camel_case() {
        let mut state = LoopState::default();
        state.todos.in_progress.push("wire up".into());
        state.handoff.next_steps.push("step".into());
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("maxIterations").is_some());
        assert!(json.get("startTime").is_some());
        assert_eq!(json["todos"]["in_progress"][0], "wire up");
        assert_eq!(json["handoff"]["nextSteps"][0], "step");
        assert!(json["todos"].get("blocked").is_none());
        assert!(json["handoff"].get("status").is_none());
        assert_eq!(json["status"], "idle");
    }

    #[test]
    fn status_uses_snake_case() {
        let mut state = LoopState::default();
        state.status = LoopStatus::MaxReached;
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "max_reached");
    }

    #[test]
    fn unknown_status_string_reads_as_idle() {
        let state: LoopState = serde_json::from_str(r#"{"status":"bogus"}"#).unwrap();
        assert_eq!(state.status, LoopStatus::Idle);
        let state: LoopState = serde_json::from_str(r#"{"status":"max_reached"}"#).unwrap();
        assert_eq!(state.status, LoopStatus::MaxReached);
    }

    #[test]
    fn normalize_replaces_zero_cap() {
        let mut state: LoopState = serde_json::from_str(r#"{"maxIterations":0}"#).unwrap();
        state.normalize(7);
        assert_eq!(state.max_iterations, 7);
    }

    #[test]
    fn mode_from_str_accepts_aliases() {
        assert_eq!("Ralph".parse::<LoopMode>().unwrap(), LoopMode::Ralph);
        assert_eq!("handoff".parse::<LoopMode>().unwrap(), LoopMode::Continuous);
        assert!("bogus".parse::<LoopMode>().is_err());
        assert!(LoopMode::Review.is_explicit());
        assert!(!LoopMode::Auto.is_explicit());
        assert!(!LoopMode::Idle.is_explicit());
    }

    #[test]
    fn todo_list_completion_rules() {
        let mut todos = TodoList::default();
        assert!(!todos.is_all_complete());
        todos.pending.push("a".into());
        assert!(!todos.is_all_complete());
        todos.completed.push("b".into());
        assert!(!todos.is_all_complete());
        todos.pending.clear();
        assert!(todos.is_all_complete());
    }

    #[test]
    fn next_task_prefers_in_progress() {
        let todos = TodoList {
            pending: vec!["p1".into()],
            in_progress: vec!["w1".into(), "w2".into()],
            ..Default::default()
        };
        assert_eq!(todos.next_task(), Some("w1"));
        let todos = TodoList {
            pending: vec!["p1".into()],
            ..Default::default()
        };
        assert_eq!(todos.next_task(), Some("p1"));
        assert_eq!(TodoList::default().next_task(), None);
    }

    #[test]
    fn activate_resets_counters() {
        let mut state = LoopState {
            iteration: 9,
            ..Default::default()
        };
        state.activate(LoopMode::Continuous, "2026-01-01T00:00:00Z".into());
        assert!(state.active);
        assert_eq!(state.iteration, 0);
        assert_eq!(state.status, LoopStatus::Running);
        assert_eq!(state.start_time.as_deref(), Some("2026-01-01T00:00:00Z"));
        assert_eq!(state.remaining(), DEFAULT_MAX_ITERATIONS);
    }
}
