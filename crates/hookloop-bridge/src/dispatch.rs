use std::fmt;

use hookloop_store::{append_event, load_state, ProjectPaths};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::engine::{log_event, run_stop};
use crate::guard::{assess, Verdict};
use crate::parse::{get_tool_input_str, parse_hook_stdin};
use crate::progress::{post_edit, session_start};
use crate::redact::redact_secrets;

/// Exit code that tells the host to refuse the tool call.
pub const BLOCK_EXIT_CODE: i32 = 2;

/// Which hook event this process is answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Stop: advance the loop.
    Stop,
    /// PreToolUse:Bash: command guard.
    PreBash,
    /// PostToolUse:Edit|Write: progress note.
    PostEdit,
    /// SessionStart: resume summary.
    SessionStart,
}

impl HookKind {
    pub fn from_arg(s: &str) -> Option<Self> {
        match s {
            "stop" | "Stop" => Some(HookKind::Stop),
            "pre-bash" | "PreToolUse" => Some(HookKind::PreBash),
            "post-edit" | "PostToolUse" => Some(HookKind::PostEdit),
            "session-start" | "SessionStart" => Some(HookKind::SessionStart),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::Stop => "stop",
            HookKind::PreBash => "pre-bash",
            HookKind::PostEdit => "post-edit",
            HookKind::SessionStart => "session-start",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the hook process prints and how it exits.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HookResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: i32,
}

impl HookResult {
    /// Stdout only, exit 0.
    pub fn output(stdout: String) -> Self {
        Self {
            stdout: Some(stdout),
            ..Self::default()
        }
    }

    /// Refuse the tool call: message on stderr, exit 2.
    pub fn block(msg: String) -> Self {
        Self {
            stdout: None,
            stderr: Some(msg),
            exit_code: BLOCK_EXIT_CODE,
        }
    }

    /// No output, exit 0.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `{"additionalContext": msg}`.
    pub fn context(msg: &str) -> anyhow::Result<Self> {
        let output = serde_json::json!({ "additionalContext": msg });
        Ok(Self::output(serde_json::to_string(&output)?))
    }

    fn from_context(msg: Option<String>) -> anyhow::Result<Self> {
        match msg {
            Some(msg) => Self::context(&msg),
            None => Ok(Self::empty()),
        }
    }
}

/// Process-level entry: resolve paths and settings from the environment,
/// dispatch, and settle any error.
pub fn hook_entrypoint_from_stdin(kind: HookKind, stdin: &str) -> HookResult {
    let paths = match ProjectPaths::from_env() {
        Ok(paths) => paths,
        Err(e) => {
            warn!(hook = %kind, error = %e, "cannot resolve project directory");
            return HookResult::empty();
        }
    };
    let settings = Settings::resolve(&paths);
    let result = dispatch(kind, stdin, &paths, &settings, OffsetDateTime::now_utc());
    settle(result, &paths)
}

/// Run one hook against explicit paths and settings.
pub fn dispatch(
    kind: HookKind,
    stdin: &str,
    paths: &ProjectPaths,
    settings: &Settings,
    now: OffsetDateTime,
) -> anyhow::Result<HookResult> {
    let raw = parse_hook_stdin(stdin);
    debug!(hook = %kind, root = %paths.root.display(), "dispatch");
    match kind {
        HookKind::Stop => HookResult::from_context(run_stop(&raw, paths, settings, now)?),
        HookKind::PreBash => dispatch_pre_bash(&raw, paths, settings),
        HookKind::PostEdit => HookResult::from_context(post_edit(&raw, paths, settings)),
        HookKind::SessionStart => HookResult::from_context(session_start(paths, settings)),
    }
}

fn dispatch_pre_bash(
    raw: &Value,
    paths: &ProjectPaths,
    settings: &Settings,
) -> anyhow::Result<HookResult> {
    let command = get_tool_input_str(raw, "command");
    let loop_active = load_state(paths, settings.max_iterations).active;
    match assess(&command, loop_active) {
        Verdict::Block(msg) => {
            if paths.is_initialized() {
                log_event(
                    paths,
                    &format!("Blocked command: {} ({msg})", redact_secrets(&command)),
                );
            }
            Ok(HookResult::block(msg))
        }
        Verdict::Warn(msg) => HookResult::context(&msg),
        Verdict::Rewrite { command, note } => {
            let output = serde_json::json!({
                "updatedInput": { "command": command },
                "additionalContext": note,
            });
            Ok(HookResult::output(serde_json::to_string(&output)?))
        }
        Verdict::Allow => Ok(HookResult::empty()),
    }
}

/// Record a failed dispatch and degrade it to "no output, exit 0".
pub fn settle(result: anyhow::Result<HookResult>, paths: &ProjectPaths) -> HookResult {
    match result {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "hook failed");
            if let Err(log_err) = append_event(paths, &format!("Error: {e:#}")) {
                debug!(error = %log_err, "could not record hook error");
            }
            HookResult::empty()
        }
    }
}
