//! Iteration Engine: the loop state machine behind the Stop hook.
//!
//! `idle → running → {completed | cancelled | max_reached}`. [`advance`] is
//! pure over (state, parsed sources, transcript); [`run_stop`] wraps it with
//! the file I/O of one Stop invocation.

use anyhow::Context;
use hookloop_core::{LoopMode, LoopState, LoopStatus};
use hookloop_store::{append_event, load_state, save_state, ProjectPaths};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::Settings;
use crate::mode::{resolve_mode, Sources};
use crate::parse::StopInput;
use crate::render;
use crate::signals::{
    has_cancel_signal, has_completion_signal, is_all_tasks_complete, is_handoff_complete,
    todo_requests_cancel,
};

const TODO_FALLBACK: &str = "Continue with the remaining tasks";
const HANDOFF_FALLBACK: &str = "Check HANDOFF.md";
const PLAIN_FALLBACK: &str = "Continue working";

// ── Drivers ──

/// Where a mode takes its tasks from, and what "finished" means for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// Checklist in `todo.md`.
    Todo,
    /// Next steps in `HANDOFF.md`.
    Handoff,
    /// No task source; only transcript signals end the loop.
    Plain,
}

impl Driver {
    pub fn for_mode(mode: LoopMode) -> Self {
        match mode {
            LoopMode::Ralph => Driver::Todo,
            LoopMode::Continuous => Driver::Handoff,
            LoopMode::Research | LoopMode::Review | LoopMode::Idle | LoopMode::Auto => {
                Driver::Plain
            }
        }
    }

    fn cancel_requested(self, state: &LoopState) -> bool {
        match self {
            Driver::Todo => todo_requests_cancel(&state.todos),
            Driver::Handoff | Driver::Plain => false,
        }
    }

    fn work_finished(self, state: &LoopState) -> bool {
        match self {
            Driver::Todo => is_all_tasks_complete(&state.todos),
            Driver::Handoff => is_handoff_complete(&state.handoff),
            Driver::Plain => false,
        }
    }

    pub fn next_task(self, state: &LoopState) -> String {
        let task = match self {
            Driver::Todo => state.todos.next_task().unwrap_or(TODO_FALLBACK),
            Driver::Handoff => state.handoff.next_step().unwrap_or(HANDOFF_FALLBACK),
            Driver::Plain => PLAIN_FALLBACK,
        };
        task.to_string()
    }
}

// ── Transitions ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Cancelled,
    Completed,
    MaxReached,
    Continue { next_task: String },
}

/// Apply one Stop event to `state`. Rules are checked in a fixed order:
/// cancel, then completion, then the iteration cap, else continue.
pub fn advance(
    state: &mut LoopState,
    mode: LoopMode,
    sources: &Sources,
    transcript: &str,
    now: &str,
) -> Transition {
    state.todos = sources.todos.clone();
    state.handoff = sources.handoff.clone();
    let driver = Driver::for_mode(mode);

    if has_cancel_signal(transcript) || driver.cancel_requested(state) {
        state.active = false;
        state.mode = LoopMode::Idle;
        state.status = LoopStatus::Cancelled;
        return Transition::Cancelled;
    }

    if has_completion_signal(transcript) || driver.work_finished(state) {
        state.active = false;
        state.mode = LoopMode::Idle;
        state.status = LoopStatus::Completed;
        return Transition::Completed;
    }

    if state.iteration >= state.max_iterations {
        state.active = false;
        state.status = LoopStatus::MaxReached;
        return Transition::MaxReached;
    }

    state.iteration += 1;
    state.active = true;
    state.mode = mode;
    state.status = LoopStatus::Running;
    if state.start_time.is_none() {
        state.start_time = Some(now.to_string());
    }
    Transition::Continue {
        next_task: driver.next_task(state),
    }
}

// ── Controller ──

/// Handle one Stop hook invocation. `Ok(None)` means print nothing.
pub fn run_stop(
    raw: &Value,
    paths: &ProjectPaths,
    settings: &Settings,
    now: OffsetDateTime,
) -> anyhow::Result<Option<String>> {
    let input = StopInput::from_value(raw);
    if input.is_interrupted() {
        debug!(stop_reason = %input.stop_reason, "interrupted stop, skipping");
        return Ok(None);
    }

    let mut state = load_state(paths, settings.max_iterations);
    let sources = Sources::read(paths);
    let mode = resolve_mode(&state, &sources);
    let now_str = now.format(&Rfc3339).context("format timestamp")?;

    if !state.active {
        if mode == LoopMode::Idle {
            return Ok(None);
        }
        if state.mode.is_explicit() {
            debug!(mode = %state.mode, status = %state.status, "halted loop waits for restart");
            return Ok(None);
        }
        if state.status == LoopStatus::Cancelled && todo_requests_cancel(&sources.todos) {
            debug!("cancel flag still present in todo file");
            return Ok(None);
        }
        state.activate(mode, now_str.clone());
        log_event(paths, &format!("Loop activated: mode={mode}"));
    }

    let transcript = input.text();
    let transition = advance(&mut state, mode, &sources, &transcript, &now_str);
    save_state(paths, &mut state)?;

    let (event, message) = match &transition {
        Transition::Cancelled => (
            format!("Loop cancelled at iteration {}", state.iteration),
            render::cancelled(&state),
        ),
        Transition::Completed => (
            format!("Loop completed at iteration {}", state.iteration),
            render::completion(&state, mode, now),
        ),
        Transition::MaxReached => (
            format!("Max iterations ({}) reached", state.max_iterations),
            render::max_reached(&state),
        ),
        Transition::Continue { next_task } => (
            format!(
                "Iteration {}: mode={mode}, next={}",
                state.iteration,
                render::truncate_chars(next_task, settings.task_chars)
            ),
            render::continuation(&state, mode, next_task, settings.task_chars),
        ),
    };
    debug!(?transition, iteration = state.iteration, "stop handled");
    log_event(paths, &event);
    Ok(Some(message))
}

/// Event log failures never change the hook's output.
pub(crate) fn log_event(paths: &ProjectPaths, message: &str) {
    if let Err(e) = append_event(paths, message) {
        debug!(error = %e, "event log append failed");
    }
}
