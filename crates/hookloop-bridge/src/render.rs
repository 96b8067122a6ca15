//! Message formatting for everything injected as `additionalContext`.
//!
//! Messages stay short (a couple of lines) since they are re-injected on
//! every turn while a loop runs.

use hookloop_core::{LoopMode, LoopState};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::signals::{CANCEL_KEYWORD, COMPLETION_KEYWORD};

/// Keep the first `max` characters, appending `...` when anything was cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Parse an RFC 3339 timestamp, or an ISO 8601 one without offset (read as UTC).
pub(crate) fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).ok().or_else(|| {
        PrimitiveDateTime::parse(s, &Iso8601::DEFAULT)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    })
}

/// `now - start` floored to minutes: `Nm` under an hour, else `Xh Ym`.
/// Missing or unparsable start renders as `?`.
pub fn format_elapsed(start: Option<&str>, now: OffsetDateTime) -> String {
    let Some(start) = start.and_then(parse_timestamp) else {
        return "?".to_string();
    };
    let minutes = (now - start).whole_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m")
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

fn loop_label(mode: LoopMode) -> &'static str {
    match mode {
        LoopMode::Research => "Research loop",
        LoopMode::Review => "Review loop",
        LoopMode::Ralph | LoopMode::Continuous | LoopMode::Idle | LoopMode::Auto => "Loop",
    }
}

// ── Controller messages ──

pub fn continuation(state: &LoopState, mode: LoopMode, next_task: &str, task_chars: usize) -> String {
    let task = truncate_chars(next_task, task_chars);
    let (i, max) = (state.iteration, state.max_iterations);
    match mode {
        LoopMode::Ralph => format!(
            "🔄 Loop {i}/{max} | Pending: {} | Next: {task}\n\
             💡 Say {COMPLETION_KEYWORD} when done | Cancel: {CANCEL_KEYWORD}",
            state.todos.incomplete_count()
        ),
        LoopMode::Continuous => format!(
            "🔄 Continuous Run #{} | Iter: {i}/{max}\n\
             → {task}\n\
             💡 Say {COMPLETION_KEYWORD} when done",
            state.handoff.run_number
        ),
        LoopMode::Research | LoopMode::Review | LoopMode::Idle | LoopMode::Auto => format!(
            "🔄 {} {i}/{max} | {task}\n💡 Say {COMPLETION_KEYWORD} to finish",
            loop_label(mode)
        ),
    }
}

pub fn completion(state: &LoopState, mode: LoopMode, now: OffsetDateTime) -> String {
    let elapsed = format_elapsed(state.start_time.as_deref(), now);
    let i = state.iteration;
    match mode {
        LoopMode::Ralph => format!(
            "✅ {COMPLETION_KEYWORD} | Completed tasks: {} | Iterations: {i} | Elapsed: {elapsed}",
            state.todos.completed.len()
        ),
        LoopMode::Continuous => format!(
            "✅ {COMPLETION_KEYWORD} | Run #{} | Iterations: {i} | Elapsed: {elapsed}",
            state.handoff.run_number
        ),
        LoopMode::Research | LoopMode::Review | LoopMode::Idle | LoopMode::Auto => {
            format!("✅ {COMPLETION_KEYWORD} | Iterations: {i} | Elapsed: {elapsed}")
        }
    }
}

pub fn cancelled(state: &LoopState) -> String {
    format!(
        "⏹️ Loop cancelled | Iterations: {} | Resume with `hookloop loop start`",
        state.iteration
    )
}

pub fn max_reached(state: &LoopState) -> String {
    format!(
        "⚠️ Max iterations ({}) reached | Raise the cap to continue: `hookloop loop start --max-iterations <N>`",
        state.max_iterations
    )
}

// ── Session / progress messages ──

pub fn session_resume(state: &LoopState, next_task: &str, task_chars: usize) -> String {
    format!(
        "🔄 Active {} loop resumed | Iteration {}/{} | Next: {}\n\
         💡 Say {COMPLETION_KEYWORD} when done | Cancel: {CANCEL_KEYWORD}",
        state.mode,
        state.iteration,
        state.max_iterations,
        truncate_chars(next_task, task_chars)
    )
}

pub fn progress(state: &LoopState, file_name: &str) -> String {
    format!(
        "📝 Loop {}/{}: {file_name} modified",
        state.iteration, state.max_iterations
    )
}
