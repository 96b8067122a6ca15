//! Hooks that only report on a running loop: PostToolUse (Edit|Write) and
//! SessionStart. Neither advances the loop.

use std::path::Path;

use hookloop_core::LoopState;
use hookloop_store::{load_state, recent_events, ProjectPaths};
use serde_json::Value;

use crate::config::Settings;
use crate::engine::Driver;
use crate::mode::Sources;
use crate::parse::get_tool_input_str;
use crate::render;

fn active_state(paths: &ProjectPaths, settings: &Settings) -> Option<LoopState> {
    let state = load_state(paths, settings.max_iterations);
    state.active.then_some(state)
}

/// Name the edited file against the current iteration.
pub fn post_edit(raw: &Value, paths: &ProjectPaths, settings: &Settings) -> Option<String> {
    let state = active_state(paths, settings)?;
    let file_path = get_tool_input_str(raw, "file_path");
    let name = Path::new(&file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    Some(render::progress(&state, &name))
}

/// Resume summary for a session that opens on a running loop.
pub fn session_start(paths: &ProjectPaths, settings: &Settings) -> Option<String> {
    let mut state = active_state(paths, settings)?;
    let sources = Sources::read(paths);
    state.todos = sources.todos;
    state.handoff = sources.handoff;
    let next_task = Driver::for_mode(state.mode).next_task(&state);
    let mut msg = render::session_resume(&state, &next_task, settings.task_chars);
    if let Some(last) = recent_events(paths, 1).pop() {
        msg.push_str(&format!("\n📜 Last event: {last}"));
    }
    Some(msg)
}
