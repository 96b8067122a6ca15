//! State Store: load with default back-fill, save with full overwrite.
//!
//! Last writer wins. Readers never fail: an absent or malformed document
//! degrades to a fresh default state.

use std::fs;
use std::io::ErrorKind;

use anyhow::Context;
use hookloop_core::{LoopError, LoopState};
use tracing::debug;

use crate::paths::ProjectPaths;
use crate::{now_rfc3339, write_atomic};

/// Read the state document. `Ok(None)` when the file does not exist.
pub fn try_load_state(paths: &ProjectPaths) -> Result<Option<LoopState>, LoopError> {
    let path = &paths.state_json;
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoopError::Read {
                path: path.clone(),
                source,
            })
        }
    };
    let state = serde_json::from_str(&content).map_err(|source| LoopError::MalformedState {
        path: path.clone(),
        source,
    })?;
    Ok(Some(state))
}

/// Load the state document, substituting a default for anything unusable.
pub fn load_state(paths: &ProjectPaths, default_max: u32) -> LoopState {
    let mut state = match try_load_state(paths) {
        Ok(Some(state)) => state,
        Ok(None) => LoopState::with_max_iterations(default_max),
        Err(e) => {
            debug!(error = %e, "state file unusable, starting from defaults");
            LoopState::with_max_iterations(default_max)
        }
    };
    state.normalize(default_max);
    state
}

/// Stamp `lastUpdated` and overwrite the state document.
pub fn save_state(paths: &ProjectPaths, state: &mut LoopState) -> anyhow::Result<()> {
    state.last_updated = Some(now_rfc3339());
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    debug!(
        path = %paths.state_json.display(),
        mode = %state.mode,
        iteration = state.iteration,
        active = state.active,
        "writing loop state"
    );
    write_atomic(&paths.state_json, buf.as_bytes())
        .with_context(|| format!("write state {}", paths.state_json.display()))
}
