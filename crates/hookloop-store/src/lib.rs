use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

mod config_file;
mod event_log;
mod paths;
mod state_file;

pub use config_file::{config_value, parse_value, read_config, write_config};
pub use event_log::{append_event, recent_events};
pub use paths::{ProjectPaths, HANDOFF_FILE_ENV, PROJECT_DIR_ENV};
pub use state_file::{load_state, save_state, try_load_state};

/// Replace `path` in one step: the bytes go to a sibling temp file which is
/// then renamed over the target. Missing parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("stage temp file in {}", dir.display()))?;
    staged.write_all(data)?;
    staged.flush()?;
    staged
        .persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Wall-clock time in the local offset. Falls back to UTC when the offset
/// cannot be determined (e.g. a multi-threaded process on Unix).
pub fn local_now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc())
}

/// Current UTC time as RFC 3339.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
