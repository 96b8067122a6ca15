//! Append-only loop event log (`.claude/loop-log.md`).

use std::fs;
use std::io::Write;

use time::OffsetDateTime;

use crate::local_now;
use crate::paths::ProjectPaths;

/// Append one `[YYYY-MM-DD HH:MM:SS] message` line, stamped in local time.
pub fn append_event(paths: &ProjectPaths, message: &str) -> anyhow::Result<()> {
    fs::create_dir_all(&paths.claude_dir)?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_md)?;
    writeln!(
        file,
        "[{}] {}",
        log_timestamp(local_now()),
        message.replace('\n', " ")
    )?;
    Ok(())
}

/// Last `limit` lines of the log, oldest first. Missing log → empty.
pub fn recent_events(paths: &ProjectPaths, limit: usize) -> Vec<String> {
    let Ok(content) = fs::read_to_string(&paths.log_md) else {
        return Vec::new();
    };
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(limit);
    lines[start..].iter().map(|l| l.to_string()).collect()
}

fn log_timestamp(ts: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}
