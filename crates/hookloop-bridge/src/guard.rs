//! PreToolUse:Bash guard.
//!
//! Commands are checked against three severity tiers. Critical and high
//! matches block the call; medium matches only warn. While a loop is running
//! a few extra destructive commands are blocked outright. A bare
//! `rm -rf <relative>` is rewritten to an explicit `./` path.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Critical,
    High,
    Medium,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Critical => "CRITICAL",
            Level::High => "HIGH",
            Level::Medium => "MEDIUM",
        }
    }
}

struct Rule {
    pattern: Regex,
    description: &'static str,
}

fn rules(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, description)| Rule {
            pattern: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .unwrap(),
            description: *description,
        })
        .collect()
}

static CRITICAL: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let fork_bomb = regex::escape(":(){ :|:& };:");
    rules(&[
        (r"rm\s+-rf\s+/\s*$", "root directory deletion"),
        (r"rm\s+-rf\s+~", "home directory deletion"),
        (r"rm\s+-rf\s+\$HOME", "home directory deletion"),
        (r"rm\s+-rf\s+/home", "/home deletion"),
        (r"rm\s+-rf\s+/Users", "/Users deletion"),
        (r"mkfs\.", "filesystem format"),
        (r"dd\s+if=.*of=/dev/", "raw device write"),
        (r">\s*/dev/sd[a-z]", "disk device redirect"),
        (r"chmod\s+-R\s+777\s+/", "recursive 777 on root"),
        (fork_bomb.as_str(), "fork bomb"),
    ])
});

static HIGH: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[
        (r"git\s+push\s+.*--force.*main", "force push to main"),
        (r"git\s+push\s+.*--force.*master", "force push to master"),
        (r"git\s+reset\s+--hard\s+origin", "discard all local changes"),
        (r"drop\s+database", "database drop"),
        (r"drop\s+table", "table drop"),
    ])
});

static MEDIUM: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    rules(&[
        (r"rm\s+-rf\s+\.", "recursive delete in working tree"),
        (r"git\s+push\s+--force", "force push"),
        (r"npm\s+publish", "package publish"),
        (r"pip\s+install\s+--upgrade", "package upgrade"),
    ])
});

/// Blocked only while a loop is active. Matched case-insensitively as substrings.
const LOOP_BLOCKED: &[&str] = &[
    "git push --force",
    "git reset --hard",
    "rm -rf /",
    "drop database",
];

static RELATIVE_RM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rm\s+-rf\s+([^/~$].+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Block(String),
    Warn(String),
    Rewrite { command: String, note: String },
    Allow,
}

fn first_match(command: &str, rules: &[Rule], level: Level) -> Option<String> {
    rules
        .iter()
        .find(|r| r.pattern.is_match(command))
        .map(|r| format!("[{}] {}", level.as_str(), r.description))
}

/// Rewrites only the `rm` invocation; any prefix (`cd dir &&`, `sudo`) is kept.
fn safe_rewrite(command: &str) -> Option<String> {
    let caps = RELATIVE_RM.captures(command)?;
    if caps[1].starts_with("./") {
        return None;
    }
    Some(RELATIVE_RM.replace(command, "rm -rf ./$1").into_owned())
}

pub fn assess(command: &str, loop_active: bool) -> Verdict {
    if command.trim().is_empty() {
        return Verdict::Allow;
    }
    if let Some(msg) = first_match(command, &CRITICAL, Level::Critical) {
        return Verdict::Block(format!("🚫 BLOCKED: {msg}"));
    }
    if let Some(msg) = first_match(command, &HIGH, Level::High) {
        return Verdict::Block(format!("⛔ BLOCKED: {msg}"));
    }
    if loop_active {
        let lower = command.to_lowercase();
        if let Some(hit) = LOOP_BLOCKED.iter().find(|s| lower.contains(**s)) {
            return Verdict::Block(format!(
                "⛔ BLOCKED: `{hit}` is not allowed while a loop is running"
            ));
        }
    }
    if let Some(msg) = first_match(command, &MEDIUM, Level::Medium) {
        return Verdict::Warn(format!("⚠️ Caution: {msg}. Confirm before running."));
    }
    if let Some(rewritten) = safe_rewrite(command) {
        let note = format!("✅ Safe mode: '{command}' → '{rewritten}'");
        return Verdict::Rewrite {
            command: rewritten,
            note,
        };
    }
    Verdict::Allow
}
