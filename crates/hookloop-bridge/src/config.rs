use hookloop_core::DEFAULT_MAX_ITERATIONS;
use hookloop_store::{config_value, ProjectPaths};

pub const DEFAULT_TASK_CHARS: usize = 50;

pub const MAX_ITERATIONS_ENV: &str = "HOOKLOOP_MAX_ITERATIONS";
pub const TASK_CHARS_ENV: &str = "HOOKLOOP_TASK_CHARS";

/// Per-invocation knobs. Resolution: env var, then `.claude/hookloop.json`,
/// then the built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Cap applied when the state document carries none.
    pub max_iterations: u32,
    /// Character budget for task text in injected messages.
    pub task_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            task_chars: DEFAULT_TASK_CHARS,
        }
    }
}

impl Settings {
    pub fn resolve(paths: &ProjectPaths) -> Self {
        Self::resolve_with(paths, |key| std::env::var(key).ok())
    }

    /// Same as [`Settings::resolve`] with an injectable environment lookup.
    pub fn resolve_with(paths: &ProjectPaths, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_iterations = lookup(paths, &env, MAX_ITERATIONS_ENV, "loop.max_iterations")
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_iterations);
        let task_chars = lookup(paths, &env, TASK_CHARS_ENV, "loop.task_chars")
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.task_chars);
        Self {
            max_iterations,
            task_chars,
        }
    }
}

fn lookup(
    paths: &ProjectPaths,
    env: &impl Fn(&str) -> Option<String>,
    env_key: &str,
    config_key: &str,
) -> Option<u64> {
    env(env_key)
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| config_value(paths, config_key).and_then(|v| v.as_u64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_env_or_config() {
        let dir = TempDir::new().unwrap();
        let paths = ProjectPaths::discover(dir.path());
        assert_eq!(Settings::resolve_with(&paths, no_env), Settings::default());
    }

    #[test]
    fn config_file_overrides_default() {
        let dir = TempDir::new().unwrap();
        let paths = ProjectPaths::discover(dir.path());
        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(
            &paths.config_json,
            r#"{"loop.max_iterations": 25, "loop.task_chars": 0}"#,
        )
        .unwrap();
        let settings = Settings::resolve_with(&paths, no_env);
        assert_eq!(settings.max_iterations, 25);
        // zero is not a usable budget
        assert_eq!(settings.task_chars, DEFAULT_TASK_CHARS);
    }

    #[test]
    fn env_wins_over_config() {
        let dir = TempDir::new().unwrap();
        let paths = ProjectPaths::discover(dir.path());
        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(&paths.config_json, r#"{"loop.max_iterations": 25}"#).unwrap();
        let env = |key: &str| (key == MAX_ITERATIONS_ENV).then(|| "4".to_string());
        assert_eq!(Settings::resolve_with(&paths, env).max_iterations, 4);

        let bad_env = |key: &str| (key == MAX_ITERATIONS_ENV).then(|| "lots".to_string());
        assert_eq!(Settings::resolve_with(&paths, bad_env).max_iterations, 25);
    }
}
