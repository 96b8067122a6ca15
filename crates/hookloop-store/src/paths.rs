use std::path::{Path, PathBuf};

/// Env var the host sets to the project root.
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Env var that points the handoff-driven loop at a different document.
pub const HANDOFF_FILE_ENV: &str = "CONTINUOUS_HANDOFF_FILE";

/// All well-known paths under `.claude/`.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub claude_dir: PathBuf,
    pub state_json: PathBuf,
    pub todo_md: PathBuf,
    pub handoff_md: PathBuf,
    pub log_md: PathBuf,
    pub config_json: PathBuf,
}

impl ProjectPaths {
    /// Derive all paths from a project root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let claude_dir = root.join(".claude");
        Self {
            state_json: claude_dir.join("agent-state.json"),
            todo_md: claude_dir.join("todo.md"),
            handoff_md: claude_dir.join("HANDOFF.md"),
            log_md: claude_dir.join("loop-log.md"),
            config_json: claude_dir.join("hookloop.json"),
            claude_dir,
            root,
        }
    }

    /// Resolve from the process environment: `CLAUDE_PROJECT_DIR`, else the
    /// current directory. `CONTINUOUS_HANDOFF_FILE` overrides the handoff path.
    pub fn from_env() -> anyhow::Result<Self> {
        let root = match std::env::var_os(PROJECT_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => std::env::current_dir()?,
        };
        let mut paths = Self::discover(root);
        if let Some(custom) = std::env::var_os(HANDOFF_FILE_ENV).filter(|v| !v.is_empty()) {
            paths.handoff_md = paths.resolve(Path::new(&custom));
        }
        Ok(paths)
    }

    /// Resolve a possibly relative path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.claude_dir.is_dir()
    }
}
