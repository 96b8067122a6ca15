//! Mode resolution: which loop semantics apply to this invocation.

use std::fs;
use std::path::Path;

use hookloop_core::{HandoffMirror, LoopMode, LoopState, TodoList};
use hookloop_store::ProjectPaths;

use crate::signals::{parse_handoff_markdown, parse_todo_markdown};

/// Parsed task sources, read once per invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sources {
    pub todos: TodoList,
    pub handoff: HandoffMirror,
}

impl Sources {
    /// Read the todo and handoff documents. Missing or unreadable files
    /// parse as empty.
    pub fn read(paths: &ProjectPaths) -> Self {
        Self {
            todos: read_markdown(&paths.todo_md)
                .map(|t| parse_todo_markdown(&t))
                .unwrap_or_default(),
            handoff: read_markdown(&paths.handoff_md)
                .map(|t| parse_handoff_markdown(&t))
                .unwrap_or_default(),
        }
    }
}

fn read_markdown(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// Explicit modes are sticky. Otherwise open todo items win over handoff
/// next steps, and with neither the loop is idle.
pub fn resolve_mode(state: &LoopState, sources: &Sources) -> LoopMode {
    if state.mode.is_explicit() {
        return state.mode;
    }
    if sources.todos.has_open_items() {
        LoopMode::Ralph
    } else if !sources.handoff.next_steps.is_empty() {
        LoopMode::Continuous
    } else {
        LoopMode::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sources(todo: &str, handoff: &str) -> Sources {
        Sources {
            todos: parse_todo_markdown(todo),
            handoff: parse_handoff_markdown(handoff),
        }
    }

    fn state_with(mode: LoopMode) -> LoopState {
        LoopState {
            mode,
            ..Default::default()
        }
    }

    #[test]
    fn explicit_mode_is_sticky() {
        let src = sources("- [ ] open", "");
        for mode in [LoopMode::Continuous, LoopMode::Research, LoopMode::Review] {
            assert_eq!(resolve_mode(&state_with(mode), &src), mode);
        }
    }

    #[test]
    fn todo_items_take_priority_over_handoff() {
        let src = sources("- [~] working", "## Next Steps\n1. step\n");
        assert_eq!(resolve_mode(&state_with(LoopMode::Auto), &src), LoopMode::Ralph);
        assert_eq!(resolve_mode(&state_with(LoopMode::Idle), &src), LoopMode::Ralph);
    }

    #[test]
    fn handoff_steps_without_open_todos() {
        let src = sources("- [x] done", "## Next Steps\n1. step\n");
        assert_eq!(
            resolve_mode(&state_with(LoopMode::Auto), &src),
            LoopMode::Continuous
        );
    }

    #[test]
    fn nothing_to_do_is_idle() {
        let src = sources("- [x] done", "## Next Steps\n1. [placeholder]\n");
        assert_eq!(resolve_mode(&state_with(LoopMode::Auto), &src), LoopMode::Idle);
    }

    #[test]
    fn read_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let paths = ProjectPaths::discover(dir.path());
        assert_eq!(Sources::read(&paths), Sources::default());

        fs::create_dir_all(&paths.claude_dir).unwrap();
        fs::write(&paths.todo_md, "- [ ] a\n- [x] b\n").unwrap();
        fs::write(&paths.handoff_md, "| **Run #** | 3 |\n").unwrap();
        let src = Sources::read(&paths);
        assert_eq!(src.todos.pending, vec!["a"]);
        assert_eq!(src.handoff.run_number, 3);
    }
}
