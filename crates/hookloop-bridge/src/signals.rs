//! Text signal detectors.
//!
//! Completion/cancel markers in free text, and the two Markdown conventions
//! the loop reads tasks from: a checklist (`todo.md`) and a handoff document
//! (`HANDOFF.md`). Everything here is pure over its input; nothing matched
//! means empty defaults, never an error.

use std::sync::LazyLock;

use hookloop_core::{HandoffMirror, TodoList};
use regex::Regex;

/// Markers that end the loop as completed. Matched case-insensitively.
pub const COMPLETION_SIGNALS: &[&str] = &[
    "LOOP_COMPLETE",
    "[DONE]",
    "[COMPLETE]",
    "작업완료",
    "완료",
    // legacy loop variants
    "RALPH_COMPLETE",
    "CONTINUOUS_COMPLETE",
    "ALL_TASKS_COMPLETE",
];

/// Markers that end the loop as cancelled.
pub const CANCEL_SIGNALS: &[&str] = &["LOOP_CANCEL", "[CANCEL]", "취소", "중단"];

/// Keyword surfaced in continuation messages as the way to finish.
pub const COMPLETION_KEYWORD: &str = "LOOP_COMPLETE";

/// Keyword surfaced in continuation messages as the way to stop early.
pub const CANCEL_KEYWORD: &str = "LOOP_CANCEL";

/// Handoff status value that marks the handoff-driven loop as finished.
pub const HANDOFF_COMPLETE_STATUS: &str = "CONTINUOUS_COMPLETE";

static RUN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Run #\*\*\s*\|\s*(\d+)").unwrap());

static NEXT_STEPS_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)## Next Steps.*?\n(.*?)(?:\n##|\n---|\z)").unwrap());

static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s+(.+)").unwrap());

static STATUS_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(?:Status|상태)\*\*:\s*`?(\w+)`?").unwrap());

fn contains_any(text: &str, markers: &[&str]) -> bool {
    let upper = text.to_uppercase();
    markers.iter().any(|m| upper.contains(&m.to_uppercase()))
}

pub fn has_completion_signal(text: &str) -> bool {
    contains_any(text, COMPLETION_SIGNALS)
}

pub fn has_cancel_signal(text: &str) -> bool {
    contains_any(text, CANCEL_SIGNALS)
}

// ── Checklist ──

/// Split `- [m] rest` into its marker character and the remainder.
fn split_marker(line: &str) -> Option<(char, &str)> {
    let rest = line.strip_prefix("- [")?;
    let mut chars = rest.chars();
    let marker = chars.next()?;
    let rest = chars.as_str().strip_prefix(']')?;
    Some((marker, rest))
}

/// Bucket checklist lines by marker, keeping file order within each bucket.
///
/// `[ ]` pending, `[x]` completed, `[~]`/`[>]` in progress, `[!]` blocked.
/// Any other line is ignored.
pub fn parse_todo_markdown(text: &str) -> TodoList {
    let mut todos = TodoList::default();
    for line in text.lines() {
        let Some((marker, rest)) = split_marker(line.trim()) else {
            continue;
        };
        let item = rest.trim().to_string();
        match marker {
            ' ' => todos.pending.push(item),
            'x' | 'X' => todos.completed.push(item),
            '~' | '>' => todos.in_progress.push(item),
            '!' => todos.blocked.push(item),
            _ => {}
        }
    }
    todos
}

/// Any item carrying a cancel marker, or a blocked item flagged with a bare
/// `CANCEL` (`- [!] CANCEL ...`).
pub fn todo_requests_cancel(todos: &TodoList) -> bool {
    let marked = [
        &todos.pending,
        &todos.in_progress,
        &todos.completed,
        &todos.blocked,
    ]
    .into_iter()
    .flatten()
    .any(|item| has_cancel_signal(item));
    marked
        || todos
            .blocked
            .iter()
            .any(|item| item.to_uppercase().contains("CANCEL"))
}

pub fn is_all_tasks_complete(todos: &TodoList) -> bool {
    todos.is_all_complete()
}

// ── Handoff ──

/// Extract run number, next steps and status from a handoff document.
///
/// The first `**Run #** | N` row wins. Next steps are the numbered items
/// under `## Next Steps` up to the next heading, rule or end of text;
/// template placeholders (`1. [describe step]`) are skipped.
pub fn parse_handoff_markdown(text: &str) -> HandoffMirror {
    let mut handoff = HandoffMirror::default();

    if let Some(caps) = RUN_NUMBER.captures(text) {
        handoff.run_number = caps[1].parse().unwrap_or(0);
    }

    if let Some(section) = NEXT_STEPS_SECTION.captures(text) {
        for line in section[1].lines() {
            if let Some(item) = NUMBERED_ITEM.captures(line.trim()) {
                let step = item[1].trim();
                if !step.is_empty() && !step.starts_with('[') {
                    handoff.next_steps.push(step.to_string());
                }
            }
        }
    }

    if let Some(caps) = STATUS_FIELD.captures(text) {
        handoff.status = caps[1].to_uppercase();
    }

    handoff
}

pub fn is_handoff_complete(handoff: &HandoffMirror) -> bool {
    handoff.status == HANDOFF_COMPLETE_STATUS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_signal_is_case_insensitive() {
        assert!(has_completion_signal("all good, loop_complete"));
        assert!(has_completion_signal("status: [done]"));
        assert!(has_completion_signal("작업완료 했습니다"));
        assert!(has_completion_signal("RALPH_COMPLETE"));
        assert!(!has_completion_signal("still working"));
        assert!(!has_completion_signal(""));
    }

    #[test]
    fn cancel_signal_is_separate_list() {
        assert!(has_cancel_signal("please LOOP_CANCEL now"));
        assert!(has_cancel_signal("[cancel]"));
        assert!(has_cancel_signal("작업 중단"));
        assert!(!has_cancel_signal("LOOP_COMPLETE"));
    }

    #[test]
    fn todo_buckets_keep_file_order() {
        let md = "# Tasks\n\
                  - [ ] p1\n\
                  - [x] c1\n\
                  - [~] w1\n\
                  - [ ] p2\n\
                    - [>] w2\n\
                  - [X] c2\n\
                  - [ ] p3\n\
                  not a task\n\
                  * [ ] wrong bullet\n";
        let todos = parse_todo_markdown(md);
        assert_eq!(todos.pending, vec!["p1", "p2", "p3"]);
        assert_eq!(todos.in_progress, vec!["w1", "w2"]);
        assert_eq!(todos.completed, vec!["c1", "c2"]);
        assert!(todos.blocked.is_empty());
    }

    #[test]
    fn duplicate_lines_are_distinct_items() {
        let todos = parse_todo_markdown("- [ ] same\n- [ ] same\n");
        assert_eq!(todos.pending.len(), 2);
    }

    #[test]
    fn pending_only_is_not_complete() {
        let todos = parse_todo_markdown("- [ ] a\n- [ ] b\n");
        assert!(!is_all_tasks_complete(&todos));
    }

    #[test]
    fn completed_with_nothing_open_is_complete() {
        let todos = parse_todo_markdown("- [x] a\n- [x] b\nnotes\n");
        assert!(is_all_tasks_complete(&todos));
        let todos = parse_todo_markdown("- [x] a\n- [~] b\n");
        assert!(!is_all_tasks_complete(&todos));
        assert!(!is_all_tasks_complete(&parse_todo_markdown("")));
    }

    #[test]
    fn blocked_cancel_item_requests_cancel() {
        let todos = parse_todo_markdown("- [ ] step 2\n- [!] CANCEL this\n");
        assert_eq!(todos.blocked, vec!["CANCEL this"]);
        assert!(todo_requests_cancel(&todos));

        let todos = parse_todo_markdown("- [!] waiting on review\n");
        assert!(!todo_requests_cancel(&todos));

        // "cancel" in an ordinary task is just a task
        let todos = parse_todo_markdown("- [ ] add cancel button\n");
        assert!(!todo_requests_cancel(&todos));
    }

    #[test]
    fn cancel_marker_in_any_item_requests_cancel() {
        for md in [
            "- [ ] LOOP_CANCEL\n- [ ] step 2\n",
            "- [~] wrap up [cancel]\n",
            "- [x] 작업 중단\n",
        ] {
            assert!(todo_requests_cancel(&parse_todo_markdown(md)), "{md}");
        }
    }

    const HANDOFF: &str = "# Handoff\n\n\
| Field | Value |\n\
|---|---|\n\
| **Run #** | 4 |\n\
| **Last Updated** | 2026-01-02 10:00 |\n\n\
**Status**: `CONTINUING`\n\n\
## Next Steps\n\
1. Wire the parser\n\
2. Add tests\n\
3. [describe next step]\n\n\
## Notes\n\
1. not a step\n";

    #[test]
    fn handoff_fields_are_extracted() {
        let handoff = parse_handoff_markdown(HANDOFF);
        assert_eq!(handoff.run_number, 4);
        assert_eq!(handoff.next_steps, vec!["Wire the parser", "Add tests"]);
        assert_eq!(handoff.status, "CONTINUING");
        assert!(!is_handoff_complete(&handoff));
    }

    #[test]
    fn next_steps_stop_at_rule_or_end() {
        let md = "## Next Steps (priority)\n1. one\n2.  two\n---\n3. three\n";
        assert_eq!(parse_handoff_markdown(md).next_steps, vec!["one", "two"]);
        let md = "## Next Steps\n1. only";
        assert_eq!(parse_handoff_markdown(md).next_steps, vec!["only"]);
    }

    #[test]
    fn first_run_number_wins() {
        let md = "| **Run #** | 2 |\n| **Run #** | 9 |\n";
        assert_eq!(parse_handoff_markdown(md).run_number, 2);
    }

    #[test]
    fn korean_status_key_and_completion() {
        let handoff = parse_handoff_markdown("**상태**: continuous_complete\n");
        assert_eq!(handoff.status, HANDOFF_COMPLETE_STATUS);
        assert!(is_handoff_complete(&handoff));
    }

    #[test]
    fn empty_handoff_yields_defaults() {
        let handoff = parse_handoff_markdown("nothing useful here");
        assert_eq!(handoff, HandoffMirror::default());
    }
}
