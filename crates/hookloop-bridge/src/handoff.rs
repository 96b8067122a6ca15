//! Handoff run record: the `Run #` / `Last Updated` metadata rows of
//! `HANDOFF.md`, treated as a rendering of a small structured record.

use std::fs;
use std::path::Path;

use anyhow::Context;
use hookloop_store::write_atomic;
use time::OffsetDateTime;

const RUN_KEY: &str = "**Run #**";
const UPDATED_KEY: &str = "**Last Updated**";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandoffRecord {
    pub run_number: u32,
    pub last_updated: Option<String>,
}

/// `| key | value |` → (key, value), both trimmed.
fn table_row(line: &str) -> Option<(&str, &str)> {
    let inner = line.trim().strip_prefix('|')?;
    let mut cells = inner.split('|');
    let key = cells.next()?.trim();
    let value = cells.next()?.trim();
    Some((key, value))
}

fn find_row(lines: &[String], key: &str) -> Option<usize> {
    lines
        .iter()
        .position(|l| table_row(l).is_some_and(|(k, _)| k == key))
}

impl HandoffRecord {
    pub fn parse(text: &str) -> Self {
        let mut record = Self::default();
        let mut seen_run = false;
        for (key, value) in text.lines().filter_map(table_row) {
            if key == RUN_KEY && !seen_run {
                record.run_number = value.parse().unwrap_or(0);
                seen_run = true;
            } else if key == UPDATED_KEY && record.last_updated.is_none() {
                record.last_updated = Some(value.to_string());
            }
        }
        record
    }

    fn run_row(&self) -> String {
        format!("| {RUN_KEY} | {} |", self.run_number)
    }

    fn updated_row(&self) -> String {
        format!(
            "| {UPDATED_KEY} | {} |",
            self.last_updated.as_deref().unwrap_or("-")
        )
    }

    /// Regenerate the record's rows in `text`. Missing rows are added next
    /// to the existing one, or as a new table under the title.
    pub fn apply(&self, text: &str) -> String {
        let mut lines: Vec<String> = text.lines().map(String::from).collect();
        match (find_row(&lines, RUN_KEY), find_row(&lines, UPDATED_KEY)) {
            (Some(run), Some(updated)) => {
                lines[run] = self.run_row();
                lines[updated] = self.updated_row();
            }
            (Some(run), None) => {
                lines[run] = self.run_row();
                lines.insert(run + 1, self.updated_row());
            }
            (None, Some(updated)) => {
                lines[updated] = self.updated_row();
                lines.insert(updated, self.run_row());
            }
            (None, None) => {
                let table = [
                    "| Field | Value |".to_string(),
                    "|---|---|".to_string(),
                    self.run_row(),
                    self.updated_row(),
                ];
                match lines.iter().position(|l| l.starts_with("# ")) {
                    Some(title) => {
                        let block = std::iter::once(String::new()).chain(table);
                        lines.splice(title + 1..title + 1, block);
                    }
                    None => {
                        lines.splice(0..0, table.into_iter().chain([String::new()]));
                    }
                }
            }
        }
        let mut out = lines.join("\n");
        if text.ends_with('\n') || text.is_empty() {
            out.push('\n');
        }
        out
    }
}

fn stamp(ts: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute()
    )
}

/// Start the next handoff run: bump `Run #`, stamp `Last Updated`, rewrite
/// the document. Returns the new run number.
pub fn advance_run(path: &Path, now: OffsetDateTime) -> anyhow::Result<u32> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read handoff document {}", path.display()))?;
    let mut record = HandoffRecord::parse(&text);
    record.run_number += 1;
    record.last_updated = Some(stamp(now));
    write_atomic(path, record.apply(&text).as_bytes())
        .with_context(|| format!("write handoff document {}", path.display()))?;
    Ok(record.run_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::parse_handoff_markdown;
    use tempfile::TempDir;

    const DOC: &str = "# Handoff\n\n\
| Field | Value |\n\
|---|---|\n\
| **Run #** | 4 |\n\
| **Last Updated** | 2026-01-02 10:00 |\n\n\
## Next Steps\n\
1. Wire the parser\n";

    fn at(unix: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(unix).unwrap()
    }

    #[test]
    fn parse_reads_both_rows() {
        let record = HandoffRecord::parse(DOC);
        assert_eq!(record.run_number, 4);
        assert_eq!(record.last_updated.as_deref(), Some("2026-01-02 10:00"));
    }

    #[test]
    fn apply_rewrites_only_record_rows() {
        let record = HandoffRecord {
            run_number: 5,
            last_updated: Some("2026-02-01 09:30".into()),
        };
        let out = record.apply(DOC);
        assert!(out.contains("| **Run #** | 5 |\n"));
        assert!(out.contains("| **Last Updated** | 2026-02-01 09:30 |\n"));
        assert!(!out.contains("| 4 |"));
        assert!(out.starts_with("# Handoff\n\n| Field | Value |"));
        assert!(out.ends_with("1. Wire the parser\n"));
        assert_eq!(parse_handoff_markdown(&out).run_number, 5);
    }

    #[test]
    fn apply_is_stable() {
        let record = HandoffRecord::parse(DOC);
        assert_eq!(record.apply(DOC), DOC);
    }

    #[test]
    fn missing_table_is_inserted_under_title() {
        let doc = "# Handoff\n## Next Steps\n1. a\n";
        let record = HandoffRecord {
            run_number: 1,
            last_updated: None,
        };
        let out = record.apply(doc);
        assert_eq!(
            out,
            "# Handoff\n\n| Field | Value |\n|---|---|\n| **Run #** | 1 |\n| **Last Updated** | - |\n## Next Steps\n1. a\n"
        );
    }

    #[test]
    fn missing_updated_row_goes_after_run_row() {
        let doc = "| **Run #** | 2 |\n| **Status** | x |\n";
        let record = HandoffRecord {
            run_number: 3,
            last_updated: Some("now".into()),
        };
        assert_eq!(
            record.apply(doc),
            "| **Run #** | 3 |\n| **Last Updated** | now |\n| **Status** | x |\n"
        );
    }

    #[test]
    fn advance_run_bumps_and_stamps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("HANDOFF.md");
        fs::write(&path, DOC).unwrap();

        let run = advance_run(&path, at(1_700_000_000)).unwrap();
        assert_eq!(run, 5);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("| **Last Updated** | 2023-11-14 22:13 |"));
        assert_eq!(advance_run(&path, at(1_700_000_000)).unwrap(), 6);
    }

    #[test]
    fn advance_run_requires_document() {
        let dir = TempDir::new().unwrap();
        let err = advance_run(&dir.path().join("HANDOFF.md"), at(0)).unwrap_err();
        assert!(err.to_string().contains("read handoff document"));
    }
}
