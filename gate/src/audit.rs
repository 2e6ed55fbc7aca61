//! Structured audit logging for gate decisions and executions.
//!
//! One JSON object per line, appended to a JSONL file. Audit is best-effort
//! by design: every append is a fallible call whose error the call site
//! swallows after a `warn!`, because losing an audit line must never block a
//! legitimate operation or alter a decision.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Stdout/stderr previews in execution events are capped at this many chars.
pub const PREVIEW_LIMIT: usize = 2000;

/// One decision event, written for every decision the gate makes.
#[derive(Debug, Serialize)]
pub struct DecisionEvent {
    pub event: &'static str,
    pub allowed: bool,
    pub reason: String,
    pub cmd: String,
    pub files_touched_est: u64,
    pub policy: String,
    pub intent_path: Option<String>,
    pub sandbox_root: String,
    pub dry_run: bool,
    pub ts_utc: String,
}

/// One execution event, written only after a command actually ran.
#[derive(Debug, Serialize)]
pub struct ExecutionEvent {
    pub event: &'static str,
    pub cmd: String,
    pub returncode: i32,
    pub stdout_preview: String,
    pub stderr_preview: String,
    pub policy: String,
    pub intent_path: Option<String>,
    pub sandbox_root: String,
    pub dry_run: bool,
    pub ts_utc: String,
}

/// Current time as an ISO-8601 UTC string.
pub fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Truncate captured output for an audit preview, on a char boundary, with
/// an explicit marker so truncation is visible in the log.
pub fn preview(s: &str) -> String {
    if s.chars().count() <= PREVIEW_LIMIT {
        return s.to_string();
    }
    let truncated: String = s.chars().take(PREVIEW_LIMIT).collect();
    format!("{truncated}...(truncated)")
}

/// Append one event to the audit log, creating parent directories on demand.
pub fn append(path: &Path, event: &impl Serialize) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event).map_err(std::io::Error::other)?;
    writeln!(file, "{json}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_decision() -> DecisionEvent {
        DecisionEvent {
            event: "decision",
            allowed: false,
            reason: "DENY: unknown command 'python' (default deny).".into(),
            cmd: "python -c 'print(1)'".into(),
            files_touched_est: 0,
            policy: "policies/policy.yaml".into(),
            intent_path: None,
            sandbox_root: "/tmp/sandbox".into(),
            dry_run: true,
            ts_utc: now_utc(),
        }
    }

    #[test]
    fn test_append_writes_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs/audit.jsonl");

        append(&log, &sample_decision()).unwrap();
        append(&log, &sample_decision()).unwrap();

        let contents = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let entry: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(entry["event"], "decision");
        assert_eq!(entry["allowed"], false);
        assert_eq!(entry["dry_run"], true);
        assert!(entry["reason"].as_str().unwrap().starts_with("DENY:"));
        assert!(entry["intent_path"].is_null());
    }

    #[test]
    fn test_execution_event_field_names() {
        let event = ExecutionEvent {
            event: "execution",
            cmd: "rm foo.txt".into(),
            returncode: 0,
            stdout_preview: String::new(),
            stderr_preview: String::new(),
            policy: "policies/policy.yaml".into(),
            intent_path: Some("/tmp/IR.md".into()),
            sandbox_root: "/tmp/sandbox".into(),
            dry_run: false,
            ts_utc: now_utc(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "execution");
        assert_eq!(value["returncode"], 0);
        assert_eq!(value["intent_path"], "/tmp/IR.md");
        assert_eq!(value["dry_run"], false);
        assert!(value["ts_utc"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_preview_truncates_with_marker() {
        let short = "a".repeat(PREVIEW_LIMIT);
        assert_eq!(preview(&short), short);

        let long = "a".repeat(PREVIEW_LIMIT + 1);
        let cut = preview(&long);
        assert!(cut.ends_with("...(truncated)"));
        assert_eq!(cut.chars().count(), PREVIEW_LIMIT + "...(truncated)".len());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        // Multi-byte chars near the limit must not split.
        let long = "é".repeat(PREVIEW_LIMIT + 10);
        let cut = preview(&long);
        assert!(cut.starts_with('é'));
        assert!(cut.ends_with("...(truncated)"));
    }

    #[test]
    fn test_append_to_unwritable_path_errors() {
        // The caller swallows this; here we just prove it surfaces as Err.
        let err = append(Path::new("/dev/null/audit.jsonl"), &sample_decision());
        assert!(err.is_err());
    }
}
