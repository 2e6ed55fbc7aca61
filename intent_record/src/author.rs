//! Rendering new Intent Records in the front-matter form the parser prefers.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};

/// Compact UTC stamp used in record ids and filenames.
pub fn utc_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d-%H%M%SZ").to_string()
}

/// Default filename for a record created at `now`.
pub fn default_record_name(now: DateTime<Utc>) -> String {
    format!("IR-{}.md", utc_stamp(now))
}

/// Render a front-matter Intent Record.
///
/// The output is deterministic for a fixed `now` and round-trips through
/// [`crate::record::IntentRecord::parse`]: the `signature` line carries the
/// signer name, `scope.root` the authorized root, `expires_utc` the expiry
/// (when a window is given), and `actions_allowed` the granted classes.
pub fn render(
    root: &Path,
    actions: &[String],
    signed_by: &str,
    note: &str,
    expires_hours: Option<i64>,
    now: DateTime<Utc>,
) -> String {
    let stamp = utc_stamp(now);

    let mut lines: Vec<String> = Vec::new();
    lines.push("---".into());
    lines.push(format!("id: IR-{stamp}"));
    lines.push(format!("created_utc: {stamp}"));
    if let Some(hours) = expires_hours {
        let expires = now + Duration::hours(hours);
        lines.push(format!(
            "expires_utc: {}",
            expires.format("%Y-%m-%dT%H:%M:%SZ")
        ));
    }
    lines.push("actor:".into());
    lines.push(format!("  name: {signed_by}"));
    lines.push("  role: human_operator".into());
    lines.push("scope:".into());
    lines.push(format!("  root: {}", root.display()));
    lines.push("actions_allowed:".into());
    for action in actions {
        lines.push(format!("  - {action}"));
    }
    lines.push(format!("signature: \"{signed_by}\""));
    lines.push("approval:".into());
    lines.push("  required: false".into());
    lines.push("  approver: null".into());
    lines.push("  approved_utc: null".into());
    lines.push("---".into());
    lines.push(String::new());
    lines.push("# Intent".into());
    let note = note.trim();
    lines.push(if note.is_empty() {
        "(fill in: what outcome are you authorizing?)".into()
    } else {
        note.to_string()
    });
    lines.push(String::new());
    lines.push("# Notes".into());
    lines.push("- (optional) what could go wrong?".into());
    lines.push("- (optional) rollback plan?".into());
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IntentRecord;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_has_front_matter() {
        let text = render(
            Path::new("/tmp/sandbox"),
            &["delete".into()],
            "Brent Williams",
            "remove temp file",
            Some(1),
            fixed_now(),
        );
        assert!(text.starts_with("---\n"));
        assert!(text.contains("scope:\n  root: /tmp/sandbox"));
        assert!(text.contains("actions_allowed:\n  - delete"));
        assert!(text.contains("expires_utc: 2026-08-06T13:00:00Z"));
        assert!(text.contains("remove temp file"));
    }

    #[test]
    fn test_render_default_note() {
        let text = render(
            Path::new("/tmp/sandbox"),
            &["delete".into()],
            "Brent Williams",
            "",
            Some(1),
            fixed_now(),
        );
        assert!(text.contains("(fill in:"));
    }

    #[test]
    fn test_render_round_trips_through_parser() {
        let text = render(
            Path::new("/tmp/sandbox"),
            &["delete".into(), "copy".into()],
            "Brent Williams",
            "cleanup",
            Some(24),
            fixed_now(),
        );
        let record = IntentRecord::parse(&text).unwrap();
        assert_eq!(record.scope.root.as_deref(), Some("/tmp/sandbox"));
        assert_eq!(
            record.scope.expires.as_deref(),
            Some("2026-08-07T12:00:00Z")
        );
        assert_eq!(record.signature.as_deref(), Some("Brent Williams"));
        assert!(record.allowed_action_classes.contains("delete"));
        assert!(record.allowed_action_classes.contains("copy"));
    }

    #[test]
    fn test_default_record_name() {
        assert_eq!(default_record_name(fixed_now()), "IR-20260806-120000Z.md");
    }
}
