//! Wires the pieces together: load policy and record, decide, audit, execute.
//!
//! Both `run` and `agent` drive their commands through one [`Gate`], so the
//! ordering guarantees hold everywhere: the decision audit event is written
//! for every decision, the execution event only after a command actually ran,
//! and an audit failure never changes either outcome.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use intent_record::decision::{Decision, decide};
use intent_record::path::canonicalize_lenient;
use intent_record::{IntentRecord, Policy};

use crate::audit::{self, DecisionEvent, ExecutionEvent};
use crate::exec::{self, ExecOutcome};

/// A loaded gate: policy, optional intent record, sandbox root, audit sink.
#[derive(Debug)]
pub struct Gate {
    policy: Policy,
    policy_path: PathBuf,
    intent: Option<IntentRecord>,
    intent_path: Option<PathBuf>,
    sandbox_root: PathBuf,
    audit_path: PathBuf,
}

impl Gate {
    /// Load the policy (fatal on failure) and the intent record (not fatal:
    /// a missing or malformed record is treated as absent and only surfaces
    /// once a mutating command requires one).
    pub fn load(
        policy_path: &Path,
        intent_path: Option<&Path>,
        sandbox: &Path,
        audit: &Path,
    ) -> anyhow::Result<Self> {
        let policy = Policy::load(policy_path).context("refusing to decide without a policy")?;
        info!(path = %policy_path.display(), "loaded policy");

        let intent = intent_path.and_then(|path| match IntentRecord::load(path) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(path = %path.display(), %error, "unusable intent record; treating as absent");
                None
            }
        });

        let sandbox_root = canonicalize_lenient(sandbox);
        let audit_path = if audit.is_absolute() {
            audit.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(audit)
        };

        Ok(Gate {
            policy,
            policy_path: policy_path.to_path_buf(),
            intent,
            intent_path: intent_path.map(canonicalize_lenient),
            sandbox_root,
            audit_path,
        })
    }

    /// The canonicalized sandbox root commands execute in.
    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    /// Decide on a command and append the decision audit event.
    pub fn decide(&self, cmd: &[String], dry_run: bool) -> Decision {
        let decision = decide(cmd, &self.policy, self.intent.as_ref(), &self.sandbox_root);

        let event = DecisionEvent {
            event: "decision",
            allowed: decision.allowed,
            reason: decision.reason_line(),
            cmd: decision.normalized_command.clone(),
            files_touched_est: decision.files_touched,
            policy: self.policy_path.display().to_string(),
            intent_path: self
                .intent_path
                .as_ref()
                .map(|p| p.display().to_string()),
            sandbox_root: self.sandbox_root.display().to_string(),
            dry_run,
            ts_utc: audit::now_utc(),
        };
        if let Err(error) = audit::append(&self.audit_path, &event) {
            warn!(%error, path = %self.audit_path.display(), "failed to write decision audit event");
        }

        decision
    }

    /// Execute an already-allowed command and append the execution audit event.
    pub fn execute(&self, cmd: &[String], decision: &Decision) -> anyhow::Result<ExecOutcome> {
        let outcome = exec::run_command(cmd, &self.sandbox_root)?;

        let event = ExecutionEvent {
            event: "execution",
            cmd: decision.normalized_command.clone(),
            returncode: outcome.returncode,
            stdout_preview: audit::preview(&outcome.stdout),
            stderr_preview: audit::preview(&outcome.stderr),
            policy: self.policy_path.display().to_string(),
            intent_path: self
                .intent_path
                .as_ref()
                .map(|p| p.display().to_string()),
            sandbox_root: self.sandbox_root.display().to_string(),
            dry_run: false,
            ts_utc: audit::now_utc(),
        };
        if let Err(error) = audit::append(&self.audit_path, &event) {
            warn!(%error, path = %self.audit_path.display(), "failed to write execution audit event");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "\
read_only_commands: [ls, cat]
requires_intent_commands: [rm, mv, cp]
deny_globs_default: [\"**/*.pem\"]
max_files_default: 50
";

    struct Fixture {
        _dir: tempfile::TempDir,
        policy: PathBuf,
        sandbox: PathBuf,
        audit: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let policy = dir.path().join("policy.yaml");
        std::fs::write(&policy, POLICY).unwrap();
        let sandbox = dir.path().join("sandbox");
        std::fs::create_dir(&sandbox).unwrap();
        let audit = dir.path().join("audit.jsonl");
        Fixture {
            policy,
            sandbox,
            audit,
            _dir: dir,
        }
    }

    fn audit_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_missing_policy_is_fatal() {
        let f = fixture();
        let missing = f.sandbox.join("nope.yaml");
        assert!(Gate::load(&missing, None, &f.sandbox, &f.audit).is_err());
    }

    #[test]
    fn test_malformed_intent_record_treated_as_absent() {
        let f = fixture();
        let record = f.sandbox.join("IR.md");
        // Unterminated front matter.
        std::fs::write(&record, "---\nroot: /tmp\n").unwrap();
        let gate = Gate::load(&f.policy, Some(&record), &f.sandbox, &f.audit).unwrap();

        // Read-only still allowed — the bad record is not fatal.
        let d = gate.decide(&["ls".to_string()], true);
        assert!(d.allowed);

        // Mutating denies for the missing record.
        let d = gate.decide(&["rm".to_string(), "x.txt".to_string()], true);
        assert!(!d.allowed);
        assert!(d.reason_line().contains("Intent Record"));
    }

    #[test]
    fn test_every_decision_is_audited() {
        let f = fixture();
        let gate = Gate::load(&f.policy, None, &f.sandbox, &f.audit).unwrap();
        gate.decide(&["ls".to_string()], true);
        gate.decide(&["python".to_string()], false);

        let lines = audit_lines(&f.audit);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "decision");
        assert_eq!(lines[0]["allowed"], true);
        assert_eq!(lines[0]["dry_run"], true);
        assert_eq!(lines[1]["allowed"], false);
        assert_eq!(lines[1]["dry_run"], false);
        assert_eq!(lines[1]["intent_path"], serde_json::Value::Null);
    }

    #[test]
    fn test_audit_failure_does_not_change_outcome() {
        let f = fixture();
        // A path that can never be created.
        let broken = Path::new("/dev/null/audit.jsonl");
        let gate = Gate::load(&f.policy, None, &f.sandbox, broken).unwrap();
        let d = gate.decide(&["ls".to_string()], true);
        assert!(d.allowed);
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_appends_execution_event() {
        let f = fixture();
        std::fs::write(f.sandbox.join("seen.txt"), "x").unwrap();
        let gate = Gate::load(&f.policy, None, &f.sandbox, &f.audit).unwrap();

        let cmd = vec!["ls".to_string()];
        let decision = gate.decide(&cmd, false);
        assert!(decision.allowed);
        let outcome = gate.execute(&cmd, &decision).unwrap();
        assert_eq!(outcome.returncode, 0);
        assert!(outcome.stdout.contains("seen.txt"));

        let lines = audit_lines(&f.audit);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["event"], "execution");
        assert_eq!(lines[1]["returncode"], 0);
        assert!(
            lines[1]["stdout_preview"]
                .as_str()
                .unwrap()
                .contains("seen.txt")
        );
    }
}
