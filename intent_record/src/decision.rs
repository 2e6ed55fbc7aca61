//! The decision engine: state-free allow/deny verdicts for proposed commands.
//!
//! `decide` is a pure function of its arguments — no shared state, no caching,
//! no ordering hazards — so identical inputs always produce identical
//! [`Decision`] values and arbitrarily many callers can evaluate concurrently.
//! The only I/O is the filesystem metadata the path resolver and the
//! files-touched estimator require.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{ContainmentCheck, PathError};
use crate::glob;
use crate::path;
use crate::policy::{CommandClass, Policy};
use crate::record::IntentRecord;

/// Estimate used when file metadata cannot be read: large enough to trip any
/// sane max-files limit, so resolution failures always fail closed.
pub const FILES_TOUCHED_SENTINEL: u64 = 9999;

/// Weight assigned to a directory argument: contents are not enumerated, so
/// directories conservatively count as "many files".
const DIRECTORY_WEIGHT: u64 = 10;

/// The coarse category of mutating effect a command verb requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    /// Removing files or directories (`rm`).
    Delete,
    /// Renaming or moving entries (`mv`).
    MoveOrRename,
    /// Duplicating entries (`cp`).
    Copy,
    /// Rewriting existing file contents in place (`sed`, `truncate`).
    WriteOverExisting,
    /// Changing permission bits.
    Chmod,
    /// Committing to version control.
    GitCommit,
    /// Any other mutating verb the policy lists.
    Mutate,
}

impl ActionClass {
    /// The classes an Intent Record author can grant.
    pub const AUTHORABLE: [ActionClass; 6] = [
        ActionClass::Delete,
        ActionClass::MoveOrRename,
        ActionClass::Copy,
        ActionClass::WriteOverExisting,
        ActionClass::Chmod,
        ActionClass::GitCommit,
    ];

    /// The canonical string form used in Intent Record documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionClass::Delete => "delete",
            ActionClass::MoveOrRename => "move_or_rename",
            ActionClass::Copy => "copy",
            ActionClass::WriteOverExisting => "write_over_existing",
            ActionClass::Chmod => "chmod",
            ActionClass::GitCommit => "git_commit",
            ActionClass::Mutate => "mutate",
        }
    }

    /// Parse a class name as used in record documents.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delete" => Some(ActionClass::Delete),
            "move_or_rename" => Some(ActionClass::MoveOrRename),
            "copy" => Some(ActionClass::Copy),
            "write_over_existing" => Some(ActionClass::WriteOverExisting),
            "chmod" => Some(ActionClass::Chmod),
            "git_commit" => Some(ActionClass::GitCommit),
            "mutate" => Some(ActionClass::Mutate),
            _ => None,
        }
    }

    /// The class a mutating verb must be granted. Verbs without a specific
    /// mapping need the generic `mutate` class.
    pub fn required_for(verb: &str) -> Self {
        match verb {
            "rm" => ActionClass::Delete,
            "mv" => ActionClass::MoveOrRename,
            "cp" => ActionClass::Copy,
            "sed" | "truncate" => ActionClass::WriteOverExisting,
            _ => ActionClass::Mutate,
        }
    }
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a decision came out the way it did.
///
/// Callers match on the kind; the human string is rendered only at the
/// boundary via [`fmt::Display`] / [`Decision::reason_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The verb is in the policy's read-only list.
    ReadOnly,
    /// Every Intent Record check passed for a mutating command.
    IntentValidated,
    /// Empty argv.
    NoCommand,
    /// The verb is in neither policy list: default deny.
    UnknownCommand { verb: String },
    /// A mutating verb was proposed with no Intent Record supplied.
    MissingIntent { verb: String },
    /// An argument was a literal dangerous token (`.`, `..`, `/`, `~`).
    DangerousTarget { arg: String },
    /// An argument was an absolute path.
    AbsolutePath,
    /// An argument re-prefixed the sandbox directory name.
    DoubleSandboxPrefix { prefix: String },
    /// An argument resolved outside the sandbox root.
    EscapesSandbox {
        arg: String,
        check: ContainmentCheck,
    },
    /// Symlink resolution exceeded the hop bound.
    TooManyLinks { arg: String },
    /// The record carries no attestation signature.
    MissingSignature,
    /// The record is missing `scope.root` or `scope.expires`.
    MissingScope,
    /// The record authorizes a different root than the gate's sandbox.
    RootMismatch {
        record_root: PathBuf,
        sandbox_root: PathBuf,
    },
    /// `scope.expires` is not a recognizable timestamp.
    UnparseableExpiry { value: String },
    /// The record's expiry is in the past.
    Expired,
    /// The verb's required action class is not granted by the record.
    ActionNotAllowed { class: ActionClass },
    /// The files-touched estimate exceeds the effective limit.
    MaxFilesExceeded { estimated: u64, limit: u64 },
    /// A resolved argument matches the effective deny-globs.
    DenyGlobMatch { arg: String },
}

impl Reason {
    /// Whether this reason is an allow.
    pub fn is_allow(&self) -> bool {
        matches!(self, Reason::ReadOnly | Reason::IntentValidated)
    }
}

impl From<PathError> for Reason {
    fn from(err: PathError) -> Self {
        match err {
            PathError::AbsolutePath { .. } => Reason::AbsolutePath,
            PathError::DoubleSandboxPrefix { prefix, .. } => {
                Reason::DoubleSandboxPrefix { prefix }
            }
            PathError::DangerousTarget { arg } => Reason::DangerousTarget { arg },
            PathError::EscapesSandbox { arg, check } => Reason::EscapesSandbox { arg, check },
            PathError::TooManyLinks { arg } => Reason::TooManyLinks { arg },
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::ReadOnly => write!(f, "read-only command permitted by policy."),
            Reason::IntentValidated => {
                write!(f, "Intent Record validated for mutating command.")
            }
            Reason::NoCommand => write!(f, "no command provided."),
            Reason::UnknownCommand { verb } => {
                write!(f, "unknown command '{verb}' (default deny).")
            }
            Reason::MissingIntent { verb } => write!(f, "'{verb}' requires an Intent Record."),
            Reason::DangerousTarget { arg } => write!(f, "dangerous target '{arg}' not allowed."),
            Reason::AbsolutePath => write!(
                f,
                "absolute paths are not allowed (must be relative to sandbox root)."
            ),
            Reason::DoubleSandboxPrefix { prefix } => write!(
                f,
                "do not prefix paths with '{prefix}/' (cwd is already sandbox root); use relative paths."
            ),
            Reason::EscapesSandbox { arg, check } => {
                write!(f, "path '{arg}' {}.", check.phrase())
            }
            Reason::TooManyLinks { arg } => write!(
                f,
                "too many levels of symbolic links while resolving '{arg}'."
            ),
            Reason::MissingSignature => write!(f, "Intent Record missing signature."),
            Reason::MissingScope => {
                write!(f, "Intent Record missing scope.root or scope.expires.")
            }
            Reason::RootMismatch {
                record_root,
                sandbox_root,
            } => write!(
                f,
                "scope.root mismatch (record={} != sandbox={}).",
                record_root.display(),
                sandbox_root.display()
            ),
            Reason::UnparseableExpiry { value } => write!(
                f,
                "Intent Record expires '{value}' is not a parseable datetime."
            ),
            Reason::Expired => write!(f, "Intent Record is expired."),
            Reason::ActionNotAllowed { class } => {
                write!(f, "Intent Record does not allow action '{class}'.")
            }
            Reason::MaxFilesExceeded { estimated, limit } => write!(
                f,
                "command touches too many files (est={estimated} > max={limit})."
            ),
            Reason::DenyGlobMatch { arg } => {
                write!(f, "argument '{arg}' matches deny_glob.")
            }
        }
    }
}

/// The sole output of the decision engine. Produced fresh per call; immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the command may proceed.
    pub allowed: bool,
    /// Why, as a matchable kind.
    pub reason: Reason,
    /// Shell-quoted join of the argv tokens.
    pub normalized_command: String,
    /// Conservative estimate of filesystem entries the command touches.
    pub files_touched: u64,
}

impl Decision {
    fn allow(reason: Reason, normalized_command: String, files_touched: u64) -> Self {
        Decision {
            allowed: true,
            reason,
            normalized_command,
            files_touched,
        }
    }

    fn deny(reason: Reason, normalized_command: String, files_touched: u64) -> Self {
        Decision {
            allowed: false,
            reason,
            normalized_command,
            files_touched,
        }
    }

    /// The stable human-readable reason line, prefixed `ALLOW:` or `DENY:`.
    pub fn reason_line(&self) -> String {
        let prefix = if self.allowed { "ALLOW" } else { "DENY" };
        format!("{prefix}: {}", self.reason)
    }
}

/// Quote one token for safe display in a POSIX shell, `shlex`-style: safe
/// tokens pass through bare, everything else is single-quoted.
pub fn shell_quote(token: &str) -> String {
    if token.is_empty() {
        return "''".to_string();
    }
    let safe = token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', "'\"'\"'"))
    }
}

/// The shell-quoted join of an argv, used in decisions and audit events.
pub fn normalize_command(cmd: &[String]) -> String {
    cmd.iter()
        .map(|token| shell_quote(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-flag arguments of a command: everything after the verb that does not
/// start with `-`.
fn path_args(cmd: &[String]) -> impl Iterator<Item = &String> {
    cmd.iter().skip(1).filter(|arg| !arg.starts_with('-'))
}

/// Conservatively estimate how many filesystem entries a command touches.
///
/// Existing directories weigh [`DIRECTORY_WEIGHT`] since their contents are
/// not enumerated; existing files weigh 1; entries that do not exist weigh 0.
/// Any unexpected metadata failure (permissions, symlink loops) turns the
/// whole estimate into [`FILES_TOUCHED_SENTINEL`]: over-counting is fine,
/// under-counting could let a large destructive operation slip under the
/// limit.
pub fn estimate_files_touched(cmd: &[String], root: &Path) -> u64 {
    let mut touched = 0;
    for arg in path_args(cmd) {
        match std::fs::metadata(root.join(arg)) {
            Ok(meta) if meta.is_dir() => touched += DIRECTORY_WEIGHT,
            Ok(_) => touched += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(_) => return FILES_TOUCHED_SENTINEL,
        }
    }
    touched
}

/// Accept any unambiguous timestamp representation; a value without a
/// timezone offset is read as UTC.
fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Decide whether a proposed command may run.
///
/// Strictly ordered, short-circuiting on the first failed check so the
/// reason both stays deterministic and leaks as little as possible:
/// classification first (unknown verbs deny before anything else is
/// examined), then path safety, then the Intent Record's own invariants.
pub fn decide(
    cmd: &[String],
    policy: &Policy,
    intent: Option<&IntentRecord>,
    sandbox_root: &Path,
) -> Decision {
    let Some(verb) = cmd.first() else {
        return Decision::deny(Reason::NoCommand, String::new(), 0);
    };
    let normalized = normalize_command(cmd);

    match policy.classify(verb) {
        CommandClass::Unknown => Decision::deny(
            Reason::UnknownCommand { verb: verb.clone() },
            normalized,
            0,
        ),
        CommandClass::ReadOnly => Decision::allow(Reason::ReadOnly, normalized, 0),
        CommandClass::Mutating => {
            decide_mutating(cmd, verb, policy, intent, sandbox_root, normalized)
        }
    }
}

fn decide_mutating(
    cmd: &[String],
    verb: &str,
    policy: &Policy,
    intent: Option<&IntentRecord>,
    sandbox_root: &Path,
    normalized: String,
) -> Decision {
    // Estimated up front so every deny below carries it in its diagnostics.
    let touched = estimate_files_touched(cmd, sandbox_root);
    let deny = |reason: Reason| Decision::deny(reason, normalized.clone(), touched);

    let Some(record) = intent else {
        return deny(Reason::MissingIntent {
            verb: verb.to_string(),
        });
    };

    for arg in path_args(cmd) {
        if path::is_dangerous(arg) {
            return deny(Reason::DangerousTarget { arg: arg.clone() });
        }
    }
    for arg in path_args(cmd) {
        if Path::new(arg).is_absolute() {
            return deny(Reason::AbsolutePath);
        }
        if let Some(prefix) = path::double_sandbox_prefix(arg, sandbox_root) {
            return deny(Reason::DoubleSandboxPrefix { prefix });
        }
    }

    // Full resolution before any glob or max-files check: an unresolved path
    // cannot be safely globbed or counted.
    let mut resolved: Vec<(String, String)> = Vec::new();
    for arg in path_args(cmd) {
        match path::resolve_and_check(arg, sandbox_root) {
            Ok(rel) => resolved.push((arg.clone(), rel)),
            Err(err) => return deny(Reason::from(err)),
        }
    }

    if record
        .signature
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .is_empty()
    {
        return deny(Reason::MissingSignature);
    }

    let scope_root = record.scope.root.as_deref().map(str::trim);
    let scope_expires = record.scope.expires.as_deref().map(str::trim);
    let (Some(scope_root), Some(scope_expires)) = (
        scope_root.filter(|s| !s.is_empty()),
        scope_expires.filter(|s| !s.is_empty()),
    ) else {
        return deny(Reason::MissingScope);
    };

    // The record authorizes exactly one root: strict equality after
    // canonicalization, never prefix or subset.
    let record_root = path::canonicalize_lenient(Path::new(scope_root));
    let sandbox_canonical = path::canonicalize_lenient(sandbox_root);
    if record_root != sandbox_canonical {
        return deny(Reason::RootMismatch {
            record_root,
            sandbox_root: sandbox_canonical,
        });
    }

    let Some(expires) = parse_expiry(scope_expires) else {
        return deny(Reason::UnparseableExpiry {
            value: scope_expires.to_string(),
        });
    };
    if Utc::now() > expires {
        return deny(Reason::Expired);
    }

    let required = ActionClass::required_for(verb);
    if !record.allowed_action_classes.contains(required.as_str()) {
        return deny(Reason::ActionNotAllowed { class: required });
    }

    // Union of the policy floor and the record's additions; the record can
    // never narrow what the policy forbids.
    let deny_globs: Vec<String> = policy
        .deny_globs_default
        .iter()
        .chain(record.constraints.deny_globs.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let limit = record
        .constraints
        .max_files
        .unwrap_or(policy.max_files_default);
    if touched > limit {
        return deny(Reason::MaxFilesExceeded {
            estimated: touched,
            limit,
        });
    }

    for (arg, rel) in &resolved {
        if glob::matches_any(rel, &deny_globs) {
            return deny(Reason::DenyGlobMatch { arg: arg.clone() });
        }
    }

    Decision::allow(Reason::IntentValidated, normalized, touched)
}
