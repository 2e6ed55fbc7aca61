//! The policy document: which verbs are read-only, which require an Intent
//! Record, plus the deny-glob floor and the default files-touched limit.
//!
//! Loaded once per invocation and immutable thereafter. Unknown top-level
//! keys (e.g. `version`) are tolerated and ignored.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::PolicyLoadError;

/// Files-touched limit applied when neither the policy nor the record sets one.
pub const DEFAULT_MAX_FILES: u64 = 50;

/// How a command verb is classified against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Member of `read_only_commands`: allowed unconditionally.
    ReadOnly,
    /// Member of `requires_intent_commands`: needs a validated Intent Record.
    Mutating,
    /// In neither list: denied unconditionally (default deny).
    Unknown,
}

/// The static policy data structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Policy {
    /// Verbs permitted without an Intent Record.
    #[serde(default)]
    pub read_only_commands: BTreeSet<String>,

    /// Verbs that mutate the filesystem and require a validated Intent Record.
    #[serde(default)]
    pub requires_intent_commands: BTreeSet<String>,

    /// Glob patterns naming paths no authorization may touch. Records can
    /// only add to this floor, never narrow it.
    #[serde(default)]
    pub deny_globs_default: Vec<String>,

    /// Files-touched limit used when the record does not set its own.
    #[serde(default = "default_max_files")]
    pub max_files_default: u64,
}

fn default_max_files() -> u64 {
    DEFAULT_MAX_FILES
}

impl Policy {
    /// Load and parse the policy YAML at `path`.
    pub fn load(path: &Path) -> Result<Self, PolicyLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| PolicyLoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Classify a command verb. Read-only wins if a verb is listed in both sets.
    pub fn classify(&self, verb: &str) -> CommandClass {
        if self.read_only_commands.contains(verb) {
            CommandClass::ReadOnly
        } else if self.requires_intent_commands.contains(verb) {
            CommandClass::Mutating
        } else {
            CommandClass::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_policy() -> Policy {
        let yaml = r#"
version: 0.1
read_only_commands: [ls, cat, grep, find]
requires_intent_commands: [rm, mv, cp, sed, truncate]
deny_globs_default:
  - "**/.git/**"
  - "**/*.key"
  - "**/*.pem"
max_files_default: 50
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_full_policy() {
        let policy = sample_policy();
        assert!(policy.read_only_commands.contains("ls"));
        assert!(policy.requires_intent_commands.contains("rm"));
        assert_eq!(policy.deny_globs_default.len(), 3);
        assert_eq!(policy.max_files_default, 50);
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        // `version` above is not a modeled field and must not break parsing.
        let policy: Policy = serde_yaml::from_str("version: 0.2\nread_only_commands: [ls]").unwrap();
        assert!(policy.read_only_commands.contains("ls"));
    }

    #[test]
    fn test_missing_max_files_defaults() {
        let policy: Policy = serde_yaml::from_str("read_only_commands: [ls]").unwrap();
        assert_eq!(policy.max_files_default, DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_classify() {
        let policy = sample_policy();
        assert_eq!(policy.classify("ls"), CommandClass::ReadOnly);
        assert_eq!(policy.classify("rm"), CommandClass::Mutating);
        assert_eq!(policy.classify("python"), CommandClass::Unknown);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Policy::load(Path::new("/nonexistent/policy.yaml")).unwrap_err();
        assert!(matches!(err, PolicyLoadError::Io { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, "requires_intent_commands: [rm]\nmax_files_default: 10").unwrap();
        let policy = Policy::load(&path).unwrap();
        assert_eq!(policy.classify("rm"), CommandClass::Mutating);
        assert_eq!(policy.max_files_default, 10);
    }
}
