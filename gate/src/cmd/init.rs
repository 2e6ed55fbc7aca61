//! The `init` subcommand: write a default policy file.

use std::path::Path;

use tracing::{Level, instrument};

/// The shipped default policy: conservative read-only allowlist, the common
/// mutating verbs behind the intent requirement, and a deny-glob floor over
/// VCS internals and key material.
pub const DEFAULT_POLICY: &str = r#"# intent-gate policy.
#
# read_only_commands pass without an Intent Record; requires_intent_commands
# need a validated record; everything else is denied (default deny).
version: 0.1
read_only_commands:
  - ls
  - cat
  - grep
  - find
requires_intent_commands:
  - rm
  - mv
  - cp
  - sed
  - truncate
deny_globs_default:
  - "**/.git/**"
  - "**/*.key"
  - "**/*.pem"
max_files_default: 50
"#;

/// Write the default policy to `path`; refuses to overwrite without `force`.
#[instrument(level = Level::TRACE)]
pub fn run(force: bool, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_POLICY)?;
    println!("Wrote default policy to {}", path.display());
    println!("Edit the file to customize rules for your environment.");

    Ok(())
}
