//! Execution adapter: runs an already-allowed command as a subprocess.
//!
//! Deciding and executing are strictly separated — the decision engine never
//! calls this module — which is what makes dry-run and audit-before-execute
//! possible. One blocking call per command, no timeout: the target use is
//! short filesystem operations.

use std::path::Path;
use std::process::Command;

use anyhow::Context;

/// Captured result of one subprocess run.
#[derive(Debug)]
pub struct ExecOutcome {
    /// Child exit code; -1 when terminated by a signal.
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run `cmd` with the working directory pinned to the sandbox root,
/// capturing stdout and stderr.
pub fn run_command(cmd: &[String], cwd: &Path) -> anyhow::Result<ExecOutcome> {
    let (program, args) = cmd.split_first().context("empty command")?;
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .with_context(|| format!("failed to spawn '{program}'"))?;

    Ok(ExecOutcome {
        returncode: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
