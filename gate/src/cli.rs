use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "intent-gate")]
#[command(version)]
#[command(about = "Deterministic refusal boundary for agent execution")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the policy YAML
    #[arg(long, default_value = "policies/policy.yaml")]
    pub policy: PathBuf,

    /// Path to the Intent Record (markdown). Required for mutating commands
    #[arg(long)]
    pub intent: Option<PathBuf>,

    /// Sandbox root (must match the record's scope.root)
    #[arg(long, default_value = "sandbox")]
    pub sandbox: PathBuf,

    /// Append-only audit log (JSONL)
    #[arg(long, default_value = "audit.jsonl")]
    pub audit: PathBuf,

    /// Decide but do not execute
    #[arg(long)]
    pub dry_run: bool,

    /// Print the decision and exit
    #[arg(long)]
    pub print_decision: bool,

    /// Command to run (e.g. -- ls -la)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AgentArgs {
    /// Task string, e.g. 'delete foo.txt'
    pub task: String,

    /// Path to the Intent Record (required for mutating commands)
    #[arg(long)]
    pub intent: Option<PathBuf>,

    /// Actually execute allowed steps (default is dry-run only)
    #[arg(long)]
    pub execute: bool,

    /// Path to the policy YAML
    #[arg(long, default_value = "policies/policy.yaml")]
    pub policy: PathBuf,

    /// Sandbox root directory
    #[arg(long, default_value = "sandbox")]
    pub sandbox: PathBuf,

    /// Audit log path (JSONL)
    #[arg(long, default_value = "audit.jsonl")]
    pub audit: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum IrCmd {
    /// Create a new Intent Record file
    New {
        /// Scope root the record authorizes
        #[arg(long, default_value = "sandbox")]
        root: PathBuf,

        /// Allowed action classes (delete, move_or_rename, copy,
        /// write_over_existing, chmod, git_commit)
        #[arg(long, required = true, num_args = 1..)]
        actions: Vec<String>,

        /// Signer name recorded as the attestation signature
        #[arg(long)]
        signed_by: String,

        /// Short intent note
        #[arg(long, default_value = "")]
        note: String,

        /// Expiry window in hours
        #[arg(long, default_value_t = 24)]
        expires_hours: i64,

        /// Intent records directory
        #[arg(long, default_value = "intent_records")]
        dir: PathBuf,

        /// Print the record to stdout instead of writing a file
        #[arg(long)]
        print: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide on a command and, unless denied or dry-run, execute it in the
    /// sandbox root. Exit code 0 on allow, 2 on deny.
    Run(RunArgs),

    /// Create and manage Intent Records
    #[command(subcommand)]
    Ir(IrCmd),

    /// Map a task string to commands and route each through the gate,
    /// dry-run first, aborting on the first denial
    Agent(AgentArgs),

    /// Write a default policy file
    Init {
        /// Overwrite an existing policy file
        #[arg(long)]
        force: bool,

        /// Where to write the policy
        #[arg(long, default_value = "policies/policy.yaml")]
        path: PathBuf,
    },
}
