//! intent-gate binary: a deterministic, default-deny execution gate placed
//! between an agent and the filesystem-mutating commands it proposes.
//!
//! This is not a sandbox. It's an execution gate plus audit trail: read-only
//! commands pass, mutating commands need a signed, scoped, time-bounded
//! Intent Record, and everything else is refused.

use clap::Parser;
use tracing::{error, info};

mod audit;
mod cli;
mod cmd;
mod errors;
mod exec;
mod pipeline;
mod style;
mod tracing_init;

use cli::{Cli, Commands};

fn main() {
    tracing_init::init_tracing();
    let cli = Cli::parse();
    info!(args = ?std::env::args(), "intent-gate started");

    let verbose = cli.verbose;
    let result = match cli.command {
        Commands::Run(args) => cmd::run::run(args),
        Commands::Ir(ir_cmd) => cmd::ir::run(ir_cmd),
        Commands::Agent(args) => cmd::agent::run(args),
        Commands::Init { force, path } => cmd::init::run(force, &path).map(|()| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e:#}");
            errors::display_error(&e, verbose);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_with_trailing_command() {
        let cli = Cli::parse_from([
            "intent-gate",
            "run",
            "--policy",
            "p.yaml",
            "--sandbox",
            "sb",
            "--dry-run",
            "--",
            "rm",
            "-r",
            "foo.txt",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.dry_run);
                assert_eq!(args.policy.to_string_lossy(), "p.yaml");
                // Whether or not the parser kept the "--" marker, the
                // normalized command is the literal argv.
                assert_eq!(
                    cmd::run::strip_separator(&args.command),
                    ["rm", "-r", "foo.txt"]
                );
            }
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_agent_task() {
        let cli = Cli::parse_from(["intent-gate", "agent", "delete foo.txt", "--execute"]);
        match cli.command {
            Commands::Agent(args) => {
                assert_eq!(args.task, "delete foo.txt");
                assert!(args.execute);
                assert!(args.intent.is_none());
            }
            other => panic!("expected Agent, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_ir_new() {
        let cli = Cli::parse_from([
            "intent-gate",
            "ir",
            "new",
            "--root",
            "sandbox",
            "--actions",
            "delete",
            "copy",
            "--signed-by",
            "Brent Williams",
        ]);
        match cli.command {
            Commands::Ir(cli::IrCmd::New {
                actions, signed_by, ..
            }) => {
                assert_eq!(actions, vec!["delete", "copy"]);
                assert_eq!(signed_by, "Brent Williams");
            }
            other => panic!("expected Ir New, got {other:?}"),
        }
    }
}
